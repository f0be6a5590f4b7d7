// Build script for hwls - embeds version at compile time

fn main() {
    // Get version from environment (set by release tooling) or Cargo.toml
    let version =
        std::env::var("HWLS_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    // Embed as environment variable for runtime access
    println!("cargo:rustc-env=HWLS_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=HWLS_VERSION");
}
