use std::env;
use std::path::PathBuf;

// Bakes a data-root fallback into the binary: AFFILIATE_LINKS_ROOT_HINT at
// build time, else the manifest dir (useful when building inside a catalog
// checkout that holds v1/).
fn main() {
    println!("cargo:rerun-if-env-changed=AFFILIATE_LINKS_ROOT_HINT");

    let hint = env::var("AFFILIATE_LINKS_ROOT_HINT")
        .ok()
        .or_else(|| env::var("CARGO_MANIFEST_DIR").ok());

    if let Some(raw_hint) = hint {
        let candidate = PathBuf::from(raw_hint);
        let canonical = candidate.canonicalize().unwrap_or(candidate);

        println!(
            "cargo:rustc-env=AFFILIATE_LINKS_ROOT_HINT={}",
            canonical.display()
        );
    }
}
