//! Build script: fingerprints the stylesheet.
//!
//! `static/css/main.css` is copied to `static/css/derived/main.<hash>.css`
//! and the hash exported as `CSS_HASH`, so templates can link a URL that
//! changes whenever the CSS does.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    match fingerprint(&css_path) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Could not fingerprint main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Copy the stylesheet next to itself under its content hash.
fn fingerprint(css_path: &Path) -> io::Result<String> {
    let content = fs::read(css_path)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest).to_string();

    let derived_dir = css_path
        .parent()
        .map_or_else(|| PathBuf::from("derived"), |dir| dir.join("derived"));
    fs::create_dir_all(&derived_dir)?;
    fs::copy(css_path, derived_dir.join(format!("main.{hash}.css")))?;

    Ok(hash)
}
