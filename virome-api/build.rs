//! Stamps virome-api with the identity reported by `GET /health` and the
//! startup log line in `main`
//!
//! `GIT_HASH` comes from `VIROME_GIT_HASH` when set (source tarballs and
//! container builds have no `.git`), otherwise from `git rev-parse` at the
//! workspace root. Anything that is not a plain hex hash becomes `unknown`.

use std::process::Command;

const HASH_OVERRIDE_VAR: &str = "VIROME_GIT_HASH";

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn sanitize_hash(raw: &str) -> Option<String> {
    let hash = raw.trim();
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(hash.chars().take(8).collect())
}

fn main() {
    let git_hash = std::env::var(HASH_OVERRIDE_VAR)
        .ok()
        .and_then(|h| sanitize_hash(&h))
        .or_else(|| git_short_hash().and_then(|h| sanitize_hash(&h)))
        .unwrap_or_else(|| "unknown".to_string());

    // RFC 3339 in UTC so /health output is comparable across build hosts
    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_VAR);
    // .git lives one level up at the workspace root; HEAD moves on checkout
    // and the branch ref moves on commit
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads");
}
