//! Stamps every stage binary with its commit, build time and profile
//!
//! Read back through `fec_common::build_info`.

use std::process::Command;

/// Short commit hash, or "unknown" outside a git checkout
fn git_hash() -> String {
    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    emit("GIT_HASH", &git_hash());
    // ISO 8601 in UTC, e.g. 2026-10-19T19:30:45Z
    emit(
        "BUILD_TIMESTAMP",
        &chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    emit(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
    );
}
