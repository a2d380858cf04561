//! Build identification for the receipt-ocr startup banner
//!
//! Exposes `GIT_HASH` (8-char commit, `-dirty` when the tree has local
//! edits), `BUILD_TIMESTAMP` (UTC, or `SOURCE_DATE_EPOCH` when set) and
//! `BUILD_PROFILE` to the binaries.

use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn commit_label() -> String {
    match git(&["describe", "--always", "--dirty", "--abbrev=8", "--match=NONE"]) {
        Some(label) if !label.is_empty() => label,
        _ => "unknown".to_string(),
    }
}

fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

fn main() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", commit_label());
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        build_time().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Re-run when the checked-out commit moves
    if let Some(head) = git(&["rev-parse", "--git-path", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", head);
    }
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=build.rs");
}
