//! Build script for smartspace
//! Stamps the git revision and build time used by `version_info()`

use chrono::Utc;
use std::process::Command;

fn main() {
    // Packaged builds have no .git; they may pass the revision in instead
    let git_hash = std::env::var("SMARTSPACE_GIT_HASH").ok().or_else(|| {
        Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
    });

    let build_time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!(
        "cargo:rustc-env=GIT_HASH={}",
        git_hash.unwrap_or_else(|| "unknown".to_string())
    );
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    println!("cargo:rerun-if-env-changed=SMARTSPACE_GIT_HASH");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
