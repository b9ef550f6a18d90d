// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=FILTERCAM_VERSION");

    // Packagers can pin the version string explicitly
    let version = std::env::var("FILTERCAM_VERSION")
        .ok()
        .or_else(describe_head)
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo::rustc-env=FILTERCAM_BUILD_VERSION={}", version);
}

/// `git describe` output without the leading `v`, or `None` outside a checkout
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if described.is_empty() {
        return None;
    }
    Some(described.strip_prefix('v').unwrap_or(&described).to_string())
}
