// Inject the build version from git describe, falling back to the cargo
// package version when git (or a checkout) is unavailable.

use std::process::Command;

fn main() {
    let version = git_describe().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    println!("cargo:rustc-env=DECARB_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

/// Version from `git describe`: the tag part of "v0.1.0[-5-gabc123]", or
/// the raw commit hash on untagged checkouts
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    match described.strip_prefix('v') {
        Some(tagged) => Some(
            tagged
                .split_once('-')
                .map_or(tagged, |(tag, _)| tag)
                .to_string(),
        ),
        None => Some(described.to_string()),
    }
}
