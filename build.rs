use std::process::Command;

/// Build hash reported by `/api/status`. Container builds without a `.git`
/// directory pass it through `LIKEFEED_BUILD_HASH`.
fn build_hash() -> String {
    if let Ok(hash) = std::env::var("LIKEFEED_BUILD_HASH") {
        if !hash.trim().is_empty() {
            return hash.trim().to_string();
        }
    }

    Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rustc-env=GIT_HASH={}", build_hash());
    println!("cargo:rerun-if-env-changed=LIKEFEED_BUILD_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
