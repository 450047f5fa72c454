fn main() {
    // Release builds may pin PANDORA_VERSION; otherwise use the short git hash.
    if let Ok(version) = std::env::var("PANDORA_VERSION") {
        println!("cargo:rustc-env=PANDORA_VERSION={version}");
    } else {
        let hash = std::process::Command::new("git")
            .args(["rev-parse", "--short=7", "HEAD"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        if hash.is_empty() {
            println!("cargo:rustc-env=PANDORA_VERSION=dev");
        } else {
            println!("cargo:rustc-env=PANDORA_VERSION={hash}");
        }
    }
    println!("cargo:rerun-if-env-changed=PANDORA_VERSION");
}
