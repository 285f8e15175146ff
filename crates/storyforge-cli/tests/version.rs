use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "storyforge-cli", "--bin", "storyforge", "--"]);
    cmd
}

#[test]
fn test_version_json() {
    let output = cargo_bin()
        .args(["version", "--json"])
        .output()
        .expect("Failed to run storyforge");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert!(json["version"].is_string());
}

#[test]
fn test_version_plain() {
    let output = cargo_bin()
        .arg("version")
        .output()
        .expect("Failed to run storyforge");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
