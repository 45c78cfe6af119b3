use std::process::Command;

#[test]
fn test_cli_help_flag() {
    let output = Command::new("cargo")
        .args(["run", "-p", "voxpop-cli", "--", "--help"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "Help flag should exit with code 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Convert text to speech"),
        "Help output should contain description"
    );
    assert!(
        stdout.contains("Usage:"),
        "Help output should contain usage information"
    );
}

#[test]
fn test_cli_version_flag() {
    let output = Command::new("cargo")
        .args(["run", "-p", "voxpop-cli", "--", "--version"])
        .output()
        .expect("Failed to execute");

    assert!(
        output.status.success(),
        "Version flag should exit with code 0"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("voxpop"),
        "Version output should contain binary name"
    );
}

#[test]
fn test_cli_unknown_provider_fails() {
    let output = Command::new("cargo")
        .args(["run", "-p", "voxpop-cli", "--", "speak", "-p", "espeak", "hello"])
        .output()
        .expect("Failed to execute");

    assert!(
        !output.status.success(),
        "Unknown provider should exit nonzero"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown provider"),
        "Error should name the unknown provider, got: {stderr}"
    );
}

#[test]
fn test_cli_invalid_speed_fails() {
    let output = Command::new("cargo")
        .args(["run", "-p", "voxpop-cli", "--", "speak", "-s", "warp", "hello"])
        .output()
        .expect("Failed to execute");

    assert!(!output.status.success(), "Invalid speed should exit nonzero");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid speed"),
        "Error should mention the speed, got: {stderr}"
    );
}

#[test]
fn test_cli_live_rejects_non_say_backends() {
    let output = Command::new("cargo")
        .args([
            "run", "-p", "voxpop-cli", "--", "speak", "--live", "-p", "kokoro", "hello",
        ])
        .output()
        .expect("Failed to execute");

    assert!(
        !output.status.success(),
        "Live mode with a neural backend should exit nonzero"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("say backend"),
        "Error should point at the say backend, got: {stderr}"
    );
}

#[test]
fn test_cli_providers_subcommand_lists_backends() {
    let output = Command::new("cargo")
        .args(["run", "-p", "voxpop-cli", "--", "providers"])
        .output()
        .expect("Failed to execute");

    assert!(output.status.success(), "Providers listing should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["say", "elevenlabs", "chatterbox", "kokoro"] {
        assert!(stdout.contains(name), "Listing should include {name}");
    }
}
