use assert_cmd::Command;

#[test]
fn help_lists_runtime_flags() {
    let assert = Command::cargo_bin("suno-mcp").unwrap().arg("--help").assert();
    let output = assert.success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("--headed"));
    assert!(text.contains("--download-dir"));
    assert!(text.contains("--no-auto-open"));
}

#[test]
fn version_flag_succeeds() {
    Command::cargo_bin("suno-mcp")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}
