//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("mojoflash")
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mojoflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn short_help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("mojoflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mojoflash"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn short_version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains("mojoflash"))
        .stderr(predicate::str::is_empty());
}

// ============================================================================
// Exit Code Tests
// ============================================================================

/// Exit code 0: successful operations
#[test]
fn exit_code_zero_on_success() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .code(0);

    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .code(0);

    // completions bash exits 0 (doesn't require hardware)
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .code(0);
}

/// Exit code 2: usage error (unknown command, invalid arguments)
#[test]
fn exit_code_two_for_usage_error_unknown_command() {
    let mut cmd = cli_cmd();
    cmd.arg("unknown-command-xyz")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized").or(predicate::str::contains("unknown")));
}

#[test]
fn exit_code_two_for_usage_error_invalid_flag() {
    let mut cmd = cli_cmd();
    cmd.arg("--invalid-flag-xyz")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn exit_code_two_for_flash_without_bitstream() {
    let mut cmd = cli_cmd();
    cmd.env_remove("MOJOFLASH_PORT")
        .arg("flash")
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn exit_code_two_for_flash_without_port() {
    let dir = tempdir().expect("tempdir should be created");
    let bitstream = dir
        .path()
        .join("mojo.bin");
    fs::write(&bitstream, [0u8; 64]).expect("write bitstream");

    let mut cmd = cli_cmd();
    cmd.env_remove("MOJOFLASH_PORT")
        .arg("flash")
        .arg(&bitstream)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--port"));
}

#[test]
fn exit_code_two_for_erase_without_port() {
    let mut cmd = cli_cmd();
    cmd.env_remove("MOJOFLASH_PORT")
        .arg("erase")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--port"));
}

/// Exit code 10: the serial port cannot be opened
#[test]
fn exit_code_ten_for_unopenable_port() {
    let dir = tempdir().expect("tempdir should be created");
    let bitstream = dir
        .path()
        .join("mojo.bin");
    fs::write(&bitstream, [0u8; 64]).expect("write bitstream");

    let mut cmd = cli_cmd();
    cmd.arg("flash")
        .arg(&bitstream)
        .args(["--port", "/dev/mojoflash-test-no-such-port"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("Cannot open serial port"));
}

#[test]
fn exit_code_ten_for_erase_with_unopenable_port() {
    let mut cmd = cli_cmd();
    cmd.args(["erase", "--port", "/dev/mojoflash-test-no-such-port"])
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("Cannot open serial port"));
}

/// Exit code 11: bitstream file cannot be read
#[test]
fn exit_code_eleven_for_missing_bitstream_file() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("not_there.bin");

    let mut cmd = cli_cmd();
    cmd.arg("flash")
        .arg(&missing)
        .args(["--port", "/dev/mojoflash-test-no-such-port"])
        .assert()
        .failure()
        .code(11)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to load bitstream"));
}

// ============================================================================
// Environment Variables
// ============================================================================

#[test]
fn port_env_var_replaces_port_flag() {
    let dir = tempdir().expect("tempdir should be created");
    let bitstream = dir
        .path()
        .join("mojo.bin");
    fs::write(&bitstream, [0u8; 64]).expect("write bitstream");

    // The env var satisfies the required --port; the run then fails at
    // open time because the port does not exist.
    let mut cmd = cli_cmd();
    cmd.env("MOJOFLASH_PORT", "/dev/mojoflash-test-no-such-port")
        .arg("flash")
        .arg(&bitstream)
        .assert()
        .failure()
        .code(10)
        .stderr(predicate::str::contains("/dev/mojoflash-test-no-such-port"));
}

// ============================================================================
// stdout/stderr Separation
// ============================================================================

#[test]
fn flash_errors_keep_stdout_clean() {
    let mut cmd = cli_cmd();
    cmd.env_remove("MOJOFLASH_PORT")
        .arg("flash")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn completions_command_writes_to_stdout() {
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains("_mojoflash()"));
}

#[test]
fn quiet_mode_suppresses_status_lines() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("not_there.bin");

    let mut cmd = cli_cmd();
    cmd.arg("--quiet")
        .arg("flash")
        .arg(&missing)
        .args(["--port", "/dev/mojoflash-test-no-such-port"])
        .assert()
        .failure()
        .code(11)
        .stderr(predicate::str::contains("Loading bitstream").not())
        .stderr(predicate::str::contains("Error"));
}

// ============================================================================
// -- Option Terminator
// ============================================================================

#[test]
fn option_terminator_allows_dash_prefixed_operand() {
    let mut cmd = cli_cmd();
    cmd.args(["flash", "--port", "/dev/mojoflash-test-no-such-port", "--", "-odd-name.bin"])
        .assert()
        .failure()
        .code(11); // parses; the file simply does not exist
}

// ============================================================================
// Unknown Command Suggestions
// ============================================================================

#[test]
fn unknown_command_suggests_similar() {
    let mut cmd = cli_cmd();
    cmd.arg("falsh") // typo for flash
        .assert()
        .failure()
        .stderr(predicate::str::contains("flash").or(predicate::str::contains("did you mean")));
}

// ============================================================================
// TTY Detection (colors disabled on non-TTY)
// ============================================================================

#[test]
fn colors_disabled_when_not_tty() {
    let mut cmd = cli_cmd();
    let output = cmd
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .clone();

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert!(
        !stdout.contains("\x1b["),
        "Colors should be disabled in non-TTY mode"
    );
}

#[test]
fn verbose_flags_are_recognized() {
    let mut cmd = cli_cmd();
    cmd.arg("-vv")
        .arg("--version")
        .assert()
        .success();
}
