//! One-shot command execution: exit codes, stdout/stderr separation,
//! timeouts, and the dangerous-command blocklist.

use shellmcp::process::{clamp_timeout, run, validate_command, ProcessConfig};

fn config(command: &str) -> ProcessConfig {
    ProcessConfig {
        command: command.to_string(),
        working_directory: None,
        timeout_seconds: None,
    }
}

#[tokio::test]
async fn echo_returns_zero_exit_code() {
    let result = run(&config("echo hello")).await;
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("hello"));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn exit_code_preserved() {
    let result = run(&config("exit 42")).await;
    assert_eq!(result.exit_code, 42);
}

#[tokio::test]
async fn stdout_and_stderr_kept_separate() {
    let result = run(&config("echo out_line; echo err_line >&2")).await;
    assert!(result.stdout.contains("out_line"));
    assert!(!result.stdout.contains("err_line"));
    assert!(result.stderr.contains("err_line"));
}

#[tokio::test]
async fn timeout_kills_process() {
    let result = run(&ProcessConfig {
        command: "sleep 30".to_string(),
        working_directory: None,
        timeout_seconds: Some(1),
    })
    .await;
    assert!(result.timed_out);
    assert_eq!(result.exit_code, -1);
    assert!(result.duration_seconds < 5.0);
}

#[test]
fn clamp_timeout_enforces_ceiling() {
    assert_eq!(clamp_timeout(Some(100)), Some(100));
    assert_eq!(clamp_timeout(Some(999_999)), Some(3600));
    assert_eq!(clamp_timeout(None), None);
}

#[test]
fn blocks_rm_rf_root() {
    assert!(validate_command("rm -rf /").is_err());
    assert!(validate_command("sudo rm -rf /usr").is_err());
    assert!(validate_command("echo hi && rm -rf /").is_err());
}

#[test]
fn allows_safe_rm() {
    assert!(validate_command("rm -rf ./build").is_ok());
    assert!(validate_command("rm -rf /tmp/mytest").is_ok());
}

#[test]
fn blocks_fork_bomb_and_mkfs() {
    assert!(validate_command(":(){ :|:& };:").is_err());
    assert!(validate_command("mkfs.ext4 /dev/sda1").is_err());
}
