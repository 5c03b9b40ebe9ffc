//! Ad-hoc shell execution: one `/bin/sh -c <command>` per call, no session,
//! no state carried between calls. Backs the stateless `bash` tool.
//!
//! Includes the same security hardening the session manager relies on:
//! env var sanitization, a dangerous-command blocklist, and a timeout
//! ceiling, adapted from the teacher's process-spawning module.

use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;

/// Maximum allowed timeout in seconds (1 hour), mirrored by the session
/// manager's `max_timeout_ms`.
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Returns the set of env var names to strip.
///
/// By default, child processes inherit the full environment. Set
/// `SHELLMCP_STRIP_ENV` to a comma-separated list of names to strip,
/// e.g. `SHELLMCP_STRIP_ENV=OPENAI_API_KEY,AWS_SECRET_ACCESS_KEY`.
fn stripped_env_vars() -> &'static std::collections::HashSet<String> {
    static STRIPPED: LazyLock<std::collections::HashSet<String>> = LazyLock::new(|| {
        std::env::var("SHELLMCP_STRIP_ENV")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    });
    &STRIPPED
}

#[must_use]
pub fn is_sensitive_env(name: &str) -> bool {
    let stripped = stripped_env_vars();
    !stripped.is_empty() && stripped.contains(&name.to_uppercase())
}

/// Clamp a timeout value to the allowed ceiling.
#[must_use]
pub fn clamp_timeout(timeout: Option<u64>) -> Option<u64> {
    timeout.map(|t| t.min(MAX_TIMEOUT_SECONDS))
}

// ---------------------------------------------------------------------------
// Dangerous command detection
// ---------------------------------------------------------------------------

const PROTECTED_PATHS: &[&str] = &[
    "/", "/bin", "/sbin", "/usr", "/etc", "/var", "/home", "/root", "/lib", "/lib64", "/opt",
    "/boot", "/dev", "/sys", "/proc", "/System", "/Library", "/Applications", "/Users",
    "/private", "/private/var", "/private/etc",
];

struct DangerousPattern {
    regex: Regex,
    description: &'static str,
}

static DANGEROUS_PATTERNS: LazyLock<Vec<DangerousPattern>> = LazyLock::new(|| {
    vec![
        DangerousPattern {
            regex: Regex::new(r":\(\)\s*\{.*\|.*&\s*\}\s*;").unwrap(),
            description: "fork bomb",
        },
        DangerousPattern {
            regex: Regex::new(r"\bmkfs\b").unwrap(),
            description: "filesystem format (mkfs)",
        },
        DangerousPattern {
            regex: Regex::new(r"\bdd\b[^|&;]*\bof=/dev/").unwrap(),
            description: "raw write to block device (dd of=/dev/...)",
        },
        DangerousPattern {
            regex: Regex::new(r">\s*/dev/(sd|nvme|hd|vd|xvd|disk|mapper/)").unwrap(),
            description: "redirect to block device",
        },
        DangerousPattern {
            regex: Regex::new(r"\b(shutdown|reboot|halt|poweroff)\b").unwrap(),
            description: "system shutdown/reboot",
        },
        DangerousPattern {
            regex: Regex::new(r"\binit\s+[06]\b").unwrap(),
            description: "system halt/reboot via init",
        },
    ]
});

/// Validate a command against the dangerous-command blocklist.
pub fn validate_command(command: &str) -> Result<(), String> {
    for pattern in DANGEROUS_PATTERNS.iter() {
        if pattern.regex.is_match(command) {
            return Err(format!(
                "blocked: command matches dangerous pattern ({}): {}",
                pattern.description, command
            ));
        }
    }
    check_destructive_on_protected_paths(command)
}

fn check_destructive_on_protected_paths(command: &str) -> Result<(), String> {
    for subcmd in split_subcommands(command.trim()) {
        let subcmd = subcmd.trim();
        if subcmd.is_empty() {
            continue;
        }
        if is_dangerous_removal(subcmd, "rm") {
            return Err(format!(
                "blocked: recursive delete targeting a protected system path: {subcmd}"
            ));
        }
        if is_dangerous_removal(subcmd, "chmod") {
            return Err(format!(
                "blocked: recursive chmod on a protected system path: {subcmd}"
            ));
        }
        if is_dangerous_removal(subcmd, "chown") {
            return Err(format!(
                "blocked: recursive chown on a protected system path: {subcmd}"
            ));
        }
    }
    Ok(())
}

fn split_subcommands(cmd: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut remaining = cmd;
    while !remaining.is_empty() {
        let next = [remaining.find("&&"), remaining.find("||"), remaining.find(';')]
            .into_iter()
            .flatten()
            .min();
        match next {
            Some(pos) => {
                parts.push(&remaining[..pos]);
                let sep_len = if remaining[pos..].starts_with("&&") || remaining[pos..].starts_with("||")
                {
                    2
                } else {
                    1
                };
                remaining = &remaining[pos + sep_len..];
            }
            None => {
                parts.push(remaining);
                break;
            }
        }
    }
    parts
}

fn is_dangerous_removal(subcmd: &str, cmd_name: &str) -> bool {
    let words: Vec<&str> = subcmd.split_whitespace().collect();
    let Some(cmd_pos) = words.iter().position(|w| *w == cmd_name) else {
        return false;
    };
    let args = &words[cmd_pos + 1..];
    let has_recursive = args.iter().any(|a| {
        *a == "-r"
            || *a == "-R"
            || *a == "--recursive"
            || (a.starts_with('-') && !a.starts_with("--") && (a.contains('r') || a.contains('R')))
    });
    if !has_recursive {
        return false;
    }
    targets_protected_path(args)
}

fn targets_protected_path(args: &[&str]) -> bool {
    for arg in args {
        if arg.starts_with('-') {
            continue;
        }
        if *arg == "/*" {
            return true;
        }
        let path = arg.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        if PROTECTED_PATHS.contains(&path) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Process execution
// ---------------------------------------------------------------------------

/// Result of a completed one-shot process execution. Stdout and stderr are
/// kept separate (unlike the session's merged line stream) so the bash
/// tool can render the `--- stderr ---` separator spec §6 requires.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub duration_seconds: f64,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Configuration for spawning a one-shot process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: String,
    pub working_directory: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Spawn `/bin/sh -c <command>` and wait for it to complete.
pub async fn run(config: &ProcessConfig) -> ProcessResult {
    let start = Instant::now();

    if let Err(reason) = validate_command(&config.command) {
        tracing::warn!(command = %config.command, reason = %reason, "dangerous command blocked");
        return ProcessResult {
            exit_code: -1,
            duration_seconds: start.elapsed().as_secs_f64(),
            stdout: String::new(),
            stderr: reason,
            timed_out: false,
        };
    }

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(&config.command);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    for (key, _) in std::env::vars() {
        if is_sensitive_env(&key) {
            cmd.env_remove(&key);
        }
    }

    // SAFETY: pre_exec runs in the forked child, before exec; setsid() is
    // async-signal-safe and only detaches the child into its own session.
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(std::io::Error::other)?;
            Ok(())
        });
    }

    if let Some(dir) = &config.working_directory {
        cmd.current_dir(dir);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ProcessResult {
                exit_code: -1,
                duration_seconds: start.elapsed().as_secs_f64(),
                stdout: String::new(),
                stderr: format!("Failed to spawn process: {e}"),
                timed_out: false,
            };
        }
    };

    let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr was piped");

    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(&mut stdout_pipe).read_to_string(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = BufReader::new(&mut stderr_pipe).read_to_string(&mut buf).await;
        buf
    });

    let (timed_out, exit_code) = if let Some(secs) = config.timeout_seconds {
        match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(Ok(status)) => (false, status.code().unwrap_or(-1)),
            Ok(Err(_)) => (false, -1),
            Err(_) => {
                let _ = kill_process(&child);
                let _ = child.wait().await;
                (true, -1)
            }
        }
    } else {
        match child.wait().await {
            Ok(status) => (false, status.code().unwrap_or(-1)),
            Err(_) => (false, -1),
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    ProcessResult {
        exit_code,
        duration_seconds: start.elapsed().as_secs_f64(),
        stdout,
        stderr,
        timed_out,
    }
}

/// Send `SIGKILL` to the process group of a child process (`setsid` makes
/// the child's PID double as its process group id).
pub fn kill_process(child: &tokio::process::Child) -> Result<(), String> {
    let pid = child
        .id()
        .ok_or_else(|| "process has no PID (already exited?)".to_string())?;
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(-(pid as i32)),
        nix::sys::signal::Signal::SIGKILL,
    )
    .map_err(|e| format!("failed to kill process group: {e}"))
}

