//! Persistent interactive shell sessions.
//!
//! Each session is a long-lived `bash` process addressed by an opaque id.
//! Commands are framed with a fresh sentinel marker per call so the manager
//! can recover the command's exit status from a shared, merged stdout
//! stream while leaving working directory, environment variables, and
//! background jobs intact between calls — unlike the stateless bash tool,
//! nothing here spawns a process per call.

use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::process;

/// Bounded capacity of a session's output channel.
const OUTPUT_CHANNEL_CAPACITY: usize = 10_000;

/// Tuning constants for the session manager, sourced from CLI flags.
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    pub max_output_chars: usize,
    pub max_timeout_ms: u64,
    pub default_timeout_ms: u64,
    pub ready_timeout_s: u64,
    pub run_as_user: Option<String>,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_output_chars: 30_000,
            max_timeout_ms: 600_000,
            default_timeout_ms: 120_000,
            ready_timeout_s: 300,
            run_as_user: None,
        }
    }
}

/// Parameters for starting a new session. The embedder-extensible schema
/// properties the session tool surface accepts land here as extra metadata.
#[derive(Debug, Clone, Default)]
pub struct StartSessionParams {
    pub working_directory: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Result of one `exec_command` call: the quadruple from spec §4.4.2.
#[derive(Debug, Clone)]
pub struct SessionExecResult {
    pub session_id: String,
    pub output: String,
    pub exit_code: i32,
    pub process_died: bool,
    pub timed_out: bool,
}

impl SessionExecResult {
    fn error(session_id: &str, message: &str, exit_code: i32, process_died: bool) -> Self {
        Self {
            session_id: session_id.to_string(),
            output: message.to_string(),
            exit_code,
            process_died,
            timed_out: false,
        }
    }
}

/// Information about a live or recently-seen session, for `*_list`.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub alive: bool,
    pub metadata: HashMap<String, String>,
    pub uptime_seconds: f64,
}

fn fresh_marker() -> String {
    format!("MCP{}", uuid::Uuid::new_v4().simple())
}

/// Find the wrapper-emitted sentinel in `line`, if present. A bare substring
/// match isn't enough: the command's own output could legitimately contain
/// the marker text without being the trailing `<marker><exit_code>` line, so
/// this only accepts a match whose suffix parses as an exit code. Returns
/// the byte offset where the real output ends and the parsed exit code.
pub fn match_marker_line(line: &str, marker: &str) -> Option<(usize, i32)> {
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find(marker) {
        let pos = search_from + offset;
        let after = &line[pos + marker.len()..];
        if let Ok(code) = after.trim().parse::<i32>() {
            return Some((pos, code));
        }
        search_from = pos + marker.len();
    }
    None
}

/// Drain whatever is immediately available on the channel without blocking.
fn drain_nonblocking(rx: &mut mpsc::Receiver<String>) {
    while rx.try_recv().is_ok() {}
}

/// Build the child command for a new session shell. Equivalent to spec's
/// `start_factory`: the manager itself is oblivious to shell choice.
fn build_shell_command(params: &StartSessionParams, config: &SessionManagerConfig) -> Command {
    let mut cmd = Command::new("bash");
    cmd.arg("--noprofile").arg("--norc");
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    for (key, _) in std::env::vars() {
        if process::is_sensitive_env(&key) {
            cmd.env_remove(&key);
        }
    }

    if let Some(dir) = &params.working_directory {
        cmd.current_dir(dir);
    }

    let run_as_user = config.run_as_user.clone();
    // SAFETY: pre_exec runs in the forked child, before exec. setsid() lets
    // stop_session kill the whole process group; the user lookup and
    // setuid/setgid calls are all async-signal-safe libc wrappers.
    unsafe {
        cmd.pre_exec(move || {
            nix::unistd::setsid().map_err(std::io::Error::other)?;
            if let Some(username) = &run_as_user {
                let user = nix::unistd::User::from_name(username)
                    .map_err(std::io::Error::other)?
                    .ok_or_else(|| {
                        std::io::Error::other(format!("no such user: {username}"))
                    })?;
                nix::unistd::setgid(user.gid).map_err(std::io::Error::other)?;
                nix::unistd::setuid(user.uid).map_err(std::io::Error::other)?;
            }
            Ok(())
        });
    }

    cmd
}

/// A running shell session: the process, its stdin, and the channel its
/// reader task feeds lines into.
struct Session {
    child: Child,
    stdin: ChildStdin,
    output_rx: mpsc::Receiver<String>,
    output_closed: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
    stderr_reader_task: Option<JoinHandle<Vec<String>>>,
    metadata: HashMap<String, String>,
    created_at: Instant,
}

impl Session {
    async fn exec_command(
        &mut self,
        session_id: &str,
        command: &str,
        timeout_ms: Option<u64>,
        config: &SessionManagerConfig,
    ) -> SessionExecResult {
        let process_exited = matches!(self.child.try_wait(), Ok(Some(_)));
        if process_exited && self.output_closed.load(Ordering::Acquire) {
            return SessionExecResult::error(session_id, "Error: process has exited", 1, true);
        }

        let marker = fresh_marker();
        let wrapped =
            format!("{command}\n__MCP_EC__=$?; printf '\\n{marker}%d\\n' \"$__MCP_EC__\"\n");

        if let Err(e) = self.stdin.write_all(wrapped.as_bytes()).await {
            return SessionExecResult::error(
                session_id,
                &format!("Error: failed to write to session: {e}"),
                1,
                true,
            );
        }
        if self.stdin.flush().await.is_err() {
            return SessionExecResult::error(
                session_id,
                "Error: failed to flush session stdin",
                1,
                true,
            );
        }

        let timeout_ms = timeout_ms
            .unwrap_or(config.default_timeout_ms)
            .min(config.max_timeout_ms);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        let mut output = String::new();
        let mut exit_code: Option<i32> = None;
        let mut process_died = false;

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            let per_take = remaining.min(Duration::from_secs(1));

            match tokio::time::timeout(per_take, self.output_rx.recv()).await {
                Ok(Some(line)) => {
                    if let Some((pos, code)) = match_marker_line(&line, &marker) {
                        exit_code = Some(code);
                        output.push_str(&line[..pos]);
                        break;
                    }
                    output.push_str(&line);
                    output.push('\n');
                }
                Ok(None) => {
                    process_died = true;
                    break;
                }
                Err(_) => {
                    if matches!(self.child.try_wait(), Ok(Some(_))) {
                        while let Ok(line) = self.output_rx.try_recv() {
                            if let Some((pos, code)) = match_marker_line(&line, &marker) {
                                exit_code = Some(code);
                                output.push_str(&line[..pos]);
                                break;
                            }
                            output.push_str(&line);
                            output.push('\n');
                        }
                        if exit_code.is_none() {
                            process_died = true;
                        }
                        break;
                    }
                    // still alive: keep polling until the deadline.
                }
            }
        }

        let timed_out = exit_code.is_none() && !process_died;

        if output.ends_with('\n') {
            output.pop();
        }
        if output.len() > config.max_output_chars {
            output.truncate(config.max_output_chars);
            output.push_str(&format!(
                "\n... (output truncated at {} characters)",
                config.max_output_chars
            ));
        }

        SessionExecResult {
            session_id: session_id.to_string(),
            output,
            exit_code: exit_code.unwrap_or(if process_died { 1 } else { -1 }),
            process_died,
            timed_out,
        }
    }
}

/// Manager for all live sessions. Locking a session's own `Mutex` is the
/// per-session exec lock: a session is reachable through `sessions` iff
/// that same lock exists, so the "session iff lock" invariant holds by
/// construction rather than needing a second map.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, Arc<Mutex<Session>>>>>,
    config: SessionManagerConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: SessionManagerConfig) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Spawn a new session shell and run the readiness handshake.
    pub async fn start_session(
        &self,
        params: StartSessionParams,
    ) -> Result<SessionInfo, SessionError> {
        let mut command = build_shell_command(&params, &self.config);
        let mut child = command
            .spawn()
            .map_err(|e| SessionError::Startup {
                exit_code: None,
                detail: format!("failed to spawn shell: {e}"),
            })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, mut rx) = mpsc::channel::<String>(OUTPUT_CHANNEL_CAPACITY);
        let output_closed = Arc::new(AtomicBool::new(false));
        let reader_closed = output_closed.clone();
        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            reader_closed.store(true, Ordering::Release);
        });

        let stderr_reader_task: JoinHandle<Vec<String>> = tokio::spawn(async move {
            let mut lines = Vec::new();
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                tracing::debug!(%line, "session stderr (startup)");
                lines.push(line);
            }
            lines
        });

        let mut session = Session {
            child,
            stdin,
            output_rx: rx,
            output_closed,
            reader_task,
            stderr_reader_task: Some(stderr_reader_task),
            metadata: params.metadata.clone(),
            created_at: Instant::now(),
        };

        tokio::time::sleep(Duration::from_millis(500)).await;

        let ready_deadline = Instant::now() + Duration::from_secs(self.config.ready_timeout_s);
        let ready = loop {
            if Instant::now() >= ready_deadline {
                break false;
            }

            if matches!(session.child.try_wait(), Ok(Some(_))) {
                tokio::time::sleep(Duration::from_millis(500)).await;
                return Err(self.startup_failure(session).await);
            }

            let marker = fresh_marker();
            if session
                .stdin
                .write_all(format!("echo {marker}\n").as_bytes())
                .await
                .is_err()
                || session.stdin.flush().await.is_err()
            {
                return Err(self.startup_failure(session).await);
            }

            let attempt_deadline = Instant::now() + Duration::from_secs(10);
            let mut saw_marker = false;
            while Instant::now() < attempt_deadline {
                let remaining = attempt_deadline - Instant::now();
                let per_take = remaining.min(Duration::from_secs(2));
                match tokio::time::timeout(per_take, session.output_rx.recv()).await {
                    Ok(Some(line)) if line.contains(&marker) => {
                        saw_marker = true;
                        break;
                    }
                    Ok(Some(_)) => continue,
                    Ok(None) => break,
                    Err(_) => continue,
                }
            }

            if saw_marker {
                break true;
            }
        };

        if !ready {
            return Err(self.startup_failure(session).await);
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        drain_nonblocking(&mut session.output_rx);
        if session.stdin.write_all(b"exec 2>&1\n").await.is_err()
            || session.stdin.flush().await.is_err()
        {
            return Err(self.startup_failure(session).await);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        drain_nonblocking(&mut session.output_rx);

        let id = uuid::Uuid::new_v4().to_string();
        let info = SessionInfo {
            id: id.clone(),
            alive: true,
            metadata: session.metadata.clone(),
            uptime_seconds: 0.0,
        };

        self.sessions
            .lock()
            .await
            .insert(id, Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %info.id, "session started");
        Ok(info)
    }

    /// Build a `StartupError` from whatever the session managed to collect
    /// before it was judged dead or unresponsive.
    async fn startup_failure(&self, mut session: Session) -> SessionError {
        let exit_code = match session.child.try_wait() {
            Ok(Some(status)) => status.code(),
            _ => None,
        };

        let mut residual = Vec::new();
        drain_into(&mut session.output_rx, &mut residual);

        let stderr_lines = if let Some(task) = session.stderr_reader_task.take() {
            tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        session.reader_task.abort();
        let _ = session.child.start_kill();

        SessionError::Startup {
            exit_code,
            detail: format!(
                "stderr_buffer={stderr_lines:?}, residual_stdout={residual:?}"
            ),
        }
    }

    /// The timeout actually applied by `exec` for a given requested value:
    /// the caller's request, or the configured default, clamped to the
    /// configured ceiling. Exposed so callers can report it in status text.
    #[must_use]
    pub fn effective_timeout_ms(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.config.default_timeout_ms)
            .min(self.config.max_timeout_ms)
    }

    /// Execute a command against a live session, holding its lock for the
    /// duration — this *is* the at-most-one-exec-in-flight guarantee.
    pub async fn exec(
        &self,
        session_id: &str,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> SessionExecResult {
        let slot = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).cloned()
        };
        let Some(slot) = slot else {
            return SessionExecResult::error(
                session_id,
                "Error: session has been stopped",
                1,
                false,
            );
        };

        let mut session = slot.lock().await;
        session
            .exec_command(session_id, command, timeout_ms, &self.config)
            .await
    }

    /// Stop one session: graceful `exit`, grace period, then a kill signal.
    pub async fn stop_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(session_id);
        let Some(slot) = removed else {
            return false;
        };

        let mut session = slot.lock().await;
        let _ = session.stdin.write_all(b"exit\n").await;
        let _ = session.stdin.flush().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        if matches!(session.child.try_wait(), Ok(None)) {
            let _ = process::kill_process(&session.child);
            let _ = session.child.start_kill();
        }

        session.reader_task.abort();
        if let Some(task) = session.stderr_reader_task.take() {
            task.abort();
        }

        tracing::info!(%session_id, "session stopped");
        true
    }

    /// Stop every currently-known session.
    pub async fn stop_all_sessions(&self) {
        let ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        for id in ids {
            self.stop_session(&id).await;
        }
    }

    /// Snapshot of every live session, for `*_list`.
    pub async fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions.lock().await;
        let mut infos = Vec::with_capacity(sessions.len());
        for (id, slot) in sessions.iter() {
            let mut session = slot.lock().await;
            let alive = matches!(session.child.try_wait(), Ok(None));
            infos.push(SessionInfo {
                id: id.clone(),
                alive,
                metadata: session.metadata.clone(),
                uptime_seconds: session.created_at.elapsed().as_secs_f64(),
            });
        }
        infos
    }
}

fn drain_into(rx: &mut mpsc::Receiver<String>, out: &mut Vec<String>) {
    while let Ok(line) = rx.try_recv() {
        out.push(line);
    }
}
