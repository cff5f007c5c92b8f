//! Extension handlers executed as subprocesses.
//!
//! The process receives the payload as JSON on stdin and writes its result
//! to stdout. Exit code 0 means success. Stdout that parses as JSON becomes
//! the result; anything else is returned as a trimmed JSON string.

use super::{CardHandler, HandlerError};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Argument passed to every extension process, naming the entry point.
pub const ENTRY_POINT_ARG: &str = "handle_card";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs an executable module as a card handler.
#[derive(Debug, Clone)]
pub struct ProcessHandler {
    program: PathBuf,
    timeout: Duration,
    environment: HashMap<String, String>,
}

impl ProcessHandler {
    /// Create a handler for the executable at `program`.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            environment: HashMap::new(),
        }
    }

    /// Extra environment variables for the process.
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    fn timed_out(&self) -> HandlerError {
        HandlerError::new(format!("timed out after {}s", self.timeout.as_secs_f64()))
    }

    fn spawn(&self) -> Result<Child, HandlerError> {
        Command::new(&self.program)
            .arg(ENTRY_POINT_ARG)
            .envs(&self.environment)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HandlerError::new(format!(
                    "failed to start '{}': {}",
                    self.program.display(),
                    e
                ))
            })
    }
}

impl CardHandler for ProcessHandler {
    fn handle_card(&self, payload: &Value) -> Result<Value, HandlerError> {
        let input = serde_json::to_vec(payload)
            .map_err(|e| HandlerError::new(format!("failed to serialize payload: {}", e)))?;

        let deadline = Instant::now() + self.timeout;
        let mut child = self.spawn()?;

        // Feed stdin and drain both pipes on their own threads so a chatty or
        // non-reading child can't deadlock against us. The threads are never
        // joined: one blocked on a pipe that a grandchild still holds stays
        // parked until that pipe closes or cardsend exits.
        let stdin = child.stdin.take();
        thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The child may exit without reading; a broken pipe is not our failure.
                let _ = stdin.write_all(&input);
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let Some(status) = wait_until(&mut child, deadline)? else {
            return Err(self.timed_out());
        };

        // The child has exited, but its output is only complete once every
        // process holding the pipes has closed them.
        let stdout = collect(&stdout, deadline).ok_or_else(|| self.timed_out())?;
        let stderr = collect(&stderr, deadline).ok_or_else(|| self.timed_out())?;

        if !status.success() {
            return Err(HandlerError::new(failure_message(status, &stderr)));
        }

        Ok(parse_output(&stdout))
    }
}

/// Wait for a child process until `deadline`.
///
/// Returns `None` if the process was killed because the deadline passed.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, HandlerError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {
                if Instant::now() >= deadline {
                    kill_process(child);
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                kill_process(child);
                return Err(HandlerError::new(format!(
                    "failed to check process status: {}",
                    e
                )));
            }
        }
    }
}

/// Kill a process and reap it.
fn kill_process(child: &mut Child) {
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}

/// Read a pipe to EOF on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for drained output until `deadline`. `None` means the deadline passed.
fn collect(output: &Receiver<Vec<u8>>, deadline: Instant) -> Option<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match output.recv_timeout(remaining) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
    }
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    let cause = match status.code() {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by signal".to_string(),
    };

    if stderr.is_empty() {
        cause
    } else {
        format!("{}: {}", cause, stderr)
    }
}

fn parse_output(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::write_agent_script;
    use serde_json::json;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_round_trips_payload_through_cat() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(temp_dir.path(), "cat_agent", "cat", true);

        let handler = ProcessHandler::new(script, TIMEOUT);
        let result = handler.handle_card(&json!({"msg": "hi"})).unwrap();

        assert_eq!(result, json!({"msg": "hi"}));
    }

    #[test]
    fn test_non_json_stdout_becomes_string() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(temp_dir.path(), "plain", "echo 'card received'", true);

        let result = ProcessHandler::new(script, TIMEOUT)
            .handle_card(&json!({}))
            .unwrap();

        assert_eq!(result, json!("card received"));
    }

    #[test]
    fn test_entry_point_argument_is_passed() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(temp_dir.path(), "args", "echo \"\\\"$1\\\"\"", true);

        let result = ProcessHandler::new(script, TIMEOUT)
            .handle_card(&json!({}))
            .unwrap();

        assert_eq!(result, json!(ENTRY_POINT_ARG));
    }

    #[test]
    fn test_non_zero_exit_reports_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(
            temp_dir.path(),
            "broken",
            "echo 'quota exceeded' >&2\nexit 3",
            true,
        );

        let err = ProcessHandler::new(script, TIMEOUT)
            .handle_card(&json!({}))
            .unwrap_err();

        assert_eq!(err.message(), "exited with code 3: quota exceeded");
    }

    #[test]
    fn test_non_zero_exit_without_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(temp_dir.path(), "silent", "exit 1", true);

        let err = ProcessHandler::new(script, TIMEOUT)
            .handle_card(&json!({}))
            .unwrap_err();

        assert_eq!(err.message(), "exited with code 1");
    }

    #[test]
    fn test_environment_is_passed() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(
            temp_dir.path(),
            "env_agent",
            "printf '{\"model\": \"%s\"}' \"$CARD_MODEL\"",
            true,
        );

        let mut env = HashMap::new();
        env.insert("CARD_MODEL".to_string(), "gpt-4o".to_string());
        let result = ProcessHandler::new(script, TIMEOUT)
            .with_environment(env)
            .handle_card(&json!({}))
            .unwrap();

        assert_eq!(result, json!({"model": "gpt-4o"}));
    }

    #[test]
    fn test_timeout_kills_process() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(temp_dir.path(), "slow", "exec sleep 30", true);

        let start = Instant::now();
        let err = ProcessHandler::new(script, Duration::from_millis(200))
            .handle_card(&json!({}))
            .unwrap_err();

        assert!(err.message().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_covers_background_children_holding_output() {
        let temp_dir = TempDir::new().unwrap();
        let script = write_agent_script(
            temp_dir.path(),
            "forker",
            "sleep 30 &\necho '{\"ok\": true}'",
            true,
        );

        let start = Instant::now();
        let err = ProcessHandler::new(script, Duration::from_millis(500))
            .handle_card(&json!({}))
            .unwrap_err();

        assert!(err.message().starts_with("timed out after"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_fails_to_start() {
        let temp_dir = TempDir::new().unwrap();
        let err = ProcessHandler::new(temp_dir.path().join("nope"), TIMEOUT)
            .handle_card(&json!({}))
            .unwrap_err();

        assert!(err.message().starts_with("failed to start"));
    }

    #[test]
    fn test_parse_output_trims_whitespace() {
        assert_eq!(parse_output("  {\"a\": 1}\n"), json!({"a": 1}));
        assert_eq!(parse_output(""), json!(""));
    }
}
