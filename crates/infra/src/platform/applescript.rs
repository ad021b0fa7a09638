//! AppleScript execution with timeout handling.
//!
//! [`OsascriptRunner`] executes a staged script file with `osascript`:
//! - Timeout handling using the `wait-timeout` crate (the child is killed and
//!   reaped once the budget elapses)
//! - Authorization refusals mapped to `PermissionDenied`
//! - UTF-8 output validation
//!
//! The blocking wait runs on the blocking thread pool so async callers are
//! never stalled.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use daybrief_core::ScriptRunner;
use daybrief_domain::{DayBriefError, Result as DomainResult};
use tracing::{debug, instrument, trace, warn};
use wait_timeout::ChildExt;

use crate::errors::{map_join_error, InfraError};

/// Stderr fragments the scripting bridge emits when calendar access is
/// refused.
const AUTHORIZATION_MARKERS: &[&str] = &["-1743", "not authorized", "not allowed"];

/// [`ScriptRunner`] backed by the `osascript` command-line tool.
#[derive(Debug, Clone)]
pub struct OsascriptRunner {
    interpreter: PathBuf,
}

impl Default for OsascriptRunner {
    fn default() -> Self {
        Self { interpreter: PathBuf::from("osascript") }
    }
}

impl OsascriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different interpreter binary (receives the script path as its
    /// only argument).
    pub fn with_interpreter(interpreter: impl Into<PathBuf>) -> Self {
        Self { interpreter: interpreter.into() }
    }
}

#[async_trait]
impl ScriptRunner for OsascriptRunner {
    #[instrument(skip(self), fields(interpreter = %self.interpreter.display()))]
    async fn run(&self, script: &Path, timeout: Duration) -> DomainResult<String> {
        let interpreter = self.interpreter.clone();
        let script = script.to_path_buf();

        tokio::task::spawn_blocking(move || execute_script_file(&interpreter, &script, timeout))
            .await
            .map_err(map_join_error)?
    }
}

/// Execute a script file with a timeout.
///
/// # Errors
/// - `Timeout` if the script outlives `timeout` (the process is killed)
/// - `PermissionDenied` if the bridge refuses calendar access
/// - `Internal` if the interpreter cannot be spawned, exits non-zero, or
///   writes invalid UTF-8
fn execute_script_file(interpreter: &Path, script: &Path, timeout: Duration) -> DomainResult<String> {
    debug!(script = %script.display(), timeout_secs = timeout.as_secs(), "Executing script with timeout");

    let mut child = Command::new(interpreter)
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            DayBriefError::Internal(format!("failed to spawn {}: {e}", interpreter.display()))
        })?;

    // Drain both pipes concurrently so a chatty script cannot block on a full
    // pipe buffer while we wait on it.
    let stdout = drain(&mut child, Stream::Stdout);
    let stderr = drain(&mut child, Stream::Stderr);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => {
            trace!(exit_code = status.code(), "Script exited");
            status
        }
        Ok(None) => {
            warn!(timeout_secs = timeout.as_secs(), "Script execution timed out, killing process");
            let _ = child.kill();
            let _ = child.wait();
            return Err(DayBriefError::Timeout(format!(
                "calendar script exceeded {}s",
                timeout.as_secs()
            )));
        }
        Err(e) => {
            let _ = child.kill();
            return Err(InfraError::from(e).into());
        }
    };

    let stdout = collect(stdout)?;
    let stderr = String::from_utf8_lossy(&collect(stderr)?).trim().to_string();

    if !status.success() {
        return Err(classify_failure(status.code(), &stderr));
    }

    let output = String::from_utf8(stdout).map_err(|e| {
        DayBriefError::Internal(format!("script output is not valid UTF-8: {e}"))
    })?;

    let result = output.trim().to_string();
    debug!(output_len = result.len(), "Script executed successfully");
    Ok(result)
}

/// Map a non-zero exit into a domain error.
fn classify_failure(code: Option<i32>, stderr: &str) -> DayBriefError {
    let lower = stderr.to_ascii_lowercase();
    if AUTHORIZATION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        warn!(stderr = %stderr, "Calendar access not authorized");
        return DayBriefError::PermissionDenied(format!(
            "calendar access was not granted: {stderr}"
        ));
    }

    warn!(exit_code = code, stderr = %stderr, "Script returned non-zero exit code");
    match code {
        Some(code) => DayBriefError::Internal(format!("script failed with exit code {code}: {stderr}")),
        None => DayBriefError::Internal(format!("script terminated by signal: {stderr}")),
    }
}

enum Stream {
    Stdout,
    Stderr,
}

type Drain = Option<JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain(child: &mut Child, stream: Stream) -> Drain {
    let mut pipe: Box<dyn Read + Send> = match stream {
        Stream::Stdout => Box::new(child.stdout.take()?),
        Stream::Stderr => Box::new(child.stderr.take()?),
    };
    Some(std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    }))
}

fn collect(handle: Drain) -> DomainResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| DayBriefError::Internal("script output reader panicked".into()))?
            .map_err(|e| InfraError::from(e).into()),
        None => Ok(Vec::new()),
    }
}
