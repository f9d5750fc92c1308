//! nsd-control process invocation.
//!
//! Runs the control utility with a bounded timeout and hands back its raw
//! stdout. On Unix the child leads its own process group, and a timeout
//! kills the whole group before reaping the child, so wrapper scripts leave
//! no orphans behind. `kill_on_drop` covers callers that drop the future
//! early.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::collector_config::CollectorConfig;
use crate::error::CollectError;

/// Runs `command` with `args` and returns its stdout.
#[instrument(skip(command, args), fields(command = %command.display()))]
pub async fn run(
    command: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<Vec<u8>, CollectError> {
    if timeout.is_zero() {
        return Err(CollectError::Config("timeout must be greater than 0".into()));
    }

    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn()?;
    let pid = child.id();

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let outcome = {
        let io = async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let read_out = async {
                match stdout.as_mut() {
                    Some(pipe) => pipe.read_to_end(&mut out).await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let read_err = async {
                match stderr.as_mut() {
                    Some(pipe) => pipe.read_to_end(&mut err).await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let (r_out, r_err) = tokio::join!(read_out, read_err);
            r_out?;
            r_err?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        };
        tokio::time::timeout(timeout, io).await
    };

    match outcome {
        Ok(Ok((status, out, err))) => {
            if status.success() {
                debug!(bytes = out.len(), "nsd-control finished");
                Ok(out)
            } else {
                Err(CollectError::CommandFailed {
                    status,
                    stderr: String::from_utf8_lossy(&err).trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => Err(CollectError::Io(e)),
        Err(_) => {
            warn!(?timeout, "nsd-control timed out, killing it");
            drop(stdout);
            drop(stderr);
            #[cfg(unix)]
            {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
            }
            // kill() also waits, so the child is reaped here
            if let Err(e) = child.kill().await {
                debug!("Failed to kill timed out nsd-control: {}", e);
            }
            Err(CollectError::Timeout(timeout))
        }
    }
}

/// Sends SIGKILL to the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!("Failed to kill process group {}: {}", raw, e);
    }
}

/// A source of raw `key=value` statistics.
pub trait StatsSource: Send {
    /// Builds the source from configuration; called by `Collector::init`.
    fn resolve(config: &CollectorConfig) -> Result<Self, CollectError>
    where
        Self: Sized;

    /// Fetches one raw sample.
    fn stats(&self) -> impl Future<Output = Result<Vec<u8>, CollectError>> + Send;
}

/// Resolved nsd-control invocation.
#[derive(Debug, Clone)]
pub struct NsdControl {
    path: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl NsdControl {
    pub fn new(path: PathBuf, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            path,
            args,
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl StatsSource for NsdControl {
    fn resolve(config: &CollectorConfig) -> Result<Self, CollectError> {
        let path = resolve_binary(&config.binary)?;
        Ok(NsdControl::new(path, config.command_args(), config.timeout))
    }

    fn stats(&self) -> impl Future<Output = Result<Vec<u8>, CollectError>> + Send {
        run(&self.path, &self.args, self.timeout)
    }
}

/// Finds `binary` on PATH (or checks it directly when it contains a path
/// separator) and verifies it is an executable file.
pub fn resolve_binary(binary: &Path) -> Result<PathBuf, CollectError> {
    let path = which::which(binary).map_err(|e| {
        CollectError::Initialization(format!("cannot resolve '{}': {}", binary.display(), e))
    })?;

    let meta = std::fs::metadata(&path).map_err(|e| {
        CollectError::Initialization(format!("cannot stat '{}': {}", path.display(), e))
    })?;
    if !meta.is_file() {
        return Err(CollectError::Initialization(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(CollectError::Initialization(format!(
                "'{}' is not executable",
                path.display()
            )));
        }
    }

    debug!("Resolved nsd-control to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = run(
            Path::new("/bin/sh"),
            &["-c".to_string(), "echo num.queries=5".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(out, b"num.queries=5\n");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_keeps_stderr() {
        let err = run(
            Path::new("/bin/sh"),
            &["-c".to_string(), "echo 'error: no connection' >&2; exit 1".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            CollectError::CommandFailed { status, stderr } => {
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr, "error: no connection");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_timeout_kills_child() {
        let start = Instant::now();
        let err = run(
            Path::new("/bin/sh"),
            &["-c".to_string(), "exec sleep 10".to_string()],
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CollectError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_run_rejects_zero_timeout() {
        let err = run(Path::new("/bin/true"), &[], Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Config(_)));
    }

    /// True once `pid` has exited (gone or a zombie awaiting its reaper).
    fn exited(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
        }
    }

    #[tokio::test]
    async fn test_run_timeout_kills_forked_grandchild() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("grandchild.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pidfile.display());

        let err = run(
            Path::new("/bin/sh"),
            &["-c".to_string(), script],
            Duration::from_millis(300),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CollectError::Timeout(_)));

        let pid = std::fs::read_to_string(&pidfile).unwrap();
        let pid = pid.trim();
        let mut gone = false;
        for _ in 0..40 {
            if exited(pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "grandchild {} still running", pid);
    }

    #[test]
    fn test_resolve_binary_missing() {
        let err = resolve_binary(Path::new("definitely-not-nsd-control-xyz")).unwrap_err();
        assert!(matches!(err, CollectError::Initialization(_)));
    }

    #[test]
    fn test_resolve_binary_on_path() {
        assert!(resolve_binary(Path::new("sh")).is_ok());
    }
}
