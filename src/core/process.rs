// ─── Process Handle ───
// Thin wrapper over a spawned child process. Owned exclusively by the
// component that spawned it; must be terminated or awaited before that
// component goes away.

use std::process::ExitStatus;

use tokio::process::Child;
use tracing::{debug, warn};

/// A running (or already-reaped) external process.
pub struct ProcessHandle {
    child: Option<Child>,
    exit_status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub fn new(child: Child) -> Self {
        Self {
            child: Some(child),
            exit_status: None,
        }
    }

    /// OS process id, if the process is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// Exit status, pending (`None`) until the process has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Wait for the process to exit naturally. Returns the cached status
    /// on repeated calls.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let Some(child) = self.child.as_mut() else {
            return Err(std::io::Error::other("process was never started"));
        };

        let status = child.wait().await?;
        self.exit_status = Some(status);
        self.child = None;
        Ok(status)
    }

    /// Send a termination request to the process and reap it.
    ///
    /// Idempotent: calling on an already-exited or already-terminated
    /// process is a no-op, not an error.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            debug!("terminate: process already reaped");
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("terminate: process had already exited ({status})");
                self.exit_status = Some(status);
            }
            _ => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to signal process: {e}");
                }
                match child.wait().await {
                    Ok(status) => self.exit_status = Some(status),
                    Err(e) => warn!("Failed to reap process: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tokio::process::Command;

    fn spawn_sleep(seconds: u32) -> ProcessHandle {
        let child = Command::new("sleep")
            .arg(seconds.to_string())
            .spawn()
            .unwrap();
        ProcessHandle::new(child)
    }

    #[tokio::test]
    async fn terminate_is_idempotent() {
        let mut handle = spawn_sleep(30);
        assert!(handle.id().is_some());

        handle.terminate().await;
        let first_status = handle.exit_status();
        assert!(first_status.is_some());

        // Second call must be a no-op and leave state unchanged.
        handle.terminate().await;
        assert_eq!(handle.exit_status(), first_status);
    }

    #[tokio::test]
    async fn terminate_after_natural_exit_is_a_no_op() {
        let child = Command::new("true").spawn().unwrap();
        let mut handle = ProcessHandle::new(child);

        let status = handle.wait().await.unwrap();
        assert!(status.success());

        handle.terminate().await;
        assert_eq!(handle.exit_status(), Some(status));
    }

    #[tokio::test]
    async fn wait_returns_cached_status_on_repeat() {
        let child = Command::new("sh").arg("-c").arg("exit 3").spawn().unwrap();
        let mut handle = ProcessHandle::new(child);

        let status = handle.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(handle.wait().await.unwrap(), status);
    }
}
