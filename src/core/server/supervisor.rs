// ─── Server Process Supervisor ───
// Launches the server jar with the computed JVM flags, observes its
// merged output for the readiness marker, and owns the blocking
// wait/terminate lifecycle.

use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::jvm::JvmOptions;
use crate::core::error::{ServerError, ServerResult};
use crate::core::process::ProcessHandle;

/// Conventional startup-completion marker for this server family.
pub const READY_MARKER: &str = "Done (";

/// Set-once flag flipped when the readiness marker appears in output.
pub type ReadySignal = Arc<OnceLock<()>>;

/// A launched server process plus its readiness signal.
pub struct ServerProcess {
    pub handle: ProcessHandle,
    ready: ReadySignal,
}

impl ServerProcess {
    pub fn from_child(child: tokio::process::Child) -> Self {
        Self {
            handle: ProcessHandle::new(child),
            ready: ReadySignal::default(),
        }
    }

    /// Whether the readiness marker has been observed. Signal only; the
    /// supervisor never gates behavior on it.
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    /// Block until the process exits naturally or the operator interrupts
    /// with Ctrl-C. Interruption is the designed shutdown trigger, not a
    /// failure: the process is terminated and its status returned.
    pub async fn wait(&mut self) -> ServerResult<ExitStatus> {
        self.wait_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Same as [`wait`](Self::wait) with an explicit cancellation future.
    pub async fn wait_with_shutdown<F>(&mut self, shutdown: F) -> ServerResult<ExitStatus>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            status = self.handle.wait() => {
                return Ok(status?);
            }
            _ = &mut shutdown => {}
        }

        info!("Interrupt received, stopping the server...");
        self.handle.terminate().await;
        Ok(self.handle.wait().await?)
    }

    /// Idempotent termination; safe after natural exit.
    pub async fn terminate(&mut self) {
        self.handle.terminate().await;
    }
}

/// Launches and supervises the game-server process.
pub struct ServerProcessSupervisor {
    port: u16,
    jvm: JvmOptions,
}

impl ServerProcessSupervisor {
    /// Supervisor with host-derived JVM options.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            jvm: JvmOptions::detect(),
        }
    }

    pub fn with_jvm_options(port: u16, jvm: JvmOptions) -> Self {
        Self { port, jvm }
    }

    /// Spawn `java <flags> -jar <jar> nogui` with the server directory as
    /// working directory. Error output is funneled into the same observer
    /// as standard output so a single consumer sees all diagnostics.
    pub async fn launch(
        &self,
        executable_path: &Path,
        working_directory: &Path,
        readiness_marker: &str,
    ) -> ServerResult<ServerProcess> {
        free_port(self.port).await;

        let mut cmd = Command::new("java");
        cmd.args(self.jvm.as_args())
            .arg("-jar")
            .arg(executable_path)
            .arg("nogui")
            .current_dir(working_directory)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(
            "Launching server: {:?} (heap {}G..{}G, port {})",
            executable_path, self.jvm.initial_heap_gb, self.jvm.max_heap_gb, self.port
        );
        debug!("Command: {:?}", cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| ServerError::ProcessLaunch(e.to_string()))?;

        let ready = ReadySignal::default();
        if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
            spawn_output_observer(stdout, stderr, readiness_marker.to_string(), ready.clone());
        }

        Ok(ServerProcess {
            handle: ProcessHandle::new(child),
            ready,
        })
    }
}

/// One detached observer per process: echoes every output line to the
/// operator and flips the readiness signal on the first marker match.
/// Ends naturally when both streams close.
fn spawn_output_observer(
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
    marker: String,
    ready: ReadySignal,
) {
    tokio::spawn(async move {
        let mut stdout = BufReader::new(stdout).lines();
        let mut stderr = BufReader::new(stderr).lines();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => observe_line(&line, &marker, &ready),
                    _ => stdout_open = false,
                },
                line = stderr.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => observe_line(&line, &marker, &ready),
                    _ => stderr_open = false,
                },
            }
        }
    });
}

fn observe_line(line: &str, marker: &str, ready: &ReadySignal) {
    println!("{line}");
    if mark_ready(line, marker, ready) {
        info!("Server finished starting up");
    }
}

/// Returns true only for the line that flips the signal; the signal never
/// transitions back, no matter how many marker lines follow.
fn mark_ready(line: &str, marker: &str, ready: &ReadySignal) -> bool {
    line.contains(marker) && ready.set(()).is_ok()
}

/// Best-effort release of the target TCP port before (re)launch. A failure
/// here is a warning, never fatal; the launch itself reports its own error.
pub async fn free_port(port: u16) {
    let target = format!("{port}/tcp");
    match Command::new("fuser").arg("-k").arg(&target).output().await {
        Ok(output) if output.status.success() => {
            info!("Freed TCP port {port} held by a previous process")
        }
        Ok(_) => debug!("TCP port {port} was already free"),
        Err(e) => warn!("Could not free TCP port {port}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_flips_exactly_once() {
        let ready = ReadySignal::default();
        let lines = [
            "[12:00:01] [Server thread/INFO]: Starting minecraft server",
            "[12:00:09] [Server thread/INFO]: Done (8.251s)! For help, type \"help\"",
            "[12:00:15] [Server thread/INFO]: Done (again?) spurious repeat",
        ];

        let flips: Vec<bool> = lines
            .iter()
            .map(|line| mark_ready(line, READY_MARKER, &ready))
            .collect();

        assert_eq!(flips, vec![false, true, false]);
        assert!(ready.get().is_some());
    }

    #[test]
    fn unrelated_lines_never_flip_the_signal() {
        let ready = ReadySignal::default();
        assert!(!mark_ready("Preparing spawn area: 97%", READY_MARKER, &ready));
        assert!(ready.get().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wait_with_shutdown_interrupt_terminates_and_returns_status() {
        let child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let mut server = ServerProcess::from_child(child);

        // An already-resolved shutdown future simulates an operator
        // interrupt during the wait phase.
        let status = server.wait_with_shutdown(async {}).await.unwrap();
        assert!(!status.success());

        // Terminate after the fact must be a no-op.
        server.terminate().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wait_with_shutdown_reports_natural_exit() {
        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg("exit 7")
            .spawn()
            .unwrap();
        let mut server = ServerProcess::from_child(child);

        let status = server
            .wait_with_shutdown(std::future::pending())
            .await
            .unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn free_port_on_unbound_port_is_not_fatal() {
        // Nothing listens here; the call must simply return.
        free_port(39999).await;
    }
}
