// ─── Orchestration Session ───
// Composes tunnel + server: start the tunnel first, then the server, block
// on server completion, and guarantee the tunnel is torn down afterward no
// matter how the server exited. The tunnel never outlives the server.

use std::future::Future;
use std::path::Path;
use std::process::ExitStatus;

use tracing::{info, warn};

use crate::core::error::ServerResult;
use crate::core::server::{ServerProcess, ServerProcessSupervisor, READY_MARKER};
use crate::core::tunnel::{TunnelHandle, TunnelProcess};

/// Runtime aggregate of the optional tunnel handle. Lives from session
/// start until the tunnel has been terminated; never persisted.
pub struct OrchestrationSession {
    tunnel: Option<TunnelProcess>,
}

impl OrchestrationSession {
    pub fn new(tunnel: Option<TunnelProcess>) -> Self {
        Self { tunnel }
    }

    pub fn tunnel_active(&self) -> bool {
        self.tunnel.is_some()
    }

    /// Public address of the tunnel, if one is up and discovery finished.
    pub fn public_address(&self) -> Option<String> {
        self.tunnel.as_ref().and_then(|t| t.public_address())
    }

    /// Terminate the tunnel. Taking the handle out makes repeat calls
    /// no-ops, so the tunnel is stopped exactly once per session.
    pub async fn shutdown_tunnel(&mut self) {
        if let Some(mut tunnel) = self.tunnel.take() {
            tunnel.terminate().await;
        }
    }
}

/// Orchestrates one server run with an optional tunnel.
pub struct Orchestrator {
    supervisor: ServerProcessSupervisor,
}

impl Orchestrator {
    pub fn new(supervisor: ServerProcessSupervisor) -> Self {
        Self { supervisor }
    }

    /// Start the tunnel (if any), launch the server, wait for it to finish
    /// or for an operator interrupt, then tear the tunnel down.
    ///
    /// Tunnel failures are recoverable: the session continues without one.
    /// A server launch failure aborts the session, after tunnel teardown.
    pub async fn run(
        &self,
        tunnel: Option<&dyn TunnelHandle>,
        executable_path: &Path,
        working_directory: &Path,
    ) -> ServerResult<ExitStatus> {
        let tunnel_process = match tunnel {
            Some(handle) => match handle.start().await {
                Ok(process) => Some(process),
                Err(e) if e.is_recoverable() => {
                    warn!("Continuing without a tunnel: {e}");
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let mut session = OrchestrationSession::new(tunnel_process);

        // The server launches immediately; address discovery catches up in
        // the background.
        let server = match self
            .supervisor
            .launch(executable_path, working_directory, READY_MARKER)
            .await
        {
            Ok(server) => server,
            Err(e) => {
                session.shutdown_tunnel().await;
                return Err(e);
            }
        };

        supervise(server, &mut session, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }
}

/// Wait for the server with the given cancellation future, then run the
/// shared teardown path. The tunnel is terminated exactly once before this
/// returns, for every wait outcome.
async fn supervise<F>(
    mut server: ServerProcess,
    session: &mut OrchestrationSession,
    shutdown: F,
) -> ServerResult<ExitStatus>
where
    F: Future<Output = ()>,
{
    let wait_result = server.wait_with_shutdown(shutdown).await;

    session.shutdown_tunnel().await;

    let status = wait_result?;
    if status.success() {
        info!("Server exited cleanly");
    } else {
        info!("Server exited with {status}");
    }
    Ok(status)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::core::tunnel::AddressSlot;
    use tokio::process::Command;

    fn fake_tunnel() -> TunnelProcess {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        TunnelProcess::new("fake", child, AddressSlot::default())
    }

    fn fake_server(script: &str) -> ServerProcess {
        let child = Command::new("sh").arg("-c").arg(script).spawn().unwrap();
        ServerProcess::from_child(child)
    }

    #[tokio::test]
    async fn shutdown_tunnel_is_idempotent() {
        let mut session = OrchestrationSession::new(Some(fake_tunnel()));
        assert!(session.tunnel_active());

        session.shutdown_tunnel().await;
        assert!(!session.tunnel_active());

        // Repeat teardown is a no-op: the handle was taken, so the tunnel
        // can only ever be terminated once per session.
        session.shutdown_tunnel().await;
        assert!(!session.tunnel_active());
    }

    #[tokio::test]
    async fn supervise_tears_tunnel_down_on_failure_exit() {
        let mut session = OrchestrationSession::new(Some(fake_tunnel()));
        let server = fake_server("exit 5");

        let status = supervise(server, &mut session, std::future::pending())
            .await
            .unwrap();
        assert_eq!(status.code(), Some(5));
        assert!(!session.tunnel_active());
    }

    #[tokio::test]
    async fn supervise_tears_tunnel_down_on_interrupt() {
        let mut session = OrchestrationSession::new(Some(fake_tunnel()));
        // Long-running server; the resolved shutdown future plays the part
        // of an operator interrupt during the wait phase.
        let server = fake_server("sleep 30");

        let status = supervise(server, &mut session, async {}).await.unwrap();
        assert!(!status.success());
        assert!(!session.tunnel_active());
    }

    #[tokio::test]
    async fn session_without_tunnel_is_fine() {
        let mut session = OrchestrationSession::new(None);
        assert!(!session.tunnel_active());
        assert_eq!(session.public_address(), None);

        let server = fake_server("exit 0");
        let status = supervise(server, &mut session, std::future::pending())
            .await
            .unwrap();
        assert!(status.success());
    }
}
