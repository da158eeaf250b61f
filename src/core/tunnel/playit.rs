// ─── playit.gg Tunnel ───
// Spawns `playit run` and parses its stdout for the agent/tunnel status
// lines. No credential required; the agent handles its own pairing.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use super::types::{AddressSlot, TunnelHandle, TunnelProcess};
use crate::core::error::{ServerError, ServerResult};

const AGENT_CONNECTED_MARKER: &str = "agent connected";
const TUNNEL_READY_MARKER: &str = "tunnel ready";

pub struct PlayitTunnel;

/// Status events recognized in the agent's output.
#[derive(Debug, PartialEq, Eq)]
enum PlayitEvent {
    AgentConnected,
    TunnelReady(String),
}

/// Markers are matched case-insensitively; the public address is the last
/// whitespace-delimited token of the "tunnel ready" line.
fn parse_line(line: &str) -> Option<PlayitEvent> {
    let lower = line.to_ascii_lowercase();
    if lower.contains(AGENT_CONNECTED_MARKER) {
        return Some(PlayitEvent::AgentConnected);
    }
    if lower.contains(TUNNEL_READY_MARKER) {
        return line
            .split_whitespace()
            .last()
            .map(|token| PlayitEvent::TunnelReady(token.to_string()));
    }
    None
}

#[async_trait]
impl TunnelHandle for PlayitTunnel {
    fn name(&self) -> &'static str {
        "playit"
    }

    async fn start(&self) -> ServerResult<TunnelProcess> {
        info!("Starting playit.gg agent");
        let mut child = Command::new("playit")
            .arg("run")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ServerError::TunnelUnavailable(format!("failed to start playit: {e}")))?;

        let address = AddressSlot::default();

        // Line reads block, so the observer gets its own task. It ends
        // naturally when the agent's stdout closes.
        if let Some(stdout) = child.stdout.take() {
            let slot = address.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    match parse_line(&line) {
                        Some(PlayitEvent::AgentConnected) => {
                            info!("playit agent connected");
                        }
                        Some(PlayitEvent::TunnelReady(addr)) => {
                            if slot.set(addr.clone()).is_ok() {
                                info!("Server public address: {addr}");
                            }
                        }
                        None => {}
                    }
                }
            });
        }

        Ok(TunnelProcess::new("playit", child, address))
    }
}
