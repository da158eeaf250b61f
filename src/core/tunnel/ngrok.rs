// ─── ngrok Tunnel ───
// Spawns `ngrok tcp <port>` and polls the local ngrok API
// (`http://localhost:4040/api/tunnels`) until the public address shows up.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{info, warn};

use super::types::{AddressSlot, TunnelHandle, TunnelProcess};
use crate::core::error::{ServerError, ServerResult};

const NGROK_API_URL: &str = "http://localhost:4040/api/tunnels";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Environment fallback for the auth token.
pub const NGROK_TOKEN_ENV: &str = "NGROK_AUTH_TOKEN";

pub struct NgrokTunnel {
    auth_token: Option<String>,
    local_port: u16,
}

impl NgrokTunnel {
    pub fn new(auth_token: Option<String>, local_port: u16) -> Self {
        Self {
            auth_token,
            local_port,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TunnelList {
    tunnels: Vec<TunnelEntry>,
}

#[derive(Debug, Deserialize)]
struct TunnelEntry {
    public_url: String,
}

/// `tcp://1.2.3.4:5555` → `1.2.3.4:5555`. URLs without a scheme pass
/// through unchanged.
fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map_or(url, |(_, rest)| rest)
}

/// First tunnel entry's public address, scheme stripped.
fn first_public_address(list: &TunnelList) -> Option<String> {
    list.tunnels
        .first()
        .map(|t| strip_scheme(&t.public_url).to_string())
}

fn resolve_token(explicit: Option<String>, env_value: Option<String>) -> Option<String> {
    explicit
        .filter(|t| !t.trim().is_empty())
        .or_else(|| env_value.filter(|t| !t.trim().is_empty()))
}

async fn fetch_public_address(client: &reqwest::Client) -> Option<String> {
    let response = client.get(NGROK_API_URL).send().await.ok()?;
    let list: TunnelList = response.json().await.ok()?;
    first_public_address(&list)
}

#[async_trait]
impl TunnelHandle for NgrokTunnel {
    fn name(&self) -> &'static str {
        "ngrok"
    }

    async fn start(&self) -> ServerResult<TunnelProcess> {
        let token = resolve_token(
            self.auth_token.clone(),
            std::env::var(NGROK_TOKEN_ENV).ok(),
        )
        .ok_or_else(|| {
            warn!("No ngrok auth token configured; continuing without a tunnel");
            ServerError::MissingCredential {
                provider: "ngrok".into(),
                hint: format!("set {NGROK_TOKEN_ENV} or pass a token"),
            }
        })?;

        // One-time side effect: persist the token into ngrok's own config.
        let configured = Command::new("ngrok")
            .args(["config", "add-authtoken", &token])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match configured {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("ngrok token configuration exited with {status}"),
            Err(e) => {
                return Err(ServerError::TunnelUnavailable(format!(
                    "failed to run ngrok: {e}"
                )))
            }
        }

        info!("Starting ngrok tcp tunnel on port {}", self.local_port);
        let child = Command::new("ngrok")
            .arg("tcp")
            .arg(self.local_port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ServerError::TunnelUnavailable(format!("failed to start ngrok: {e}")))?;

        // Detached discovery task: polls the local API once a second with
        // no retry cap, publishes the address once, then ends. It is never
        // joined; it dies with the program if the address never appears.
        let address = AddressSlot::default();
        let slot = address.clone();
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            loop {
                tokio::time::sleep(POLL_INTERVAL).await;
                if let Some(addr) = fetch_public_address(&client).await {
                    if slot.set(addr.clone()).is_ok() {
                        info!("Server public address: {addr}");
                    }
                    break;
                }
            }
        });

        Ok(TunnelProcess::new("ngrok", child, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_address_strips_tcp_scheme() {
        let json = r#"{"tunnels":[{"public_url":"tcp://1.2.3.4:5555"}]}"#;
        let list: TunnelList = serde_json::from_str(json).unwrap();
        assert_eq!(first_public_address(&list).as_deref(), Some("1.2.3.4:5555"));
    }

    #[test]
    fn no_tunnels_means_no_address_yet() {
        let json = r#"{"tunnels":[]}"#;
        let list: TunnelList = serde_json::from_str(json).unwrap();
        assert_eq!(first_public_address(&list), None);
    }

    #[test]
    fn strip_scheme_passes_bare_addresses_through() {
        assert_eq!(strip_scheme("1.2.3.4:5555"), "1.2.3.4:5555");
        assert_eq!(strip_scheme("https://example.ngrok.io"), "example.ngrok.io");
    }

    #[test]
    fn token_resolution_prefers_explicit_over_env() {
        assert_eq!(
            resolve_token(Some("tok_a".into()), Some("tok_b".into())).as_deref(),
            Some("tok_a")
        );
        assert_eq!(
            resolve_token(None, Some("tok_b".into())).as_deref(),
            Some("tok_b")
        );
        assert_eq!(resolve_token(None, None), None);
        // Blank values count as absent.
        assert_eq!(resolve_token(Some("  ".into()), None), None);
    }

    #[tokio::test]
    async fn fetch_public_address_tolerates_unreachable_api() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        // Nothing is listening on the ngrok API port in tests.
        assert_eq!(fetch_public_address(&client).await, None);
    }
}
