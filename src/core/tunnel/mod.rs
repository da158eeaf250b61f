//! Tunnel providers for exposing the server port to the public internet.
//!
//! Two providers are supported, with divergent address-discovery
//! strategies kept fully behind the [`TunnelHandle`] trait:
//! - **ngrok** — `ngrok tcp <port>`, address polled from the local API
//! - **playit.gg** — `playit run`, address parsed from agent output
//!
//! The tunnel is strictly optional: an empty registry or a failed start
//! downgrades to running the server without one.

pub mod ngrok;
pub mod playit;
pub mod types;

pub use ngrok::NgrokTunnel;
pub use playit::PlayitTunnel;
pub use types::{AddressSlot, TunnelHandle, TunnelProcess};

use tracing::warn;

/// The tunnel providers this host could run, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ngrok,
    PlayitGG,
}

/// Registry entry: display name, install pointer, and constructor.
#[derive(Debug, Clone, Copy)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub binary: &'static str,
    pub install_hint: &'static str,
    pub kind: ProviderKind,
}

const ALL_PROVIDERS: &[ProviderInfo] = &[
    ProviderInfo {
        name: "ngrok",
        binary: "ngrok",
        install_hint: "https://ngrok.com/download",
        kind: ProviderKind::Ngrok,
    },
    ProviderInfo {
        name: "playit.gg",
        binary: "playit",
        install_hint: "https://playit.gg/download",
        kind: ProviderKind::PlayitGG,
    },
];

impl ProviderInfo {
    /// Build the tunnel handle for this provider, targeting `local_port`.
    pub fn build(&self, local_port: u16) -> Box<dyn TunnelHandle> {
        match self.kind {
            ProviderKind::Ngrok => Box::new(NgrokTunnel::new(None, local_port)),
            ProviderKind::PlayitGG => Box::new(PlayitTunnel),
        }
    }
}

/// Providers whose binary is installed on this host, in registry order.
pub fn available_providers() -> Vec<ProviderInfo> {
    ALL_PROVIDERS
        .iter()
        .filter(|p| which(p.binary))
        .copied()
        .collect()
}

/// Look up an installed provider by its display or binary name.
pub fn provider_by_name<'a>(
    providers: &'a [ProviderInfo],
    name: &str,
) -> Option<&'a ProviderInfo> {
    let name = name.to_ascii_lowercase();
    providers
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(&name) || p.binary.eq_ignore_ascii_case(&name))
}

/// User-facing warning listing where to obtain each provider. Emitted when
/// the registry is empty; the server still runs, just without a tunnel.
pub fn warn_no_providers() {
    warn!("No tunnel provider installed; the server will not be reachable from the internet.");
    for provider in ALL_PROVIDERS {
        warn!("  install {} from {}", provider.name, provider.install_hint);
    }
}

/// Check if a binary is available on PATH using `which` / `where`.
fn which(binary: &str) -> bool {
    std::process::Command::new(if cfg!(windows) { "where" } else { "which" })
        .arg(binary)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_lookup_matches_display_and_binary_names() {
        let providers: Vec<ProviderInfo> = ALL_PROVIDERS.to_vec();
        assert_eq!(
            provider_by_name(&providers, "NGROK").map(|p| p.kind),
            Some(ProviderKind::Ngrok)
        );
        assert_eq!(
            provider_by_name(&providers, "playit").map(|p| p.kind),
            Some(ProviderKind::PlayitGG)
        );
        assert_eq!(
            provider_by_name(&providers, "playit.gg").map(|p| p.kind),
            Some(ProviderKind::PlayitGG)
        );
        assert!(provider_by_name(&providers, "cloudflared").is_none());
    }

    #[test]
    fn build_produces_the_matching_handle() {
        for provider in ALL_PROVIDERS {
            let handle = provider.build(25565);
            match provider.kind {
                ProviderKind::Ngrok => assert_eq!(handle.name(), "ngrok"),
                ProviderKind::PlayitGG => assert_eq!(handle.name(), "playit"),
            }
        }
    }

    #[test]
    fn which_nonexistent_binary() {
        assert!(!which("craftport_nonexistent_binary_12345"));
    }

    #[test]
    fn which_existing_binary() {
        if cfg!(unix) {
            assert!(which("ls"));
        }
    }
}
