use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire backend.
/// Every module returns `Result<T, ServerError>`.
#[derive(Debug, Error)]
pub enum ServerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Version resolution ──────────────────────────────
    #[error("No {server_type} build found for Minecraft {version}")]
    VersionNotFound {
        server_type: String,
        version: String,
    },

    // ── Instance ────────────────────────────────────────
    #[error("Server instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Server instance already exists: {0}")]
    InstanceAlreadyExists(String),

    // ── Tunnel (all recoverable: the server runs without one) ──
    #[error("Missing credential for {provider}: {hint}")]
    MissingCredential { provider: String, hint: String },

    #[error("Tunnel unavailable: {0}")]
    TunnelUnavailable(String),

    // ── Process ─────────────────────────────────────────
    #[error("Failed to launch server process: {0}")]
    ProcessLaunch(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type ServerResult<T> = Result<T, ServerError>;

impl From<std::io::Error> for ServerError {
    fn from(source: std::io::Error) -> Self {
        ServerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl ServerError {
    /// Whether the session can continue without the feature that failed.
    /// Everything tunnel-related is recoverable; the server must be able
    /// to run with no tunnel at all.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServerError::MissingCredential { .. } | ServerError::TunnelUnavailable(_)
        )
    }
}
