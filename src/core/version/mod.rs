pub mod fabric;
pub mod manifest;
pub mod paper;

pub use manifest::{VersionEntry, VersionManifest};

use crate::core::error::ServerResult;
use crate::core::instance::ServerType;

/// A resolved server jar: where to get it and how to validate it.
#[derive(Debug, Clone)]
pub struct ResolvedServerJar {
    pub url: String,
    pub sha1: Option<String>,
    /// The Minecraft version the jar actually targets. Differs from the
    /// requested one for snapshots, where "latest" is resolved here.
    pub version: String,
}

/// Resolve the download URL (and optional SHA-1) for a server jar.
pub async fn resolve_download_url(
    client: &reqwest::Client,
    server_type: ServerType,
    version: &str,
) -> ServerResult<ResolvedServerJar> {
    match server_type {
        ServerType::Vanilla => {
            let manifest = VersionManifest::fetch(client).await?;
            let download = manifest.server_download(client, version).await?;
            Ok(ResolvedServerJar {
                url: download.url,
                sha1: download.sha1,
                version: version.to_string(),
            })
        }
        ServerType::Snapshot => {
            // Snapshots always track the newest one Mojang publishes.
            let manifest = VersionManifest::fetch(client).await?;
            let snapshot = manifest.latest.snapshot.clone();
            let download = manifest.server_download(client, &snapshot).await?;
            Ok(ResolvedServerJar {
                url: download.url,
                sha1: download.sha1,
                version: snapshot,
            })
        }
        ServerType::Paper => Ok(ResolvedServerJar {
            url: paper::resolve(client, version).await?,
            sha1: None,
            version: version.to_string(),
        }),
        ServerType::Fabric => Ok(ResolvedServerJar {
            url: fabric::resolve(client, version).await?,
            sha1: None,
            version: version.to_string(),
        }),
    }
}
