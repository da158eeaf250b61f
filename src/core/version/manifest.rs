// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2, plus the
// per-version JSON that carries the dedicated-server jar download.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{ServerError, ServerResult};

const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

/// The `latest` block naming the current release and snapshot.
#[derive(Debug, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
}

/// The subset of a per-version JSON we care about: server jar download.
#[derive(Debug, Deserialize)]
pub struct VersionDetail {
    pub downloads: VersionDownloads,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub server: Option<ServerDownload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDownload {
    pub url: String,
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the version manifest from Mojang using a shared HTTP client.
    pub async fn fetch(client: &reqwest::Client) -> ServerResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let manifest: VersionManifest = client
            .get(VERSION_MANIFEST_URL)
            .send()
            .await?
            .json()
            .await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// List all official stable versions (release only).
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }

    /// Resolve the dedicated-server jar download for a version ID.
    pub async fn server_download(
        &self,
        client: &reqwest::Client,
        id: &str,
    ) -> ServerResult<ServerDownload> {
        let entry = self
            .find_version(id)
            .ok_or_else(|| ServerError::VersionNotFound {
                server_type: "vanilla".into(),
                version: id.to_string(),
            })?;

        let detail: VersionDetail = client.get(&entry.url).send().await?.json().await?;

        detail
            .downloads
            .server
            .ok_or_else(|| ServerError::VersionNotFound {
                server_type: "vanilla".into(),
                version: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_manifest() {
        let json = r#"{
            "latest": { "release": "1.20.4", "snapshot": "24w07a" },
            "versions": [
                {
                    "id": "1.20.4",
                    "type": "release",
                    "url": "https://example.com/1.20.4.json"
                },
                {
                    "id": "24w07a",
                    "type": "snapshot",
                    "url": "https://example.com/24w07a.json"
                }
            ]
        }"#;
        let manifest: VersionManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.latest.snapshot, "24w07a");
        assert!(manifest.find_version("1.20.4").is_some());
        assert!(manifest.find_version("1.0.0").is_none());
        assert_eq!(manifest.releases().len(), 1);
    }

    #[test]
    fn deserialize_version_detail_without_server_jar() {
        // Very old versions have no dedicated server download.
        let json = r#"{ "downloads": {} }"#;
        let detail: VersionDetail = serde_json::from_str(json).unwrap();
        assert!(detail.downloads.server.is_none());
    }
}
