// ─── PaperMC Resolver ───
// Resolves the latest Paper build for a Minecraft version via the
// PaperMC v2 API.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{ServerError, ServerResult};

const PAPER_API_BASE: &str = "https://api.papermc.io/v2/projects/paper";

#[derive(Debug, Deserialize)]
struct PaperVersion {
    builds: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct PaperBuild {
    downloads: PaperDownloads,
}

#[derive(Debug, Deserialize)]
struct PaperDownloads {
    application: PaperApplication,
}

#[derive(Debug, Deserialize)]
struct PaperApplication {
    name: String,
}

/// Resolve the download URL for the latest Paper build of `version`.
pub async fn resolve(client: &reqwest::Client, version: &str) -> ServerResult<String> {
    let not_found = || ServerError::VersionNotFound {
        server_type: "paper".into(),
        version: version.to_string(),
    };

    let version_url = format!("{PAPER_API_BASE}/versions/{version}");
    let response = client.get(&version_url).send().await?;
    if !response.status().is_success() {
        return Err(not_found());
    }

    let paper_version: PaperVersion = response.json().await?;
    let build = *paper_version.builds.last().ok_or_else(not_found)?;

    let build_url = format!("{version_url}/builds/{build}");
    let paper_build: PaperBuild = client.get(&build_url).send().await?.json().await?;

    let jar_name = paper_build.downloads.application.name;
    info!("Resolved Paper {} build {} ({})", version, build, jar_name);

    Ok(format!("{build_url}/downloads/{jar_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_paper_build_listing() {
        let json = r#"{ "builds": [100, 101, 102] }"#;
        let version: PaperVersion = serde_json::from_str(json).unwrap();
        assert_eq!(version.builds.last(), Some(&102));
    }

    #[test]
    fn deserialize_paper_build_downloads() {
        let json = r#"{
            "downloads": {
                "application": { "name": "paper-1.20.4-496.jar" }
            }
        }"#;
        let build: PaperBuild = serde_json::from_str(json).unwrap();
        assert_eq!(build.downloads.application.name, "paper-1.20.4-496.jar");
    }
}
