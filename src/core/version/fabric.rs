// ─── Fabric Resolver ───
// Resolves the Fabric server launcher jar via meta.fabricmc.net.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{ServerError, ServerResult};

const FABRIC_META_BASE: &str = "https://meta.fabricmc.net/v2/versions";

#[derive(Debug, Deserialize)]
struct FabricComponent {
    version: String,
    #[serde(default)]
    stable: bool,
}

/// Pick the newest stable component version, falling back to the newest
/// entry when none of the recent ones is marked stable.
fn pick_stable(components: &[FabricComponent]) -> Option<&str> {
    components
        .iter()
        .take(5)
        .find(|c| c.stable)
        .or_else(|| components.first())
        .map(|c| c.version.as_str())
}

async fn fetch_components(
    client: &reqwest::Client,
    endpoint: &str,
) -> ServerResult<Vec<FabricComponent>> {
    let url = format!("{FABRIC_META_BASE}/{endpoint}");
    Ok(client.get(&url).send().await?.json().await?)
}

/// Resolve the download URL for the Fabric server launcher of `version`.
pub async fn resolve(client: &reqwest::Client, version: &str) -> ServerResult<String> {
    let loaders = fetch_components(client, "loader").await?;
    let installers = fetch_components(client, "installer").await?;

    let loader = pick_stable(&loaders).ok_or_else(|| ServerError::VersionNotFound {
        server_type: "fabric".into(),
        version: version.to_string(),
    })?;
    let installer = pick_stable(&installers).ok_or_else(|| ServerError::VersionNotFound {
        server_type: "fabric".into(),
        version: version.to_string(),
    })?;

    info!(
        "Resolved Fabric for {}: loader {}, installer {}",
        version, loader, installer
    );

    Ok(format!(
        "{FABRIC_META_BASE}/loader/{version}/{loader}/{installer}/server/jar"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_stable_prefers_recent_stable_entry() {
        let components = vec![
            FabricComponent {
                version: "0.16.0-beta".into(),
                stable: false,
            },
            FabricComponent {
                version: "0.15.7".into(),
                stable: true,
            },
        ];
        assert_eq!(pick_stable(&components), Some("0.15.7"));
    }

    #[test]
    fn pick_stable_falls_back_to_newest() {
        let components = vec![
            FabricComponent {
                version: "0.16.0-beta.1".into(),
                stable: false,
            },
            FabricComponent {
                version: "0.16.0-beta.0".into(),
                stable: false,
            },
        ];
        assert_eq!(pick_stable(&components), Some("0.16.0-beta.1"));
    }

    #[test]
    fn pick_stable_empty_list() {
        assert_eq!(pick_stable(&[]), None);
    }
}
