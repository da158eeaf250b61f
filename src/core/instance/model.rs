use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported server flavors — strongly typed, no magic strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Vanilla,
    Snapshot,
    Paper,
    Fabric,
}

impl ServerType {
    /// The jar file name each flavor is stored under inside the server dir.
    pub fn jar_name(&self) -> &'static str {
        match self {
            ServerType::Vanilla => "vanilla.jar",
            ServerType::Snapshot => "snapshot.jar",
            ServerType::Paper => "server.jar",
            ServerType::Fabric => "fabric-server-launch.jar",
        }
    }

    pub const ALL: [ServerType; 4] = [
        ServerType::Vanilla,
        ServerType::Snapshot,
        ServerType::Paper,
        ServerType::Fabric,
    ];
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerType::Vanilla => write!(f, "vanilla"),
            ServerType::Snapshot => write!(f, "snapshot"),
            ServerType::Paper => write!(f, "paper"),
            ServerType::Fabric => write!(f, "fabric"),
        }
    }
}

impl std::str::FromStr for ServerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vanilla" => Ok(ServerType::Vanilla),
            "snapshot" => Ok(ServerType::Snapshot),
            "paper" => Ok(ServerType::Paper),
            "fabric" => Ok(ServerType::Fabric),
            other => Err(format!("unknown server type: {other}")),
        }
    }
}

/// Full server instance representation persisted to disk as `server.json`.
///
/// Each instance has its own folder under `servers/<name>/` holding the
/// server jar, `eula.txt`, `server.properties`, world data, and this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInstance {
    pub name: String,
    pub path: PathBuf,
    pub server_type: ServerType,
    pub minecraft_version: String,
    pub jar_name: String,
    /// TCP port the server listens on. Fixed for the lifetime of a run.
    pub port: u16,
    pub created_at: DateTime<Utc>,
    pub last_started: Option<DateTime<Utc>>,
}

/// Default Minecraft server port.
pub const DEFAULT_PORT: u16 = 25565;

impl ServerInstance {
    pub fn new(
        name: String,
        server_type: ServerType,
        minecraft_version: String,
        port: u16,
        base_dir: &std::path::Path,
    ) -> Self {
        let path = base_dir.join(&name);
        Self {
            name,
            path,
            server_type,
            minecraft_version,
            jar_name: server_type.jar_name().to_string(),
            port,
            created_at: Utc::now(),
            last_started: None,
        }
    }

    /// Absolute path to the server jar the supervisor launches.
    pub fn jar_path(&self) -> PathBuf {
        self.path.join(&self.jar_name)
    }

    /// Path to the persisted metadata file.
    pub fn config_path(&self) -> PathBuf {
        self.path.join("server.json")
    }
}
