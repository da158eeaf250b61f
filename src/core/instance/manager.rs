use std::path::{Path, PathBuf};

use tracing::info;

use super::model::ServerInstance;
use crate::core::error::{ServerError, ServerResult};

/// Manages the on-disk lifecycle of server instances.
pub struct InstanceManager {
    /// Root directory where all server instances live.
    servers_dir: PathBuf,
}

impl InstanceManager {
    pub fn new(servers_dir: PathBuf) -> Self {
        Self { servers_dir }
    }

    /// Default root: `<user data dir>/CraftPort/servers`.
    pub fn default_servers_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("CraftPort")
            .join("servers")
    }

    /// Create a new server instance directory with its boilerplate files:
    /// `eula.txt` (accepted), a minimal `server.properties` with the
    /// configured port, and the persisted `server.json`.
    pub async fn create(&self, mut instance: ServerInstance) -> ServerResult<ServerInstance> {
        instance.path = self.servers_dir.join(&instance.name);

        if instance.config_path().exists() {
            return Err(ServerError::InstanceAlreadyExists(instance.name.clone()));
        }

        tokio::fs::create_dir_all(&instance.path)
            .await
            .map_err(|source| ServerError::Io {
                path: instance.path.clone(),
                source,
            })?;

        // Mojang requires explicit EULA acceptance before the server boots.
        write_file(&instance.path.join("eula.txt"), "eula=true\n").await?;
        write_file(
            &instance.path.join("server.properties"),
            &format!("server-port={}\n", instance.port),
        )
        .await?;

        self.save(&instance).await?;

        info!(
            "Created server '{}' ({} {})",
            instance.name, instance.server_type, instance.minecraft_version
        );
        Ok(instance)
    }

    /// Save instance metadata to disk.
    pub async fn save(&self, instance: &ServerInstance) -> ServerResult<()> {
        let json = serde_json::to_string_pretty(instance)?;
        let config_path = instance.config_path();

        tokio::fs::write(&config_path, json)
            .await
            .map_err(|source| ServerError::Io {
                path: config_path,
                source,
            })?;

        Ok(())
    }

    /// Load a single instance by name.
    pub async fn load(&self, name: &str) -> ServerResult<ServerInstance> {
        let config_path = self.servers_dir.join(name).join("server.json");
        if !config_path.exists() {
            return Err(ServerError::InstanceNotFound(name.to_string()));
        }

        let json = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|source| ServerError::Io {
                path: config_path.clone(),
                source,
            })?;

        let instance: ServerInstance = serde_json::from_str(&json)?;
        Ok(instance)
    }

    /// List all instances under the servers root.
    pub async fn list(&self) -> ServerResult<Vec<ServerInstance>> {
        let mut instances = Vec::new();

        if !self.servers_dir.exists() {
            return Ok(instances);
        }

        let mut entries = tokio::fs::read_dir(&self.servers_dir)
            .await
            .map_err(|source| ServerError::Io {
                path: self.servers_dir.clone(),
                source,
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|source| ServerError::Io {
            path: self.servers_dir.clone(),
            source,
        })? {
            let config_path = entry.path().join("server.json");
            if !config_path.exists() {
                continue;
            }
            match tokio::fs::read_to_string(&config_path).await {
                Ok(json) => match serde_json::from_str::<ServerInstance>(&json) {
                    Ok(inst) => instances.push(inst),
                    Err(e) => {
                        tracing::warn!("Corrupt server.json at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read {:?}: {}", config_path, e);
                }
            }
        }

        Ok(instances)
    }
}

async fn write_file(path: &Path, contents: &str) -> ServerResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ServerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::{ServerType, DEFAULT_PORT};

    fn sample_instance(base: &Path) -> ServerInstance {
        ServerInstance::new(
            "testworld".into(),
            ServerType::Vanilla,
            "1.20.4".into(),
            DEFAULT_PORT,
            base,
        )
    }

    #[tokio::test]
    async fn create_writes_layout_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(tmp.path().to_path_buf());

        let created = manager.create(sample_instance(tmp.path())).await.unwrap();
        assert!(created.path.join("eula.txt").exists());
        assert!(created.path.join("server.properties").exists());

        let eula = std::fs::read_to_string(created.path.join("eula.txt")).unwrap();
        assert_eq!(eula, "eula=true\n");

        let props = std::fs::read_to_string(created.path.join("server.properties")).unwrap();
        assert!(props.contains("server-port=25565"));

        let loaded = manager.load("testworld").await.unwrap();
        assert_eq!(loaded.name, created.name);
        assert_eq!(loaded.server_type, ServerType::Vanilla);
        assert_eq!(loaded.port, DEFAULT_PORT);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_names() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(tmp.path().to_path_buf());

        manager.create(sample_instance(tmp.path())).await.unwrap();
        let err = manager.create(sample_instance(tmp.path())).await.unwrap_err();
        assert!(matches!(err, ServerError::InstanceAlreadyExists(_)));
    }

    #[tokio::test]
    async fn load_missing_instance_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(tmp.path().to_path_buf());
        let err = manager.load("nope").await.unwrap_err();
        assert!(matches!(err, ServerError::InstanceNotFound(_)));
    }

    #[tokio::test]
    async fn list_skips_unrelated_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(tmp.path().to_path_buf());
        std::fs::create_dir_all(tmp.path().join("not-a-server")).unwrap();

        manager.create(sample_instance(tmp.path())).await.unwrap();
        let listed = manager.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "testworld");
    }
}
