// ─── CLI ───
// Command definitions and the interactive glue around the core: prompts
// for anything not given as a flag, then hands resolved values to the
// provisioning and orchestration code.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use tracing::{info, warn};

use crate::core::downloader::Downloader;
use crate::core::error::{ServerError, ServerResult};
use crate::core::http::build_http_client;
use crate::core::instance::{InstanceManager, ServerInstance, ServerType, DEFAULT_PORT};
use crate::core::server::ServerProcessSupervisor;
use crate::core::session::Orchestrator;
use crate::core::tunnel;
use crate::core::version::{self, VersionManifest};

#[derive(Parser)]
#[command(
    name = "craftport",
    version,
    about = "Provision dedicated Minecraft servers and expose them through public tunnels"
)]
pub struct Cli {
    /// Root directory for server instances (default: user data dir).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a server instance: resolve and download the jar, lay out the
    /// server directory.
    Create {
        /// Instance name (prompted when omitted).
        name: Option<String>,
        /// Server flavor: vanilla, snapshot, paper, or fabric.
        #[arg(long = "type")]
        server_type: Option<String>,
        /// Minecraft version, e.g. 1.20.4 (prompted when omitted).
        #[arg(long)]
        version: Option<String>,
        /// TCP port the server will listen on.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Run a server instance, optionally behind a public tunnel.
    Run {
        /// Instance name (prompted when omitted).
        name: Option<String>,
        /// Tunnel provider (ngrok, playit) or "none". Prompted when
        /// omitted and at least one provider is installed.
        #[arg(long)]
        tunnel: Option<String>,
    },
    /// List locally created server instances.
    List,
    /// List available Minecraft release versions.
    Versions,
}

pub async fn execute(cli: Cli) -> ServerResult<()> {
    let servers_dir = cli
        .dir
        .unwrap_or_else(InstanceManager::default_servers_dir);
    let manager = InstanceManager::new(servers_dir);

    match cli.command {
        Commands::Create {
            name,
            server_type,
            version,
            port,
        } => create(&manager, name, server_type, version, port).await,
        Commands::Run { name, tunnel } => run(&manager, name, tunnel).await,
        Commands::List => list(&manager).await,
        Commands::Versions => versions().await,
    }
}

async fn create(
    manager: &InstanceManager,
    name: Option<String>,
    server_type: Option<String>,
    version: Option<String>,
    port: u16,
) -> ServerResult<()> {
    let client = build_http_client()?;

    let name = match name {
        Some(name) => name,
        None => {
            let name: String = Input::new()
                .with_prompt("Server name")
                .interact_text()
                .map_err(|e| ServerError::Other(e.to_string()))?;
            name
        }
    };

    let server_type = match server_type {
        Some(raw) => ServerType::from_str(&raw).map_err(ServerError::Other)?,
        None => prompt_server_type()?,
    };

    let manifest = VersionManifest::fetch(&client).await?;
    let version = match version {
        Some(version) => version,
        None => {
            let version: String = Input::new()
                .with_prompt("Minecraft version")
                .default(manifest.latest.release.clone())
                .interact_text()
                .map_err(|e| ServerError::Other(e.to_string()))?;
            version
        }
    };

    let resolved = version::resolve_download_url(&client, server_type, &version).await?;

    let instance = manager
        .create(ServerInstance::new(
            name,
            server_type,
            resolved.version.clone(),
            port,
            std::path::Path::new("."),
        ))
        .await?;

    let downloader = Downloader::new(client);
    downloader
        .download_file(&resolved.url, &instance.jar_path(), resolved.sha1.as_deref())
        .await?;

    info!(
        "Server '{}' is ready: {} {} in {:?}",
        instance.name, instance.server_type, instance.minecraft_version, instance.path
    );
    Ok(())
}

async fn run(
    manager: &InstanceManager,
    name: Option<String>,
    tunnel_choice: Option<String>,
) -> ServerResult<()> {
    let name = match name {
        Some(name) => name,
        None => prompt_instance_name(manager).await?,
    };
    let mut instance = manager.load(&name).await?;

    let tunnel = select_tunnel(tunnel_choice, instance.port)?;

    instance.last_started = Some(chrono::Utc::now());
    manager.save(&instance).await?;

    let supervisor = ServerProcessSupervisor::new(instance.port);
    let orchestrator = Orchestrator::new(supervisor);
    let status = orchestrator
        .run(tunnel.as_deref(), &instance.jar_path(), &instance.path)
        .await?;

    info!("Session for '{}' finished ({status})", instance.name);
    Ok(())
}

/// Resolve the tunnel choice to a handle. An empty registry or an
/// uninstalled provider downgrades to "no tunnel" with a warning; only an
/// explicit `--tunnel none` skips the prompt silently.
fn select_tunnel(
    choice: Option<String>,
    port: u16,
) -> ServerResult<Option<Box<dyn tunnel::TunnelHandle>>> {
    let providers = tunnel::available_providers();

    if let Some(choice) = choice {
        if choice.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        return match tunnel::provider_by_name(&providers, &choice) {
            Some(provider) => Ok(Some(provider.build(port))),
            None => {
                warn!("Tunnel provider '{choice}' is not installed; running without a tunnel");
                Ok(None)
            }
        };
    }

    if providers.is_empty() {
        tunnel::warn_no_providers();
        return Ok(None);
    }

    let mut items: Vec<String> = providers.iter().map(|p| p.name.to_string()).collect();
    items.push("no tunnel".into());
    let selection = Select::new()
        .with_prompt("Expose the server through")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| ServerError::Other(e.to_string()))?;

    Ok(providers.get(selection).map(|p| p.build(port)))
}

fn prompt_server_type() -> ServerResult<ServerType> {
    let items: Vec<String> = ServerType::ALL.iter().map(|t| t.to_string()).collect();
    let selection = Select::new()
        .with_prompt("Server type")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| ServerError::Other(e.to_string()))?;
    Ok(ServerType::ALL[selection])
}

async fn prompt_instance_name(manager: &InstanceManager) -> ServerResult<String> {
    let instances = manager.list().await?;
    if instances.is_empty() {
        return Err(ServerError::InstanceNotFound(
            "no servers created yet; run `craftport create` first".into(),
        ));
    }

    let items: Vec<String> = instances
        .iter()
        .map(|i| format!("{} ({} {})", i.name, i.server_type, i.minecraft_version))
        .collect();
    let selection = Select::new()
        .with_prompt("Server to run")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| ServerError::Other(e.to_string()))?;
    Ok(instances[selection].name.clone())
}

async fn list(manager: &InstanceManager) -> ServerResult<()> {
    let instances = manager.list().await?;
    if instances.is_empty() {
        println!("No servers created yet.");
        return Ok(());
    }
    for instance in instances {
        println!(
            "{}  {} {}  port {}  {:?}",
            instance.name,
            instance.server_type,
            instance.minecraft_version,
            instance.port,
            instance.path
        );
    }
    Ok(())
}

async fn versions() -> ServerResult<()> {
    let client = build_http_client()?;
    let manifest = VersionManifest::fetch(&client).await?;
    println!("latest release:  {}", manifest.latest.release);
    println!("latest snapshot: {}", manifest.latest.snapshot);
    for entry in manifest.releases() {
        println!("{}", entry.id);
    }
    Ok(())
}
