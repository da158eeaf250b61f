// ─── CraftPort Core ───
// Backend for provisioning and running dedicated Minecraft servers.
//
// Architecture:
//   core/
//     instance/   — Server instance model + on-disk layout manager
//     version/    — Server jar resolution (vanilla, snapshot, paper, fabric)
//     downloader/ — SHA-1 validated jar downloads
//     server/     — JVM options + server process supervisor
//     tunnel/     — Tunnel providers (ngrok, playit.gg) + registry
//     process     — Shared child-process handle (wait/terminate)
//     session     — Orchestration: tunnel + server lifecycle as a unit

pub mod downloader;
pub mod error;
pub mod http;
pub mod instance;
pub mod process;
pub mod server;
pub mod session;
pub mod tunnel;
pub mod version;
