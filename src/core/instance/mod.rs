pub mod manager;
pub mod model;

pub use manager::InstanceManager;
pub use model::{ServerInstance, ServerType, DEFAULT_PORT};
