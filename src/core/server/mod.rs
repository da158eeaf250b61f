pub mod jvm;
pub mod supervisor;

pub use jvm::JvmOptions;
pub use supervisor::{ServerProcess, ServerProcessSupervisor, READY_MARKER};
