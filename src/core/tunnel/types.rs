use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::info;

use crate::core::error::ServerResult;
use crate::core::process::ProcessHandle;

/// Set-once slot the provider's discovery task publishes the public
/// address into. Stays unset if discovery fails; the address is cosmetic
/// and never blocks operation.
pub type AddressSlot = Arc<OnceLock<String>>;

/// A running tunnel process of some provider, with its asynchronously
/// populated public address.
pub struct TunnelProcess {
    provider: &'static str,
    handle: ProcessHandle,
    address: AddressSlot,
}

impl TunnelProcess {
    pub fn new(provider: &'static str, child: tokio::process::Child, address: AddressSlot) -> Self {
        Self {
            provider,
            handle: ProcessHandle::new(child),
            address,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Publicly reachable host:port, once discovered.
    pub fn public_address(&self) -> Option<String> {
        self.address.get().cloned()
    }

    /// Stop the tunnel process. Idempotent.
    pub async fn terminate(&mut self) {
        info!("Stopping {} tunnel", self.provider);
        self.handle.terminate().await;
    }
}

/// A tunnel provider: starts the provider binary and discovers the public
/// address it exposes, each in its own provider-specific way. The
/// orchestrator never branches on provider identity.
#[async_trait]
pub trait TunnelHandle: Send + Sync {
    fn name(&self) -> &'static str;

    /// Spawn the tunnel process. Address discovery runs detached and never
    /// blocks the caller; the server launches right after this returns.
    async fn start(&self) -> ServerResult<TunnelProcess>;
}
