use bank_connector::registry::ConnectorRegistry;

use std::sync::Arc;

/// Shared handler state, cloned into every request.
#[derive(Clone)]
pub struct GatewayState {
    registry: Arc<ConnectorRegistry>,
}

impl GatewayState {
    pub fn new(registry: ConnectorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }
}
