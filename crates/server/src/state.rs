use inventrack_core::Config;
use inventrack_provisioning::{ConnectionManager, ProvisioningGateway};

pub struct AppState {
    pub gateway: ProvisioningGateway,
    /// Same handle the gateway's components share; exposed for health and shutdown.
    pub connections: ConnectionManager,
    pub config: Config,
}
