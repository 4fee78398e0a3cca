use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use inventrack_core::ProvisionError;

/// `{success, message}` result returned by every provisioning operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
}

impl OperationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<ProvisionError> for OperationOutcome {
    fn from(e: ProvisionError) -> Self {
        Self::fail(e.to_string())
    }
}
