//! OpenAPI documentation aggregator, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventrack API",
        version = "0.1.0",
        description = "Asset-management backend: database provisioning and first-run setup.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Setup", description = "Connection test, schema bootstrap, and initial admin creation"),
    ),
    paths(
        crate::api::health::health,
        crate::api::database::status,
        crate::api::database::test_connection,
        crate::api::database::execute_schema,
        crate::api::database::create_admin,
    ),
    components(schemas(
        crate::api::health::HealthResponse,
        inventrack_provisioning::StatusResponse,
        inventrack_provisioning::OperationOutcome,
        inventrack_provisioning::ConnectionSettings,
        inventrack_provisioning::AdminAccountRequest,
        inventrack_provisioning::CreateAdminRequest,
    ))
)]
pub struct ApiDoc;
