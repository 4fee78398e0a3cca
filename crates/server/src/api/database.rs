//! Setup wizard endpoints.
//!
//! Every POST answers `{success, message}`: 200 on success, 400 otherwise.
//! Malformed bodies get the same shape instead of axum's plain-text rejection.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use inventrack_provisioning::{
    ConnectionSettings, CreateAdminRequest, OperationOutcome, StatusResponse,
};

use crate::state::AppState;

type OutcomeResponse = (StatusCode, Json<OperationOutcome>);

fn respond(outcome: OperationOutcome) -> OutcomeResponse {
    let code = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (code, Json(outcome))
}

fn rejected(rejection: JsonRejection) -> OutcomeResponse {
    debug!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(OperationOutcome::fail(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    )
}

/// Whether setup has been completed on this instance.
#[utoipa::path(
    get,
    path = "/status",
    tag = "Setup",
    responses(
        (status = 200, description = "Configuration status", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(state.gateway.status())
}

/// Try the supplied connection settings without keeping the connection.
#[utoipa::path(
    post,
    path = "/database/test-connection",
    tag = "Setup",
    request_body = ConnectionSettings,
    responses(
        (status = 200, description = "Connection succeeded", body = OperationOutcome),
        (status = 400, description = "Invalid settings or connection failed", body = OperationOutcome)
    )
)]
pub async fn test_connection(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConnectionSettings>, JsonRejection>,
) -> OutcomeResponse {
    let Json(settings) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    respond(state.gateway.test_connection(&settings).await)
}

/// Apply the bootstrap schema in a single transaction.
#[utoipa::path(
    post,
    path = "/database/execute-schema",
    tag = "Setup",
    request_body = ConnectionSettings,
    responses(
        (status = 200, description = "Schema created", body = OperationOutcome),
        (status = 400, description = "Schema could not be applied; nothing was changed", body = OperationOutcome)
    )
)]
pub async fn execute_schema(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConnectionSettings>, JsonRejection>,
) -> OutcomeResponse {
    let Json(settings) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    respond(state.gateway.execute_schema(&settings).await)
}

/// Create the first admin account and mark the instance configured.
#[utoipa::path(
    post,
    path = "/database/create-admin",
    tag = "Setup",
    request_body = CreateAdminRequest,
    responses(
        (status = 200, description = "Admin created and configuration saved", body = OperationOutcome),
        (status = 400, description = "Missing schema, duplicate account, or invalid input", body = OperationOutcome)
    )
)]
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAdminRequest>, JsonRejection>,
) -> OutcomeResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => return rejected(rejection),
    };
    respond(state.gateway.create_admin(&request).await)
}
