use super::status;
use crate::error::Result;
use crate::relay::RelayNode;
use crate::types::{Envelope, RouteOutcome};
use crate::wire::ResultBody;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn relay_router(relay: Arc<RelayNode>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/routeMessage", post(route_message))
        .route("/getLastReceivedEncryptedMessage", get(last_encrypted))
        .route("/getLastReceivedDecryptedMessage", get(last_decrypted))
        .route("/getLastMessageDestination", get(last_destination))
        .with_state(relay)
        .layer(CorsLayer::permissive())
}

async fn route_message(
    State(relay): State<Arc<RelayNode>>,
    Json(envelope): Json<Envelope>,
) -> Result<Json<ResultBody<RouteOutcome>>> {
    let outcome = relay.handle_envelope(envelope).await?;
    Ok(Json(ResultBody::new(outcome)))
}

async fn last_encrypted(State(relay): State<Arc<RelayNode>>) -> Json<ResultBody<Option<String>>> {
    Json(ResultBody::new(relay.diagnostics().last_encrypted))
}

async fn last_decrypted(State(relay): State<Arc<RelayNode>>) -> Json<ResultBody<Option<String>>> {
    Json(ResultBody::new(relay.diagnostics().last_decrypted))
}

async fn last_destination(
    State(relay): State<Arc<RelayNode>>,
) -> Json<ResultBody<Option<RouteOutcome>>> {
    Json(ResultBody::new(relay.diagnostics().last_destination))
}
