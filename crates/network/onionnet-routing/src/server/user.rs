use super::status;
use crate::error::Result;
use crate::types::Circuit;
use crate::user::UserEndpoint;
use crate::wire::{ReceiveMessageBody, ResultBody, SendMessageBody, SendMessageResponse};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn user_router(user: Arc<UserEndpoint>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/message", post(receive_message))
        .route("/receiveMessage", post(receive_message))
        .route("/sendMessage", post(send_message))
        .route("/getLastReceivedMessage", get(last_received))
        .route("/getLastSentMessage", get(last_sent))
        .route("/getLastCircuit", get(last_circuit))
        .with_state(user)
        .layer(CorsLayer::permissive())
}

async fn receive_message(
    State(user): State<Arc<UserEndpoint>>,
    Json(body): Json<ReceiveMessageBody>,
) -> Json<ResultBody<&'static str>> {
    user.receive_message(body.message);
    Json(ResultBody::new("success"))
}

async fn send_message(
    State(user): State<Arc<UserEndpoint>>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<SendMessageResponse>> {
    let receipt = user
        .send_message(&body.message, body.destination_user_id)
        .await?;
    Ok(Json(SendMessageResponse {
        result: "success".to_string(),
        circuit: receipt.circuit,
    }))
}

async fn last_received(State(user): State<Arc<UserEndpoint>>) -> Json<ResultBody<Option<String>>> {
    Json(ResultBody::new(user.state().last_received))
}

async fn last_sent(State(user): State<Arc<UserEndpoint>>) -> Json<ResultBody<Option<String>>> {
    Json(ResultBody::new(user.state().last_sent))
}

async fn last_circuit(State(user): State<Arc<UserEndpoint>>) -> Json<ResultBody<Option<Circuit>>> {
    Json(ResultBody::new(user.state().last_circuit))
}
