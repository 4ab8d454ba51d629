use super::status;
use crate::directory::Directory;
use crate::error::Result;
use crate::transport::traits::NodeRegistration;
use crate::wire::{
    NodeIdQuery, NodeRegistryBody, PrivateKeyBody, PublicKeyBody, RegisterNodeBody, ResultBody,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use onionnet_crypto::{PrivateKey, PublicKey};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn directory_router(directory: Arc<Directory>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/registerNode", post(register_node))
        .route("/getNodeRegistry", get(get_node_registry))
        .route("/getPublicKey", get(get_public_key))
        .route("/getPrivateKey", get(get_private_key))
        .with_state(directory)
        .layer(CorsLayer::permissive())
}

async fn register_node(
    State(directory): State<Arc<Directory>>,
    Json(body): Json<RegisterNodeBody>,
) -> Result<(StatusCode, Json<ResultBody<String>>)> {
    let mut registration =
        NodeRegistration::new(body.node_id, PublicKey::from_base64(&body.pub_key)?);
    if let Some(text) = body.prv_key.as_deref() {
        registration = registration.with_escrowed_key(PrivateKey::from_base64(text)?);
    }
    directory.register_node(registration)?;
    Ok((
        StatusCode::CREATED,
        Json(ResultBody::new(format!("Node {} registered", body.node_id))),
    ))
}

async fn get_node_registry(State(directory): State<Arc<Directory>>) -> Json<NodeRegistryBody> {
    Json(NodeRegistryBody {
        nodes: directory.list_nodes(),
    })
}

async fn get_public_key(
    State(directory): State<Arc<Directory>>,
    Query(query): Query<NodeIdQuery>,
) -> Result<Json<PublicKeyBody>> {
    let key = directory.get_public_key(query.node_id)?;
    Ok(Json(PublicKeyBody {
        public_key: key.to_base64(),
    }))
}

async fn get_private_key(
    State(directory): State<Arc<Directory>>,
    Query(query): Query<NodeIdQuery>,
) -> Result<Json<PrivateKeyBody>> {
    let key = directory.get_private_key(query.node_id)?;
    Ok(Json(PrivateKeyBody {
        private_key: key.to_base64(),
    }))
}
