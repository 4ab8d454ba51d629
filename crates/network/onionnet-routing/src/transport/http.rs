//! HTTP clients for the directory and for relay and user services.

use crate::config::NetworkConfig;
use crate::error::{Result, RoutingError};
use crate::transport::traits::{DirectoryApi, Network, NodeRegistration};
use crate::types::{Envelope, NodeId, NodeRecord, UserId};
use crate::wire::{
    ErrorBody, NodeRegistryBody, PrivateKeyBody, PublicKeyBody, ReceiveMessageBody,
    RegisterNodeBody,
};
use async_trait::async_trait;
use onionnet_crypto::{PrivateKey, PublicKey};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RoutingError::InvalidConfig(format!("Failed to build HTTP client: {e}")))
}

/// Turns a non-success reply back into a typed error where the kind allows it.
async fn remote_error(response: Response, node: Option<NodeId>) -> RoutingError {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.ok();
    let message = body
        .as_ref()
        .map(|b| b.error.clone())
        .unwrap_or_else(|| status.to_string());

    match (body.as_ref().map(|b| b.kind.as_str()), node) {
        (Some("already_registered"), Some(id)) => RoutingError::AlreadyRegistered(id),
        (Some("not_found"), Some(id)) => RoutingError::NotFound(id),
        (Some("escrow_disabled"), _) => RoutingError::EscrowDisabled,
        (Some("decryption_failed"), _) => RoutingError::DecryptionFailed(message),
        (Some("invalid_routing"), _) => RoutingError::InvalidRouting(message),
        (Some("message_send_failed"), _) => RoutingError::MessageSendFailed(message),
        _ => match (status, node) {
            (StatusCode::CONFLICT, Some(id)) => RoutingError::AlreadyRegistered(id),
            (StatusCode::NOT_FOUND, Some(id)) => RoutingError::NotFound(id),
            (StatusCode::FORBIDDEN, _) => RoutingError::EscrowDisabled,
            _ => RoutingError::TransportFailure(format!("{status}: {message}")),
        },
    }
}

/// [`DirectoryApi`] over the directory's HTTP binding.
#[derive(Clone)]
pub struct HttpDirectoryClient {
    base_url: String,
    client: Client,
}

impl HttpDirectoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    pub fn from_config(network: &NetworkConfig, timeout: Duration) -> Result<Self> {
        Self::new(network.registry_url(), timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DirectoryApi for HttpDirectoryClient {
    async fn register_node(&self, registration: NodeRegistration) -> Result<()> {
        let body = RegisterNodeBody::new(
            registration.node_id,
            &registration.public_key,
            registration.private_key.as_ref(),
        );
        let response = self
            .client
            .post(self.url("/registerNode"))
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(remote_error(response, Some(registration.node_id)).await)
        }
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        let response = self.client.get(self.url("/getNodeRegistry")).send().await?;
        if !response.status().is_success() {
            return Err(remote_error(response, None).await);
        }
        let body: NodeRegistryBody = response.json().await?;
        Ok(body.nodes)
    }

    async fn get_public_key(&self, node_id: NodeId) -> Result<PublicKey> {
        let response = self
            .client
            .get(self.url("/getPublicKey"))
            .query(&[("nodeId", node_id.0)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(response, Some(node_id)).await);
        }
        let body: PublicKeyBody = response.json().await?;
        Ok(PublicKey::from_base64(&body.public_key)?)
    }

    async fn get_private_key(&self, node_id: NodeId) -> Result<PrivateKey> {
        let response = self
            .client
            .get(self.url("/getPrivateKey"))
            .query(&[("nodeId", node_id.0)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(response, Some(node_id)).await);
        }
        let body: PrivateKeyBody = response.json().await?;
        Ok(PrivateKey::from_base64(&body.private_key)?)
    }
}

/// [`Network`] that addresses relays and users by the configured port layout.
#[derive(Clone)]
pub struct HttpNetwork {
    layout: NetworkConfig,
    client: Client,
}

impl HttpNetwork {
    pub fn new(layout: NetworkConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            layout,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn route_envelope(&self, node_id: NodeId, envelope: Envelope) -> Result<()> {
        let url = format!("{}/routeMessage", self.layout.relay_url(node_id)?);
        debug!(node_id = %node_id, "POST routeMessage");
        let response = self.client.post(url).json(&envelope).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(remote_error(response, None).await)
        }
    }

    async fn deliver_message(&self, user_id: UserId, message: String) -> Result<()> {
        let url = format!("{}/message", self.layout.user_url(user_id)?);
        debug!(user_id = %user_id, "POST message");
        let response = self
            .client
            .post(url)
            .json(&ReceiveMessageBody { message })
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(remote_error(response, None).await)
        }
    }
}
