//! Decrypt-and-forward relay.
//!
//! A relay opens the one layer sealed for it and then either forwards the
//! inner layer to the next hop or, as exit, delivers the plaintext to the
//! destination user. Every check runs before the single outbound call, so a
//! rejected envelope is never partially forwarded.

use crate::config::RouterConfig;
use crate::error::{Result, RoutingError};
use crate::onion::open_layer;
use crate::transport::traits::{DirectoryApi, Network};
use crate::transport::with_hop_timeout;
use crate::types::{Envelope, NodeId, RouteOutcome};
use onionnet_crypto::{encoding, PrivateKey};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a relay's private key lives.
#[derive(Clone)]
pub enum KeySource {
    /// Held by the relay; the normal deployment.
    Local(PrivateKey),
    /// Fetched from an escrow-enabled directory on every envelope.
    Escrow,
}

/// Last-seen values, for debugging only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayDiagnostics {
    /// Base64 of the last layer received
    pub last_encrypted: Option<String>,
    /// Exit plaintext, or base64 of the inner layer for a middle relay
    pub last_decrypted: Option<String>,
    pub last_destination: Option<RouteOutcome>,
}

pub struct RelayNode {
    node_id: NodeId,
    key: KeySource,
    directory: Arc<dyn DirectoryApi>,
    network: Arc<dyn Network>,
    config: RouterConfig,
    diagnostics: RwLock<RelayDiagnostics>,
}

impl RelayNode {
    pub fn new(
        node_id: NodeId,
        key: KeySource,
        directory: Arc<dyn DirectoryApi>,
        network: Arc<dyn Network>,
        config: RouterConfig,
    ) -> Self {
        Self {
            node_id,
            key,
            directory,
            network,
            config,
            diagnostics: RwLock::new(RelayDiagnostics::default()),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Liveness check answer.
    pub fn status(&self) -> &'static str {
        "live"
    }

    /// Snapshot of the last-seen values.
    pub fn diagnostics(&self) -> RelayDiagnostics {
        self.diagnostics.read().clone()
    }

    /// Peels one layer and forwards or delivers. Returns once the next hop or
    /// the recipient accepted the call.
    ///
    /// A downstream failure is reported as this hop's transport failure and
    /// carries only the kind of the error seen, not its text.
    pub async fn handle_envelope(&self, envelope: Envelope) -> Result<RouteOutcome> {
        let key = self.private_key().await?;
        let content = open_layer(&key, &envelope.ciphertext).map_err(|e| {
            warn!(node_id = %self.node_id, error = %e, "Failed to open layer");
            e
        })?;

        if envelope.is_exit_for(self.node_id) {
            let user = envelope.destination_user_id;
            let message = String::from_utf8(content.payload).map_err(|_| {
                warn!(node_id = %self.node_id, "Exit payload is not UTF-8");
                RoutingError::DecryptionFailed("exit payload is not valid UTF-8".to_string())
            })?;
            let outcome = RouteOutcome::Delivered { user };
            self.record(&envelope.ciphertext, message.clone(), outcome);

            with_hop_timeout(
                self.config.hop_timeout(),
                "delivery",
                self.network.deliver_message(user, message),
            )
            .await
            .map_err(|e| {
                warn!(node_id = %self.node_id, user_id = %user, error = %e, "Delivery failed");
                RoutingError::TransportFailure(format!("delivery to user {user} failed: {}", e.kind()))
            })?;

            info!(node_id = %self.node_id, user_id = %user, "Delivered message as exit");
            return Ok(outcome);
        }

        let next_hop = self.validate_next_hop(envelope.next_hop).await?;
        let outcome = RouteOutcome::Forwarded { next_hop };
        self.record(&envelope.ciphertext, encoding::encode(&content.payload), outcome);

        let forward = Envelope {
            ciphertext: content.payload,
            next_hop: content.onward_hop,
            exit_node: envelope.exit_node,
            destination_user_id: envelope.destination_user_id,
        };
        with_hop_timeout(
            self.config.hop_timeout(),
            "forward",
            self.network.route_envelope(next_hop, forward),
        )
        .await
        .map_err(|e| {
            warn!(node_id = %self.node_id, next_hop = %next_hop, error = %e, "Forward failed");
            RoutingError::TransportFailure(format!("hop {next_hop} failed: {}", e.kind()))
        })?;

        debug!(node_id = %self.node_id, next_hop = %next_hop, "Forwarded envelope");
        Ok(outcome)
    }

    async fn private_key(&self) -> Result<PrivateKey> {
        match &self.key {
            KeySource::Local(key) => Ok(key.clone()),
            KeySource::Escrow => {
                with_hop_timeout(
                    self.config.hop_timeout(),
                    "escrow lookup",
                    self.directory.get_private_key(self.node_id),
                )
                .await
            }
        }
    }

    async fn validate_next_hop(&self, next_hop: Option<NodeId>) -> Result<NodeId> {
        let next_hop = next_hop.ok_or_else(|| {
            RoutingError::InvalidRouting(format!(
                "relay {} is not the exit but envelope has no next hop",
                self.node_id
            ))
        })?;
        if next_hop == self.node_id {
            return Err(RoutingError::InvalidRouting(format!(
                "relay {next_hop} is not the exit but names itself as next hop"
            )));
        }

        let lookup = with_hop_timeout(
            self.config.hop_timeout(),
            "directory lookup",
            self.directory.get_public_key(next_hop),
        )
        .await;
        match lookup {
            Ok(_) => Ok(next_hop),
            Err(RoutingError::NotFound(id)) => {
                warn!(node_id = %self.node_id, next_hop = %id, "Next hop is not registered");
                Err(RoutingError::InvalidRouting(format!("next hop {id} is not registered")))
            }
            Err(e) => Err(e),
        }
    }

    fn record(&self, received: &[u8], decrypted: String, destination: RouteOutcome) {
        let mut diagnostics = self.diagnostics.write();
        diagnostics.last_encrypted = Some(encoding::encode(received));
        diagnostics.last_decrypted = Some(decrypted);
        diagnostics.last_destination = Some(destination);
    }
}
