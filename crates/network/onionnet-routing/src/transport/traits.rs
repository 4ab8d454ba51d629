//! Service interfaces shared by the in-memory and HTTP bindings.

use crate::error::Result;
use crate::types::{Envelope, NodeId, NodeRecord, UserId};
use async_trait::async_trait;
use onionnet_crypto::{PrivateKey, PublicKey};

/// A relay asking to be listed in the directory.
#[derive(Debug, Clone)]
pub struct NodeRegistration {
    pub node_id: NodeId,
    pub public_key: PublicKey,
    /// Only accepted by directories running with key escrow enabled
    pub private_key: Option<PrivateKey>,
}

impl NodeRegistration {
    pub fn new(node_id: NodeId, public_key: PublicKey) -> Self {
        Self {
            node_id,
            public_key,
            private_key: None,
        }
    }

    pub fn with_escrowed_key(mut self, private_key: PrivateKey) -> Self {
        self.private_key = Some(private_key);
        self
    }
}

/// Read and registration access to the relay directory.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Inserts a relay; fails with `AlreadyRegistered` if the id is taken.
    async fn register_node(&self, registration: NodeRegistration) -> Result<()>;

    /// Lists relays in registration order.
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>>;

    /// Looks up one relay's public key.
    async fn get_public_key(&self, node_id: NodeId) -> Result<PublicKey>;

    /// Retrieves an escrowed private key.
    async fn get_private_key(&self, node_id: NodeId) -> Result<PrivateKey>;
}

/// Outbound calls a relay or sender makes to other services.
#[async_trait]
pub trait Network: Send + Sync {
    /// Hands an envelope to relay `node_id` and waits for it to accept.
    async fn route_envelope(&self, node_id: NodeId, envelope: Envelope) -> Result<()>;

    /// Delivers final plaintext to user `user_id`.
    async fn deliver_message(&self, user_id: UserId, message: String) -> Result<()>;
}
