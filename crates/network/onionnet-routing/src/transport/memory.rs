//! In-process transport for tests and single-binary deployments.

use crate::error::{Result, RoutingError};
use crate::relay::RelayNode;
use crate::transport::traits::Network;
use crate::types::{Envelope, NodeId, UserId};
use crate::user::UserEndpoint;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Dispatches calls straight to attached relays and user endpoints.
///
/// Services attached here usually hold an `Arc` of the same network, which
/// forms a reference cycle. Call [`MemoryNetwork::detach_all`] when tearing a
/// long-lived network down.
pub struct MemoryNetwork {
    relays: RwLock<HashMap<NodeId, Arc<RelayNode>>>,
    users: RwLock<HashMap<UserId, Arc<UserEndpoint>>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self {
            relays: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn attach_relay(&self, relay: Arc<RelayNode>) {
        info!(node_id = %relay.node_id(), "Relay attached to memory network");
        self.relays.write().insert(relay.node_id(), relay);
    }

    pub fn attach_user(&self, user: Arc<UserEndpoint>) {
        info!(user_id = %user.user_id(), "User attached to memory network");
        self.users.write().insert(user.user_id(), user);
    }

    /// Takes a relay offline; later calls to it fail as unreachable.
    pub fn detach_relay(&self, node_id: NodeId) -> Option<Arc<RelayNode>> {
        self.relays.write().remove(&node_id)
    }

    pub fn detach_all(&self) {
        self.relays.write().clear();
        self.users.write().clear();
    }

    fn relay(&self, node_id: NodeId) -> Result<Arc<RelayNode>> {
        self.relays
            .read()
            .get(&node_id)
            .cloned()
            .ok_or_else(|| RoutingError::TransportFailure(format!("relay {node_id} unreachable")))
    }

    fn user(&self, user_id: UserId) -> Result<Arc<UserEndpoint>> {
        self.users
            .read()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RoutingError::TransportFailure(format!("user {user_id} unreachable")))
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for MemoryNetwork {
    async fn route_envelope(&self, node_id: NodeId, envelope: Envelope) -> Result<()> {
        let relay = self.relay(node_id)?;
        debug!(node_id = %node_id, "memory network routing envelope");
        relay.handle_envelope(envelope).await.map(|_| ())
    }

    async fn deliver_message(&self, user_id: UserId, message: String) -> Result<()> {
        let user = self.user(user_id)?;
        user.receive_message(message);
        Ok(())
    }
}
