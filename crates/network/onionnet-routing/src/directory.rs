//! Relay directory: insert-once registry of node public keys.
//!
//! The directory optionally escrows relay private keys. That mode exists for
//! test and debug deployments only and is off unless
//! [`DirectoryConfig::key_escrow`] is set.

use crate::config::DirectoryConfig;
use crate::error::{Result, RoutingError};
use crate::transport::traits::{DirectoryApi, NodeRegistration};
use crate::types::{NodeId, NodeRecord};
use async_trait::async_trait;
use onionnet_crypto::{PrivateKey, PublicKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Default)]
struct Registry {
    /// Insertion order
    nodes: Vec<NodeRecord>,
    index: HashMap<NodeId, usize>,
    escrow: HashMap<NodeId, PrivateKey>,
}

/// Directory service state. Owned by whoever serves it; there is no global.
pub struct Directory {
    config: DirectoryConfig,
    registry: RwLock<Registry>,
}

impl Directory {
    pub fn new(config: DirectoryConfig) -> Self {
        if config.key_escrow {
            warn!("Directory started with private key escrow enabled");
        }
        Self {
            config,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Liveness check answer.
    pub fn status(&self) -> &'static str {
        "live"
    }

    /// Registers a relay. The existing record wins on a duplicate id.
    pub fn register_node(&self, registration: NodeRegistration) -> Result<()> {
        let NodeRegistration {
            node_id,
            public_key,
            private_key,
        } = registration;

        if private_key.is_some() && !self.config.key_escrow {
            warn!(node_id = %node_id, "Rejected private key: escrow disabled");
            return Err(RoutingError::EscrowDisabled);
        }

        let mut registry = self.registry.write();
        if registry.index.contains_key(&node_id) {
            return Err(RoutingError::AlreadyRegistered(node_id));
        }
        let position = registry.nodes.len();
        registry.nodes.push(NodeRecord {
            node_id,
            public_key,
        });
        registry.index.insert(node_id, position);
        if let Some(key) = private_key {
            registry.escrow.insert(node_id, key);
        }
        drop(registry);

        info!(node_id = %node_id, "Node registered");
        Ok(())
    }

    pub fn list_nodes(&self) -> Vec<NodeRecord> {
        self.registry.read().nodes.clone()
    }

    pub fn get_public_key(&self, node_id: NodeId) -> Result<PublicKey> {
        let registry = self.registry.read();
        registry
            .index
            .get(&node_id)
            .map(|&i| registry.nodes[i].public_key)
            .ok_or(RoutingError::NotFound(node_id))
    }

    pub fn get_private_key(&self, node_id: NodeId) -> Result<PrivateKey> {
        if !self.config.key_escrow {
            return Err(RoutingError::EscrowDisabled);
        }
        self.registry
            .read()
            .escrow
            .get(&node_id)
            .cloned()
            .ok_or(RoutingError::NotFound(node_id))
    }

    pub fn len(&self) -> usize {
        self.registry.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(DirectoryConfig::default())
    }
}

#[async_trait]
impl DirectoryApi for Directory {
    async fn register_node(&self, registration: NodeRegistration) -> Result<()> {
        Directory::register_node(self, registration)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        Ok(Directory::list_nodes(self))
    }

    async fn get_public_key(&self, node_id: NodeId) -> Result<PublicKey> {
        Directory::get_public_key(self, node_id)
    }

    async fn get_private_key(&self, node_id: NodeId) -> Result<PrivateKey> {
        Directory::get_private_key(self, node_id)
    }
}
