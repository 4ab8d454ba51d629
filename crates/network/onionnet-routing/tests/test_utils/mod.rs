//! Common test utilities and helpers.

#![allow(dead_code)]

use onionnet_crypto::KeyPair;
use onionnet_routing::{
    Directory, DirectoryConfig, KeySource, MemoryNetwork, NodeId, NodeRegistration, RelayNode,
    RouterConfig, UserEndpoint, UserId,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize test logging
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("onionnet_routing=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

/// Directory, relays and users wired over one [`MemoryNetwork`].
pub struct MemoryMesh {
    pub directory: Arc<Directory>,
    pub network: Arc<MemoryNetwork>,
    pub relays: Vec<Arc<RelayNode>>,
    pub keys: Vec<KeyPair>,
    pub config: RouterConfig,
}

impl MemoryMesh {
    pub fn new(relays: u32) -> Self {
        Self::with_config(relays, RouterConfig::default(), DirectoryConfig::default())
    }

    pub fn with_config(relays: u32, config: RouterConfig, directory: DirectoryConfig) -> Self {
        init_test_logging();
        let escrow = directory.key_escrow;
        let directory = Arc::new(Directory::new(directory));
        let network = Arc::new(MemoryNetwork::new());
        let mut mesh = Self {
            directory,
            network,
            relays: Vec::new(),
            keys: Vec::new(),
            config,
        };
        for id in 0..relays {
            mesh.add_relay(NodeId(id), escrow);
        }
        mesh
    }

    pub fn add_relay(&mut self, node_id: NodeId, escrow: bool) -> Arc<RelayNode> {
        let pair = KeyPair::generate();
        let mut registration = NodeRegistration::new(node_id, pair.public);
        let key = if escrow {
            registration = registration.with_escrowed_key(pair.private.clone());
            KeySource::Escrow
        } else {
            KeySource::Local(pair.private.clone())
        };
        self.directory.register_node(registration).unwrap();

        let relay = Arc::new(RelayNode::new(
            node_id,
            key,
            self.directory.clone(),
            self.network.clone(),
            self.config.clone(),
        ));
        self.network.attach_relay(relay.clone());
        self.relays.push(relay.clone());
        self.keys.push(pair);
        relay
    }

    pub fn add_user(&self, user_id: UserId) -> Arc<UserEndpoint> {
        let user = Arc::new(UserEndpoint::new(
            user_id,
            self.config.clone(),
            self.directory.clone(),
            self.network.clone(),
        ));
        self.network.attach_user(user.clone());
        user
    }

    pub fn relay(&self, node_id: NodeId) -> &Arc<RelayNode> {
        self.relays
            .iter()
            .find(|r| r.node_id() == node_id)
            .expect("relay in mesh")
    }
}

impl Drop for MemoryMesh {
    fn drop(&mut self) {
        self.network.detach_all();
    }
}
