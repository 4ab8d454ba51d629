//! User endpoint: circuit builder on the sending side, recipient on the other.

use crate::config::RouterConfig;
use crate::error::{Result, RoutingError};
use crate::onion::{build_onion, select_circuit};
use crate::transport::traits::{DirectoryApi, Network};
use crate::transport::with_hop_timeout;
use crate::types::{Circuit, NodeRecord, SendReceipt, UserId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Last-seen values of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserState {
    pub last_received: Option<String>,
    pub last_sent: Option<String>,
    pub last_circuit: Option<Circuit>,
}

pub struct UserEndpoint {
    user_id: UserId,
    config: RouterConfig,
    directory: Arc<dyn DirectoryApi>,
    network: Arc<dyn Network>,
    state: RwLock<UserState>,
}

impl UserEndpoint {
    pub fn new(
        user_id: UserId,
        config: RouterConfig,
        directory: Arc<dyn DirectoryApi>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            user_id,
            config,
            directory,
            network,
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> &'static str {
        "live"
    }

    pub fn state(&self) -> UserState {
        self.state.read().clone()
    }

    /// Accepts final plaintext from an exit relay.
    pub fn receive_message(&self, message: String) {
        info!(user_id = %self.user_id, "Message received");
        self.state.write().last_received = Some(message);
    }

    /// Sends `plaintext` to `destination` over a freshly drawn random circuit.
    ///
    /// `last_sent` is recorded before any network call and `last_circuit` as
    /// soon as the circuit is built, so a failed send still shows the attempt.
    pub async fn send_message(&self, plaintext: &str, destination: UserId) -> Result<SendReceipt> {
        self.state.write().last_sent = Some(plaintext.to_string());
        let nodes = with_hop_timeout(
            self.config.hop_timeout(),
            "directory listing",
            self.directory.list_nodes(),
        )
        .await?;

        let route = {
            let mut rng = rand::thread_rng();
            select_circuit(&nodes, self.config.circuit_length, &mut rng)?
        };
        self.submit(&route, plaintext, destination).await
    }

    /// Sends over a caller-chosen circuit; keys are still read from the directory.
    pub async fn send_over_circuit(
        &self,
        plaintext: &str,
        destination: UserId,
        circuit: &Circuit,
    ) -> Result<SendReceipt> {
        self.state.write().last_sent = Some(plaintext.to_string());
        let mut route = Vec::with_capacity(circuit.len());
        for &node_id in circuit.nodes() {
            let public_key = with_hop_timeout(
                self.config.hop_timeout(),
                "public key lookup",
                self.directory.get_public_key(node_id),
            )
            .await?;
            route.push(NodeRecord {
                node_id,
                public_key,
            });
        }
        self.submit(&route, plaintext, destination).await
    }

    async fn submit(
        &self,
        route: &[NodeRecord],
        plaintext: &str,
        destination: UserId,
    ) -> Result<SendReceipt> {
        let (envelope, circuit) = build_onion(route, plaintext.as_bytes(), destination)?;
        let entry = circuit.entry();
        self.state.write().last_circuit = Some(circuit.clone());
        debug!(user_id = %self.user_id, circuit = %circuit, "Submitting envelope");

        with_hop_timeout(
            self.config.hop_timeout(),
            "submission",
            self.network.route_envelope(entry, envelope),
        )
        .await
        .map_err(|e| {
            warn!(user_id = %self.user_id, entry = %entry, error = %e, "Send failed");
            RoutingError::MessageSendFailed(format!("entry relay {entry}: {e}"))
        })?;

        info!(user_id = %self.user_id, destination = %destination, hops = circuit.len(), "Message sent");
        Ok(SendReceipt { circuit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Directory;
    use crate::transport::traits::NodeRegistration;
    use crate::types::{Envelope, NodeId};
    use async_trait::async_trait;
    use onionnet_crypto::KeyPair;
    use tokio_test::{assert_err, assert_ok, block_on};

    /// Accepts every submission without routing it.
    #[derive(Default)]
    struct SinkNetwork {
        entries: parking_lot::Mutex<Vec<(NodeId, Envelope)>>,
    }

    #[async_trait]
    impl Network for SinkNetwork {
        async fn route_envelope(&self, node_id: NodeId, envelope: Envelope) -> Result<()> {
            self.entries.lock().push((node_id, envelope));
            Ok(())
        }

        async fn deliver_message(&self, _: UserId, _: String) -> Result<()> {
            Ok(())
        }
    }

    struct RejectingNetwork;

    #[async_trait]
    impl Network for RejectingNetwork {
        async fn route_envelope(&self, node_id: NodeId, _: Envelope) -> Result<()> {
            Err(RoutingError::TransportFailure(format!("relay {node_id} unreachable")))
        }

        async fn deliver_message(&self, user_id: UserId, _: String) -> Result<()> {
            Err(RoutingError::TransportFailure(format!("user {user_id} unreachable")))
        }
    }

    fn endpoint(relays: u32, network: Arc<SinkNetwork>) -> UserEndpoint {
        let directory = Arc::new(Directory::default());
        for id in 0..relays {
            let pair = KeyPair::generate();
            directory
                .register_node(NodeRegistration::new(NodeId(id), pair.public))
                .unwrap();
        }
        UserEndpoint::new(UserId(0), RouterConfig::default(), directory, network)
    }

    #[test]
    fn receive_only_touches_last_received() {
        let user = endpoint(0, Arc::new(SinkNetwork::default()));
        user.receive_message("first".to_string());
        user.receive_message("second".to_string());

        let state = user.state();
        assert_eq!(state.last_received.as_deref(), Some("second"));
        assert_eq!(state.last_sent, None);
        assert_eq!(state.last_circuit, None);
    }

    #[test]
    fn submission_goes_to_the_circuit_entry() {
        let network = Arc::new(SinkNetwork::default());
        let user = endpoint(5, network.clone());

        let receipt = assert_ok!(block_on(user.send_message("hi", UserId(3))));
        let entries = network.entries.lock();
        assert_eq!(entries.len(), 1);
        let (entry, envelope) = &entries[0];
        assert_eq!(*entry, receipt.circuit.entry());
        assert_eq!(envelope.exit_node, receipt.circuit.exit());
        assert_eq!(envelope.next_hop, Some(receipt.circuit.nodes()[1]));
        assert_eq!(envelope.destination_user_id, UserId(3));
        assert_eq!(user.state().last_circuit, Some(receipt.circuit.clone()));
    }

    #[test]
    fn failed_submission_keeps_the_attempt() {
        let network = Arc::new(SinkNetwork::default());
        let user = endpoint(3, network);
        let stranded = UserEndpoint::new(
            UserId(1),
            RouterConfig::default(),
            user.directory.clone(),
            Arc::new(RejectingNetwork),
        );

        let err = assert_err!(block_on(stranded.send_message("attempted", UserId(9))));
        assert!(matches!(err, RoutingError::MessageSendFailed(_)));

        let state = stranded.state();
        assert_eq!(state.last_sent.as_deref(), Some("attempted"));
        assert_eq!(state.last_circuit.map(|c| c.len()), Some(3));
    }

    #[test]
    fn zero_length_circuit_is_a_config_error() {
        let network = Arc::new(SinkNetwork::default());
        let directory = Arc::new(Directory::default());
        let user = UserEndpoint::new(
            UserId(0),
            RouterConfig::default().with_circuit_length(0),
            directory,
            network.clone(),
        );
        let err = assert_err!(block_on(user.send_message("hi", UserId(1))));
        assert!(matches!(err, RoutingError::InvalidConfig(_)));
        assert!(network.entries.lock().is_empty());
    }
}
