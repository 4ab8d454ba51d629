//! Core routing types

use crate::error::{Result, RoutingError};
use onionnet_crypto::encoding::serde_base64;
use onionnet_crypto::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Relay identifier, assigned at registration
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User endpoint identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Directory entry for one relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "nodeId")]
    pub node_id: NodeId,
    #[serde(rename = "pubKey")]
    pub public_key: PublicKey,
}

/// Ordered relays a message traverses; the last one is the exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NodeId>", into = "Vec<NodeId>")]
pub struct Circuit {
    nodes: Vec<NodeId>,
}

impl Circuit {
    /// Builds a circuit, rejecting empty paths and repeated relays.
    pub fn new(nodes: Vec<NodeId>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(RoutingError::InvalidRouting("circuit has no relays".to_string()));
        }
        let mut seen = HashSet::with_capacity(nodes.len());
        if let Some(dup) = nodes.iter().find(|id| !seen.insert(**id)) {
            return Err(RoutingError::InvalidRouting(format!(
                "relay {dup} appears twice in circuit"
            )));
        }
        Ok(Self { nodes })
    }

    pub fn entry(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn exit(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TryFrom<Vec<NodeId>> for Circuit {
    type Error = RoutingError;

    fn try_from(nodes: Vec<NodeId>) -> Result<Self> {
        Self::new(nodes)
    }
}

impl From<Circuit> for Vec<NodeId> {
    fn from(circuit: Circuit) -> Self {
        circuit.nodes
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self.nodes.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", hops.join(" -> "))
    }
}

/// Wire unit exchanged between hops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Layer sealed for the receiving relay
    #[serde(with = "serde_base64")]
    pub ciphertext: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<NodeId>,
    pub exit_node: NodeId,
    pub destination_user_id: UserId,
}

impl Envelope {
    pub fn is_exit_for(&self, node: NodeId) -> bool {
        self.exit_node == node
    }
}

/// What a relay did with an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RouteOutcome {
    Forwarded {
        #[serde(rename = "nextHop")]
        next_hop: NodeId,
    },
    Delivered {
        #[serde(rename = "userId")]
        user: UserId,
    },
}

/// Sender-side result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub circuit: Circuit,
}
