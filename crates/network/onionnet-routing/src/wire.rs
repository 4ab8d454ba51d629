//! JSON bodies of the HTTP binding

use crate::types::{Circuit, NodeId, NodeRecord, UserId};
use onionnet_crypto::{PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeBody {
    pub node_id: NodeId,
    pub pub_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prv_key: Option<String>,
}

impl RegisterNodeBody {
    pub fn new(node_id: NodeId, public_key: &PublicKey, private_key: Option<&PrivateKey>) -> Self {
        Self {
            node_id,
            pub_key: public_key.to_base64(),
            prv_key: private_key.map(PrivateKey::to_base64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistryBody {
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyBody {
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateKeyBody {
    pub private_key: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdQuery {
    pub node_id: NodeId,
}

/// `{result}` wrapper used by every acknowledgement and diagnostic endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody<T> {
    pub result: T,
}

impl<T> ResultBody<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Error reply; `kind` is [`crate::RoutingError::kind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveMessageBody {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub message: String,
    pub destination_user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub result: String,
    pub circuit: Circuit,
}
