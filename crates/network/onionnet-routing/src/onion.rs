//! Layered envelope construction and peeling.
//!
//! Each hop's layer seals a [`LayerContent`]: the payload for that hop plus the
//! `next_hop` value the hop must stamp on the envelope it forwards. Relay `i`
//! therefore learns the id of relay `i + 1` (from the envelope it received) and
//! of relay `i + 2` (from its own layer), never the rest of the circuit.
//!
//! A layer small enough for one asymmetric seal is sealed directly. Anything
//! larger is encrypted under a fresh symmetric key which is sealed in its place.

use crate::error::{Result, RoutingError};
use crate::types::{Circuit, Envelope, NodeId, NodeRecord, UserId};
use onionnet_crypto::{PrivateKey, PublicKey, SymmetricCiphertext, SymmetricKey, MAX_SEALED_PAYLOAD};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Plaintext of one layer, as seen by the relay that opens it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerContent {
    /// `next_hop` for the envelope this relay forwards; absent when the
    /// following relay is the exit, or when this relay is the exit
    pub onward_hop: Option<NodeId>,
    /// Sealed layer of the following relay, or the plaintext at the exit
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
enum SealedLayer {
    Direct(Vec<u8>),
    Hybrid {
        wrapped_key: Vec<u8>,
        body: SymmetricCiphertext,
    },
}

/// Seals one layer for `key`, switching to a hybrid layer when needed.
pub fn seal_layer(key: &PublicKey, content: &LayerContent) -> Result<Vec<u8>> {
    let encoded = bincode::serialize(content)?;
    let sealed = if encoded.len() <= MAX_SEALED_PAYLOAD {
        SealedLayer::Direct(key.seal(&encoded)?)
    } else {
        let session = SymmetricKey::generate();
        SealedLayer::Hybrid {
            wrapped_key: key.seal(session.as_bytes())?,
            body: session.encrypt(&encoded)?,
        }
    };
    Ok(bincode::serialize(&sealed)?)
}

/// Opens one layer. Every failure, including a malformed frame, is reported as
/// [`RoutingError::DecryptionFailed`].
pub fn open_layer(key: &PrivateKey, sealed: &[u8]) -> Result<LayerContent> {
    let layer: SealedLayer = bincode::deserialize(sealed)
        .map_err(|e| RoutingError::DecryptionFailed(format!("malformed layer: {e}")))?;

    let encoded = match layer {
        SealedLayer::Direct(ciphertext) => key
            .open(&ciphertext)
            .map_err(|e| RoutingError::DecryptionFailed(e.to_string()))?,
        SealedLayer::Hybrid { wrapped_key, body } => {
            let session = key
                .open(&wrapped_key)
                .and_then(|raw| SymmetricKey::from_bytes(&raw))
                .map_err(|e| RoutingError::DecryptionFailed(format!("session key: {e}")))?;
            session
                .decrypt(&body)
                .map_err(|e| RoutingError::DecryptionFailed(e.to_string()))?
        }
    };

    bincode::deserialize(&encoded)
        .map_err(|e| RoutingError::DecryptionFailed(format!("malformed layer content: {e}")))
}

/// Draws `length` distinct relays uniformly at random.
pub fn select_circuit<R: Rng + ?Sized>(
    nodes: &[NodeRecord],
    length: usize,
    rng: &mut R,
) -> Result<Vec<NodeRecord>> {
    if length == 0 {
        return Err(RoutingError::InvalidConfig(
            "circuit length must be at least 1".to_string(),
        ));
    }
    if nodes.len() < length {
        return Err(RoutingError::NoRelaysAvailable {
            available: nodes.len(),
            required: length,
        });
    }
    Ok(nodes.choose_multiple(rng, length).cloned().collect())
}

/// Wraps `plaintext` once per hop, innermost layer for the exit.
///
/// Returns the envelope to submit to `route[0]` and the circuit it encodes.
pub fn build_onion(
    route: &[NodeRecord],
    plaintext: &[u8],
    destination: UserId,
) -> Result<(Envelope, Circuit)> {
    let circuit = Circuit::new(route.iter().map(|r| r.node_id).collect())?;

    let mut payload = plaintext.to_vec();
    for (i, hop) in route.iter().enumerate().rev() {
        let content = LayerContent {
            onward_hop: route.get(i + 2).map(|r| r.node_id),
            payload,
        };
        payload = seal_layer(&hop.public_key, &content)?;
        debug!(node_id = %hop.node_id, layer_len = payload.len(), "sealed onion layer");
    }

    let envelope = Envelope {
        ciphertext: payload,
        next_hop: route.get(1).map(|r| r.node_id),
        exit_node: circuit.exit(),
        destination_user_id: destination,
    };
    Ok((envelope, circuit))
}
