//! Routing error types

use crate::types::NodeId;
use axum::http::StatusCode;
use onionnet_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Node {0} is already registered")]
    AlreadyRegistered(NodeId),

    #[error("Node {0} not found")]
    NotFound(NodeId),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid routing: {0}")]
    InvalidRouting(String),

    #[error("Not enough relays: {available} available, circuit needs {required}")]
    NoRelaysAvailable { available: usize, required: usize },

    #[error("Message send failed: {0}")]
    MessageSendFailed(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Private key escrow is disabled on this directory")]
    EscrowDisabled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoutingError {
    /// Stable label used in logs and error bodies; never carries message content.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingError::AlreadyRegistered(_) => "already_registered",
            RoutingError::NotFound(_) => "not_found",
            RoutingError::DecryptionFailed(_) => "decryption_failed",
            RoutingError::InvalidRouting(_) => "invalid_routing",
            RoutingError::NoRelaysAvailable { .. } => "no_relays_available",
            RoutingError::MessageSendFailed(_) => "message_send_failed",
            RoutingError::TransportFailure(_) => "transport_failure",
            RoutingError::EscrowDisabled => "escrow_disabled",
            RoutingError::InvalidConfig(_) => "invalid_config",
            RoutingError::Serialization(_) => "serialization",
            RoutingError::Crypto(_) => "crypto",
            RoutingError::Io(_) => "io",
        }
    }

    /// HTTP status used when the error is returned by a service.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoutingError::AlreadyRegistered(_) => StatusCode::CONFLICT,
            RoutingError::NotFound(_) => StatusCode::NOT_FOUND,
            RoutingError::EscrowDisabled => StatusCode::FORBIDDEN,
            RoutingError::DecryptionFailed(_)
            | RoutingError::InvalidRouting(_)
            | RoutingError::Serialization(_)
            | RoutingError::Crypto(_) => StatusCode::BAD_REQUEST,
            RoutingError::NoRelaysAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RoutingError::MessageSendFailed(_) | RoutingError::TransportFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            RoutingError::InvalidConfig(_) | RoutingError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<bincode::Error> for RoutingError {
    fn from(err: bincode::Error) -> Self {
        RoutingError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::TransportFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
