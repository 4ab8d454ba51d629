//! # Onionnet Routing
//!
//! A minimal layered-encryption relay network.
//!
//! - **Directory**: insert-once registry of relay public keys ([`Directory`])
//! - **Relays**: open one layer, then forward or deliver ([`RelayNode`])
//! - **Senders**: pick a random circuit and wrap one layer per hop ([`UserEndpoint`])
//! - **Transports**: in-process ([`MemoryNetwork`]) or JSON over HTTP
//!   ([`HttpNetwork`], [`server`])
//!
//! Each relay learns only the hop it came from and the hop it sends to. The
//! exit relay is the only one that sees the plaintext.
//!
//! ## Example
//!
//! ```rust,no_run
//! use onionnet_routing::{
//!     Directory, KeySource, MemoryNetwork, NodeId, NodeRegistration, RelayNode, RouterConfig,
//!     UserEndpoint, UserId,
//! };
//! use onionnet_crypto::KeyPair;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = Arc::new(Directory::default());
//!     let network = Arc::new(MemoryNetwork::new());
//!
//!     for id in 0..3 {
//!         let pair = KeyPair::generate();
//!         directory.register_node(NodeRegistration::new(NodeId(id), pair.public))?;
//!         network.attach_relay(Arc::new(RelayNode::new(
//!             NodeId(id),
//!             KeySource::Local(pair.private),
//!             directory.clone(),
//!             network.clone(),
//!             RouterConfig::default(),
//!         )));
//!     }
//!
//!     let alice = Arc::new(UserEndpoint::new(
//!         UserId(0), RouterConfig::default(), directory.clone(), network.clone(),
//!     ));
//!     let bob = Arc::new(UserEndpoint::new(
//!         UserId(1), RouterConfig::default(), directory.clone(), network.clone(),
//!     ));
//!     network.attach_user(alice.clone());
//!     network.attach_user(bob.clone());
//!
//!     let receipt = alice.send_message("hello", UserId(1)).await?;
//!     println!("sent over {}", receipt.circuit);
//!     assert_eq!(bob.state().last_received.as_deref(), Some("hello"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod launcher;
pub mod onion;
pub mod relay;
pub mod server;
pub mod transport;
pub mod types;
pub mod user;
pub mod wire;

pub use config::{DirectoryConfig, NetworkConfig, OnionNetConfig, RouterConfig};
pub use directory::Directory;
pub use error::{Result, RoutingError};
pub use launcher::{launch_network, NetworkHandle};
pub use relay::{KeySource, RelayDiagnostics, RelayNode};
pub use transport::{
    DirectoryApi, HttpDirectoryClient, HttpNetwork, MemoryNetwork, Network, NodeRegistration,
};
pub use types::{Circuit, Envelope, NodeId, NodeRecord, RouteOutcome, SendReceipt, UserId};
pub use user::{UserEndpoint, UserState};
