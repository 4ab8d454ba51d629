//! Transport bindings for the directory, relay and user services.
//!
//! [`MemoryNetwork`] wires services together in one process and is what the
//! test suite runs against. [`HttpNetwork`] and [`HttpDirectoryClient`] speak
//! the JSON-over-HTTP binding served by [`crate::server`].

pub mod http;
pub mod memory;
pub mod traits;

pub use http::{HttpDirectoryClient, HttpNetwork};
pub use memory::MemoryNetwork;
pub use traits::{DirectoryApi, Network, NodeRegistration};

use crate::error::{Result, RoutingError};
use std::future::Future;
use std::time::Duration;

/// Bounds one outbound call; expiry surfaces as a transport failure.
pub(crate) async fn with_hop_timeout<T, F>(limit: Duration, what: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| RoutingError::TransportFailure(format!("{what} timed out after {limit:?}")))?
}
