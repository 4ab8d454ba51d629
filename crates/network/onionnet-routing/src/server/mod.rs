//! axum services for the directory, relays and user endpoints.
//!
//! Each service owns its state through an `Arc` handed to the router; nothing
//! is shared between services except over HTTP.

pub mod directory;
pub mod relay;
pub mod user;

pub use directory::directory_router;
pub use relay::relay_router;
pub use user::user_router;

use crate::error::{Result, RoutingError};
use crate::wire::ErrorBody;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::info;

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Binds `host:port`; port 0 picks a free port.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    info!(address = %listener.local_addr()?, "Listening");
    Ok(listener)
}

/// Serves `router` until the task is dropped or aborted.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router).await?;
    Ok(())
}

async fn status() -> &'static str {
    "live"
}
