//! Starts a complete local network: directory, relays and user endpoints,
//! each served on its own port.

use crate::config::OnionNetConfig;
use crate::directory::Directory;
use crate::error::Result;
use crate::relay::{KeySource, RelayNode};
use crate::server::{bind, directory_router, relay_router, serve, user_router};
use crate::transport::traits::{DirectoryApi, Network, NodeRegistration};
use crate::transport::{HttpDirectoryClient, HttpNetwork};
use crate::types::{NodeId, UserId};
use crate::user::UserEndpoint;
use axum::Router;
use onionnet_crypto::KeyPair;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Running services. Dropping the handle stops every server task.
pub struct NetworkHandle {
    pub directory: Arc<Directory>,
    pub relays: Vec<Arc<RelayNode>>,
    pub users: Vec<Arc<UserEndpoint>>,
    tasks: Vec<JoinHandle<()>>,
}

impl NetworkHandle {
    pub fn relay(&self, node_id: NodeId) -> Option<&Arc<RelayNode>> {
        self.relays.iter().find(|r| r.node_id() == node_id)
    }

    pub fn user(&self, user_id: UserId) -> Option<&Arc<UserEndpoint>> {
        self.users.iter().find(|u| u.user_id() == user_id)
    }

    /// Aborts every server task and waits until each has released its port.
    pub async fn shutdown(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        info!("Network shut down");
    }
}

impl Drop for NetworkHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_server(name: String, listener: TcpListener, router: Router) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(listener, router).await {
            error!(service = %name, error = %e, "Server stopped");
        }
    })
}

/// Launches the directory, `network.relays` relays and `network.users` users.
///
/// Relays generate their own key pairs and register over HTTP. With key escrow
/// enabled the private key is registered as well and relays fetch it back per
/// envelope; otherwise it never leaves the relay.
///
/// If any service fails to start, the ones already running are stopped
/// before the error is returned.
pub async fn launch_network(config: &OnionNetConfig) -> Result<NetworkHandle> {
    config.validate()?;
    let mut handle = NetworkHandle {
        directory: Arc::new(Directory::new(config.directory.clone())),
        relays: Vec::with_capacity(config.network.relays),
        users: Vec::with_capacity(config.network.users),
        tasks: Vec::with_capacity(1 + config.network.relays + config.network.users),
    };

    if let Err(e) = start_services(config, &mut handle).await {
        error!(error = %e, "Launch failed, stopping started services");
        handle.shutdown().await;
        return Err(e);
    }

    info!(
        relays = handle.relays.len(),
        users = handle.users.len(),
        registry = %config.network.registry_url(),
        "Network launched"
    );
    Ok(handle)
}

async fn start_services(config: &OnionNetConfig, handle: &mut NetworkHandle) -> Result<()> {
    let layout = &config.network;
    let timeout = config.router.hop_timeout();

    let listener = bind(&layout.host, layout.registry_port).await?;
    handle.tasks.push(spawn_server(
        "directory".to_string(),
        listener,
        directory_router(handle.directory.clone()),
    ));

    let directory_client: Arc<dyn DirectoryApi> =
        Arc::new(HttpDirectoryClient::from_config(layout, timeout)?);
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(layout.clone(), timeout)?);

    for n in 0..layout.relays {
        let node_id = NodeId(n as u32);
        let pair = KeyPair::generate();

        let mut registration = NodeRegistration::new(node_id, pair.public);
        let key = if config.directory.key_escrow {
            registration = registration.with_escrowed_key(pair.private);
            KeySource::Escrow
        } else {
            KeySource::Local(pair.private)
        };

        let listener = bind(&layout.host, layout.relay_port(node_id)?).await?;
        let relay = Arc::new(RelayNode::new(
            node_id,
            key,
            directory_client.clone(),
            network.clone(),
            config.router.clone(),
        ));
        handle.tasks.push(spawn_server(
            format!("relay-{node_id}"),
            listener,
            relay_router(relay.clone()),
        ));
        directory_client.register_node(registration).await?;
        handle.relays.push(relay);
    }

    for n in 0..layout.users {
        let user_id = UserId(n as u32);
        let listener = bind(&layout.host, layout.user_port(user_id)?).await?;
        let user = Arc::new(UserEndpoint::new(
            user_id,
            config.router.clone(),
            directory_client.clone(),
            network.clone(),
        ));
        handle.tasks.push(spawn_server(
            format!("user-{user_id}"),
            listener,
            user_router(user.clone()),
        ));
        handle.users.push(user);
    }
    Ok(())
}
