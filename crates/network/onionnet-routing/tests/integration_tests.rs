mod test_utils;

use async_trait::async_trait;
use onionnet_crypto::{KeyPair, MAX_SEALED_PAYLOAD};
use onionnet_routing::onion::build_onion;
use onionnet_routing::*;
use std::sync::Arc;
use std::time::Duration;
use test_utils::MemoryMesh;

fn circuit(ids: &[u32]) -> Circuit {
    Circuit::new(ids.iter().copied().map(NodeId).collect()).unwrap()
}

#[tokio::test]
async fn hello_reaches_user_seven_over_fixed_circuit() {
    let mesh = MemoryMesh::new(3);
    let sender = mesh.add_user(UserId(0));
    let recipient = mesh.add_user(UserId(7));

    let receipt = sender
        .send_over_circuit("hello", UserId(7), &circuit(&[0, 1, 2]))
        .await
        .unwrap();

    assert_eq!(receipt.circuit, circuit(&[0, 1, 2]));
    assert_eq!(recipient.state().last_received.as_deref(), Some("hello"));

    let sent = sender.state();
    assert_eq!(sent.last_sent.as_deref(), Some("hello"));
    assert_eq!(sent.last_circuit, Some(circuit(&[0, 1, 2])));
    assert_eq!(sent.last_received, None);
}

#[tokio::test]
async fn random_circuits_use_distinct_registered_relays() {
    let mesh = MemoryMesh::new(10);
    let sender = mesh.add_user(UserId(0));
    let recipient = mesh.add_user(UserId(1));

    for i in 0..20 {
        let message = format!("message {i}");
        let receipt = sender.send_message(&message, UserId(1)).await.unwrap();
        assert_eq!(receipt.circuit.len(), 3);
        for node in receipt.circuit.nodes() {
            assert!(node.0 < 10);
        }
        assert_eq!(recipient.state().last_received, Some(message));
    }
}

#[tokio::test]
async fn configured_circuit_length_is_honoured() {
    let mesh = MemoryMesh::with_config(
        6,
        RouterConfig::default().with_circuit_length(5),
        DirectoryConfig::default(),
    );
    let sender = mesh.add_user(UserId(0));
    mesh.add_user(UserId(1));

    let receipt = sender.send_message("five hops", UserId(1)).await.unwrap();
    assert_eq!(receipt.circuit.len(), 5);
}

#[tokio::test]
async fn too_few_relays_is_reported() {
    let mesh = MemoryMesh::new(2);
    let sender = mesh.add_user(UserId(0));
    mesh.add_user(UserId(1));

    let err = sender.send_message("hi", UserId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        RoutingError::NoRelaysAvailable { available: 2, required: 3 }
    ));
    let state = sender.state();
    assert_eq!(state.last_sent.as_deref(), Some("hi"));
    assert_eq!(state.last_circuit, None);
}

#[tokio::test]
async fn exit_delivers_even_when_next_hop_is_set() {
    let mesh = MemoryMesh::new(3);
    let recipient = mesh.add_user(UserId(5));
    let exit = mesh.relay(NodeId(2));

    let route = [NodeRecord { node_id: NodeId(2), public_key: mesh.keys[2].public }];
    let (mut envelope, _) = build_onion(&route, b"exit only", UserId(5)).unwrap();
    envelope.next_hop = Some(NodeId(1));

    let outcome = exit.handle_envelope(envelope).await.unwrap();
    assert_eq!(outcome, RouteOutcome::Delivered { user: UserId(5) });
    assert_eq!(recipient.state().last_received.as_deref(), Some("exit only"));
}

#[tokio::test]
async fn unknown_next_hop_delivers_nothing() {
    let mesh = MemoryMesh::new(3);
    let recipient = mesh.add_user(UserId(7));

    let route: Vec<NodeRecord> = mesh.directory.list_nodes();
    let (mut envelope, _) = build_onion(&route, b"hello", UserId(7)).unwrap();
    envelope.next_hop = Some(NodeId(99));

    let err = mesh.network.route_envelope(NodeId(0), envelope).await.unwrap_err();
    assert!(matches!(err, RoutingError::InvalidRouting(_)));
    assert_eq!(recipient.state().last_received, None);
    assert_eq!(mesh.relay(NodeId(1)).diagnostics(), RelayDiagnostics::default());
}

#[tokio::test]
async fn envelope_for_another_relay_fails_to_decrypt() {
    let mesh = MemoryMesh::new(3);
    mesh.add_user(UserId(7));

    let route = mesh.directory.list_nodes();
    let (envelope, _) = build_onion(&route, b"hello", UserId(7)).unwrap();

    let err = mesh.network.route_envelope(NodeId(1), envelope).await.unwrap_err();
    assert!(matches!(err, RoutingError::DecryptionFailed(_)));
}

#[tokio::test]
async fn downstream_failure_reaches_the_sender() {
    let mesh = MemoryMesh::new(3);
    let sender = mesh.add_user(UserId(0));
    let recipient = mesh.add_user(UserId(1));
    mesh.network.detach_relay(NodeId(2));

    let err = sender
        .send_over_circuit("lost", UserId(1), &circuit(&[0, 1, 2]))
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::MessageSendFailed(_)));
    assert!(err.to_string().contains("hop 1 failed"));
    assert!(!err.to_string().contains("unreachable"));
    assert_eq!(recipient.state().last_received, None);

    let attempted = sender.state();
    assert_eq!(attempted.last_sent.as_deref(), Some("lost"));
    assert_eq!(attempted.last_circuit, Some(circuit(&[0, 1, 2])));
}

#[tokio::test]
async fn missing_recipient_is_a_send_failure() {
    let mesh = MemoryMesh::new(3);
    let sender = mesh.add_user(UserId(0));

    let err = sender.send_message("nobody home", UserId(9)).await.unwrap_err();
    assert!(matches!(err, RoutingError::MessageSendFailed(_)));

    let attempted = sender.state();
    assert_eq!(attempted.last_sent.as_deref(), Some("nobody home"));
    assert_eq!(attempted.last_circuit.map(|c| c.len()), Some(3));
}

#[tokio::test]
async fn messages_past_the_seal_bound_round_trip() {
    let mesh = MemoryMesh::new(4);
    let sender = mesh.add_user(UserId(0));
    let recipient = mesh.add_user(UserId(1));
    let message = "long message ".repeat(MAX_SEALED_PAYLOAD);

    sender
        .send_over_circuit(&message, UserId(1), &circuit(&[3, 1, 0, 2]))
        .await
        .unwrap();
    assert_eq!(recipient.state().last_received, Some(message));
}

#[tokio::test]
async fn escrow_deployment_delivers() {
    let mesh = MemoryMesh::with_config(
        3,
        RouterConfig::default(),
        DirectoryConfig::default().with_key_escrow(true),
    );
    let sender = mesh.add_user(UserId(0));
    let recipient = mesh.add_user(UserId(1));

    sender.send_message("escrowed", UserId(1)).await.unwrap();
    assert_eq!(recipient.state().last_received.as_deref(), Some("escrowed"));
}

#[tokio::test]
async fn relay_diagnostics_follow_the_circuit() {
    let mesh = MemoryMesh::new(3);
    let sender = mesh.add_user(UserId(0));
    mesh.add_user(UserId(4));

    sender
        .send_over_circuit("trace me", UserId(4), &circuit(&[2, 0, 1]))
        .await
        .unwrap();

    let entry = mesh.relay(NodeId(2)).diagnostics();
    assert_eq!(entry.last_destination, Some(RouteOutcome::Forwarded { next_hop: NodeId(0) }));
    let middle = mesh.relay(NodeId(0)).diagnostics();
    assert_eq!(middle.last_destination, Some(RouteOutcome::Forwarded { next_hop: NodeId(1) }));
    assert_eq!(middle.last_encrypted, entry.last_decrypted);

    let exit = mesh.relay(NodeId(1)).diagnostics();
    assert_eq!(exit.last_decrypted.as_deref(), Some("trace me"));
    assert_eq!(exit.last_destination, Some(RouteOutcome::Delivered { user: UserId(4) }));
}

#[tokio::test]
async fn unregistered_public_key_is_not_found() {
    let mesh = MemoryMesh::new(1);
    let api: Arc<dyn DirectoryApi> = mesh.directory.clone();
    assert!(matches!(
        api.get_public_key(NodeId(8)).await,
        Err(RoutingError::NotFound(NodeId(8)))
    ));

    let sender = mesh.add_user(UserId(0));
    let err = sender
        .send_over_circuit("hi", UserId(0), &circuit(&[0, 8]))
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::NotFound(NodeId(8))));
}

#[tokio::test]
async fn late_registration_is_visible_to_senders() {
    let mut mesh = MemoryMesh::new(2);
    let sender = mesh.add_user(UserId(0));
    mesh.add_user(UserId(1));
    assert!(sender.send_message("early", UserId(1)).await.is_err());

    mesh.add_relay(NodeId(2), false);
    sender.send_message("late", UserId(1)).await.unwrap();

    let pair = KeyPair::generate();
    let err = mesh
        .directory
        .register_node(NodeRegistration::new(NodeId(2), pair.public))
        .unwrap_err();
    assert!(matches!(err, RoutingError::AlreadyRegistered(NodeId(2))));
}

struct StalledNetwork;

#[async_trait]
impl Network for StalledNetwork {
    async fn route_envelope(&self, _: NodeId, _: Envelope) -> Result<()> {
        std::future::pending().await
    }

    async fn deliver_message(&self, _: UserId, _: String) -> Result<()> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn stalled_hop_times_out() {
    let directory = Arc::new(Directory::default());
    for id in 0..3 {
        let pair = KeyPair::generate();
        directory
            .register_node(NodeRegistration::new(NodeId(id), pair.public))
            .unwrap();
    }
    let sender = UserEndpoint::new(
        UserId(0),
        RouterConfig::default().with_hop_timeout(1),
        directory,
        Arc::new(StalledNetwork),
    );

    let started = std::time::Instant::now();
    let err = sender.send_message("stuck", UserId(1)).await.unwrap_err();
    assert!(matches!(err, RoutingError::MessageSendFailed(_)));
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));
}
