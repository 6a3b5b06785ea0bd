//! Gateway session manager integration tests
//!
//! Each test runs a real client against an in-process mock server and
//! drives the wire protocol from the server side.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use anyhow::Result;
use integration_tests::{
    next_event, spawn_gateway, test_config, wait_for_ready, MockGateway, TEST_TOKEN,
};
use parley_gateway::{ConnectionState, GatewayError, GatewayEvent};
use serde_json::json;
use std::time::Duration;

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_identify_handshake_reaches_ready() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    let identify = peer.drive_to_ready(30_000, "abc").await?;

    // The identify frame carries the credential, properties, and intents
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], TEST_TOKEN);
    assert_eq!(identify["d"]["intents"], 513);
    assert!(identify["d"]["properties"]["os"].is_string());

    assert_eq!(wait_for_ready(&mut gateway.events).await, "abc");
    assert_eq!(gateway.session.state().await, ConnectionState::Ready);
    assert_eq!(gateway.session.session_id().await, Some("abc".to_string()));

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

// ============================================================================
// Sequence tracking
// ============================================================================

#[tokio::test]
async fn test_dispatch_sequences_track_maximum_seen() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    // Out-of-order delivery: the stale frame is still forwarded, but the
    // stored sequence never decreases
    for (seq, id) in [(5, "a"), (7, "b"), (6, "c")] {
        peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": seq, "d": {"id": id}}))
            .await?;
    }

    for expected in ["a", "b", "c"] {
        match next_event(&mut gateway.events).await {
            GatewayEvent::Dispatch { event_type, data } => {
                assert_eq!(event_type, "MESSAGE_CREATE");
                assert_eq!(data["id"], expected);
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    assert_eq!(gateway.session.sequence().await, Some(7));

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

// ============================================================================
// Heartbeat liveness
// ============================================================================

#[tokio::test]
async fn test_acknowledged_heartbeats_keep_the_session_alive() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(100, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    // Two full heartbeat cycles: each beat carries the last sequence and an
    // ack in time prevents any reconnect on the following tick
    for _ in 0..2 {
        let beat = peer.recv_op(1).await?;
        assert_eq!(beat["d"], 1);
        peer.ack().await?;
    }

    // Still the same connection and the same session
    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 2, "d": {"id": "m"}}))
        .await?;
    assert!(matches!(
        next_event(&mut gateway.events).await,
        GatewayEvent::Dispatch { .. }
    ));
    assert_eq!(gateway.session.state().await, ConnectionState::Ready);

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

#[tokio::test]
async fn test_missed_ack_triggers_exactly_one_reconnect() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(100, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    // Establish a sequence number worth resuming from
    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 42, "d": {"id": "m"}}))
        .await?;
    next_event(&mut gateway.events).await;

    // The beat goes out but is never acknowledged; one silent interval later
    // the client declares the connection dead
    let beat = peer.recv_op(1).await?;
    assert_eq!(beat["d"], 42);

    // The client reconnects once and prefers RESUME, session intact.
    // A long interval on the new connection keeps beats out of the rest of
    // the test.
    let mut peer2 = server.accept().await?;
    peer2.hello(60_000).await?;
    let resume = peer2.recv_op(6).await?;
    assert_eq!(resume["d"]["token"], TEST_TOKEN);
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 42);

    peer2.send(&json!({"op": 0, "t": "RESUMED", "d": null})).await?;
    loop {
        if matches!(next_event(&mut gateway.events).await, GatewayEvent::Resumed) {
            break;
        }
    }

    // Session identity survived the cycle
    assert_eq!(gateway.session.session_id().await, Some("abc".to_string()));
    assert_eq!(gateway.session.sequence().await, Some(42));
    assert_eq!(gateway.session.state().await, ConnectionState::Ready);

    // Exactly one reconnect per missed ack
    server
        .expect_no_connection(Duration::from_millis(300))
        .await?;

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

// ============================================================================
// Resume
// ============================================================================

#[tokio::test]
async fn test_transport_drop_resumes_with_retained_sequence() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 42, "d": {"id": "m"}}))
        .await?;
    next_event(&mut gateway.events).await;

    // Sever the transport without any close code
    drop(peer);

    // On reconnect the next Hello makes the sequencer prefer RESUME
    let mut peer2 = server.accept().await?;
    peer2.hello(30_000).await?;
    let resume = peer2.recv_op(6).await?;
    assert_eq!(resume["d"]["session_id"], "abc");
    assert_eq!(resume["d"]["seq"], 42);

    peer2.send(&json!({"op": 0, "t": "RESUMED", "d": null})).await?;
    loop {
        if matches!(next_event(&mut gateway.events).await, GatewayEvent::Resumed) {
            break;
        }
    }

    // Unchanged from their pre-disconnect values
    assert_eq!(gateway.session.session_id().await, Some("abc".to_string()));
    assert_eq!(gateway.session.sequence().await, Some(42));

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

#[tokio::test]
async fn test_server_reconnect_request_resumes() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    peer.send(&json!({"op": 7})).await?;

    let mut peer2 = server.accept().await?;
    peer2.hello(30_000).await?;
    let resume = peer2.recv_op(6).await?;
    assert_eq!(resume["d"]["session_id"], "abc");

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

#[tokio::test]
async fn test_rejected_resume_falls_back_to_identify() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 42, "d": {"id": "m"}}))
        .await?;
    next_event(&mut gateway.events).await;

    // The session cannot be resumed under any circumstances
    peer.send(&json!({"op": 9, "d": false})).await?;

    // The next client frame is an IDENTIFY, and the session was cleared first
    let mut peer2 = server.accept().await?;
    peer2.hello(30_000).await?;
    let identify = peer2.recv_op(2).await?;
    assert_eq!(identify["d"]["token"], TEST_TOKEN);
    assert_eq!(gateway.session.session_id().await, None);
    assert_eq!(gateway.session.sequence().await, None);

    // A fresh session comes up under a new identity
    peer2
        .send(&json!({"op": 0, "t": "READY", "s": 1, "d": {"session_id": "xyz"}}))
        .await?;
    assert_eq!(wait_for_ready(&mut gateway.events).await, "xyz");
    assert_eq!(gateway.session.session_id().await, Some("xyz".to_string()));

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

// ============================================================================
// Fault handling
// ============================================================================

#[tokio::test]
async fn test_malformed_frame_does_not_kill_the_session() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    wait_for_ready(&mut gateway.events).await;

    peer.send_raw("{not json").await?;

    // The bad frame was dropped; the session carries on in its prior state
    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 2, "d": {"id": "after"}}))
        .await?;
    match next_event(&mut gateway.events).await {
        GatewayEvent::Dispatch { data, .. } => assert_eq!(data["id"], "after"),
        other => panic!("expected dispatch, got {other:?}"),
    }
    assert_eq!(gateway.session.state().await, ConnectionState::Ready);

    gateway.commander.shutdown().await?;
    assert_eq!(gateway.task.await?, Ok(()));
    Ok(())
}

#[tokio::test]
async fn test_authentication_rejection_is_terminal() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut gateway = spawn_gateway(test_config(&server.url));

    let mut peer = server.accept().await?;
    peer.hello(30_000).await?;
    peer.recv_op(2).await?;

    // The credential is rejected; the frame carries no retry information
    peer.close_with(4004, "Authentication failed").await?;

    assert_eq!(
        gateway.task.await?,
        Err(GatewayError::AuthenticationRejected)
    );

    // The failure reaches the consumer as a terminal event
    loop {
        if let GatewayEvent::Closed { error } = next_event(&mut gateway.events).await {
            assert_eq!(error, GatewayError::AuthenticationRejected);
            break;
        }
    }

    // No automatic retry follows
    server
        .expect_no_connection(Duration::from_millis(300))
        .await?;
    Ok(())
}
