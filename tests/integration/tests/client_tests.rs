//! Client facade integration tests
//!
//! Exercises the full aggregate: gateway events flowing through the cache
//! hook into string-keyed subscriptions, plus presence updates.
//!
//! Run with: cargo test -p integration-tests --test client_tests

use anyhow::Result;
use integration_tests::{next_event, test_config, MockGateway, RECV_TIMEOUT};
use parley::{Client, GatewayEvent, PresenceUpdatePayload};
use serde_json::json;
use tokio::time::timeout;

#[tokio::test]
async fn test_facade_delivers_events_and_enriches_deletes() -> Result<()> {
    let server = MockGateway::bind().await?;
    let mut client = Client::new(test_config(&server.url))?;

    let commander = client.commander();
    let cache = client.cache().clone();
    let mut messages = client.subscribe("MESSAGE_CREATE");
    let mut deletes = client.subscribe("CHANNEL_DELETE");
    let mut all = client.events();

    let task = tokio::spawn(async move { client.connect().await });

    let mut peer = server.accept().await?;
    peer.drive_to_ready(30_000, "abc").await?;
    loop {
        if matches!(next_event(&mut all).await, GatewayEvent::Ready { .. }) {
            break;
        }
    }

    // The create populates the cache; the delete tombstone only carries the
    // id, so subscribers get the cached body instead
    peer.send(&json!({"op": 0, "t": "CHANNEL_CREATE", "s": 2, "d": {"id": "c1", "name": "general"}}))
        .await?;
    peer.send(&json!({"op": 0, "t": "CHANNEL_DELETE", "s": 3, "d": {"id": "c1"}}))
        .await?;
    peer.send(&json!({"op": 0, "t": "MESSAGE_CREATE", "s": 4, "d": {"id": "m1", "content": "hi"}}))
        .await?;

    let deleted = timeout(RECV_TIMEOUT, deletes.recv()).await?.unwrap();
    assert_eq!(deleted, json!({"id": "c1", "name": "general"}));
    assert!(cache.channel("c1").is_none());

    let message = timeout(RECV_TIMEOUT, messages.recv()).await?.unwrap();
    assert_eq!(message["content"], "hi");
    assert_eq!(
        cache.message("m1"),
        Some(json!({"id": "m1", "content": "hi"}))
    );

    // Presence updates go out over the live connection
    commander
        .update_presence(PresenceUpdatePayload::status("dnd"))
        .await?;
    let presence = peer.recv_op(3).await?;
    assert_eq!(presence["d"]["status"], "dnd");
    assert_eq!(presence["d"]["afk"], false);

    commander.shutdown().await?;
    assert!(task.await?.is_ok());
    Ok(())
}
