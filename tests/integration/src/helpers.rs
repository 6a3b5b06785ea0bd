//! Test helpers for integration tests
//!
//! A mock gateway server built directly on tokio-tungstenite, plus a harness
//! that spawns a gateway client and exposes its session, events, and
//! commander to the test body.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use parley_common::telemetry::{self, LogFormat};
use parley_common::{ClientConfig, ReconnectPolicy};
use parley_core::Intents;
use parley_gateway::{
    GatewayClient, GatewayCommander, GatewayError, GatewayEvent, Session,
};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// How long to wait for any expected frame or event
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Token every test client authenticates with
pub const TEST_TOKEN: &str = "test-token";

/// In-process mock gateway server
pub struct MockGateway {
    listener: TcpListener,
    pub url: String,
}

impl MockGateway {
    /// Bind to an ephemeral local port
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}", listener.local_addr()?);
        Ok(Self { listener, url })
    }

    /// Accept the next client connection and complete the WebSocket handshake
    pub async fn accept(&self) -> Result<GatewayPeer> {
        let (stream, _) = timeout(RECV_TIMEOUT, self.listener.accept())
            .await
            .context("timed out waiting for a client connection")??;
        let ws = accept_async(stream).await?;
        Ok(GatewayPeer { ws })
    }

    /// Assert that no client connects within the window
    pub async fn expect_no_connection(&self, within: Duration) -> Result<()> {
        if timeout(within, self.listener.accept()).await.is_ok() {
            bail!("unexpected client connection");
        }
        Ok(())
    }
}

/// Server side of one accepted connection
pub struct GatewayPeer {
    ws: WebSocketStream<TcpStream>,
}

impl GatewayPeer {
    /// Send a frame built from a JSON value
    pub async fn send(&mut self, frame: &Value) -> Result<()> {
        self.ws.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Send raw text, bypassing JSON construction
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send the Hello frame dictating the heartbeat interval
    pub async fn hello(&mut self, heartbeat_interval_ms: u64) -> Result<()> {
        self.send(&json!({"op": 10, "d": {"heartbeat_interval": heartbeat_interval_ms}}))
            .await
    }

    /// Acknowledge a heartbeat
    pub async fn ack(&mut self) -> Result<()> {
        self.send(&json!({"op": 11})).await
    }

    /// Receive the next text frame from the client
    pub async fn recv(&mut self) -> Result<Value> {
        loop {
            let message = timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for a client frame")?
                .context("connection ended")??;

            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => bail!("connection closed by client"),
                _ => {}
            }
        }
    }

    /// Receive frames until one with the given opcode arrives
    ///
    /// Useful for skipping heartbeats when waiting for a handshake frame.
    pub async fn recv_op(&mut self, op: u64) -> Result<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["op"] == op {
                return Ok(frame);
            }
        }
    }

    /// Close the connection with a gateway close code
    pub async fn close_with(&mut self, code: u16, reason: &'static str) -> Result<()> {
        self.ws
            .send(Message::Close(Some(CloseFrame {
                code: code.into(),
                reason: reason.into(),
            })))
            .await?;
        Ok(())
    }

    /// Drive the handshake: Hello, consume the Identify, confirm READY.
    ///
    /// Returns the Identify frame for further assertions.
    pub async fn drive_to_ready(
        &mut self,
        heartbeat_interval_ms: u64,
        session_id: &str,
    ) -> Result<Value> {
        self.hello(heartbeat_interval_ms).await?;
        let identify = self.recv_op(2).await?;
        self.send(&json!({
            "op": 0,
            "t": "READY",
            "s": 1,
            "d": {"session_id": session_id}
        }))
        .await?;
        Ok(identify)
    }
}

/// A gateway client running in the background
pub struct TestGateway {
    pub session: Arc<Session>,
    pub events: mpsc::UnboundedReceiver<GatewayEvent>,
    pub commander: GatewayCommander,
    pub task: JoinHandle<Result<(), GatewayError>>,
}

/// Configuration pointed at a mock server, with fast reconnects.
///
/// Also installs the test subscriber so `RUST_LOG` surfaces gateway traffic.
pub fn test_config(url: &str) -> ClientConfig {
    let _ = telemetry::init("warn", LogFormat::Text);

    ClientConfig::new(TEST_TOKEN)
        .with_intents(Intents::GUILDS | Intents::GUILD_MESSAGES)
        .with_gateway_url(url)
        .with_reconnect(ReconnectPolicy {
            max_attempts: None,
            delay_ms: 25,
        })
}

/// Spawn a gateway client driving the given configuration
pub fn spawn_gateway(config: ClientConfig) -> TestGateway {
    let client = GatewayClient::new(config);
    let session = client.session().clone();
    let events = client.events().subscribe_all();
    let commander = client.commander();
    let task = tokio::spawn(client.run());

    TestGateway {
        session,
        events,
        commander,
        task,
    }
}

/// Receive the next gateway event, failing the test on a stuck stream
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<GatewayEvent>) -> GatewayEvent {
    timeout(RECV_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a gateway event")
        .expect("event stream ended")
}

/// Receive events until a Ready arrives, returning its session id
pub async fn wait_for_ready(events: &mut mpsc::UnboundedReceiver<GatewayEvent>) -> String {
    loop {
        if let GatewayEvent::Ready { session_id, .. } = next_event(events).await {
            return session_id;
        }
    }
}
