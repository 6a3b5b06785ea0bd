//! Connection handle
//!
//! Owns the transport socket and its lifecycle. Outbound frames go through a
//! bounded channel drained by a writer task, so a slow write never stalls
//! inbound classification; inbound frames are parsed and forwarded to the
//! coordinator in arrival order.

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::GatewayMessage;
use crate::session::{ConnectionState, Session};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::connect_async;

/// Buffer size for outbound frames
const OUTBOUND_BUFFER_SIZE: usize = 100;

/// Buffer size for inbound frames
const INBOUND_BUFFER_SIZE: usize = 100;

/// How long `close` waits for the writer to flush before aborting it
const CLOSE_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Something the transport delivered to the coordinator
#[derive(Debug)]
pub enum InboundEvent {
    /// A parsed gateway frame, in arrival order
    Frame(GatewayMessage),
    /// The transport ended; `code` is the close code when the server sent one
    Closed {
        code: Option<u16>,
        reason: Option<String>,
    },
}

/// Cheap handle for sending frames; cloned into the heartbeat monitor
#[derive(Clone)]
pub struct FrameSender {
    outbound: mpsc::Sender<Message>,
    session: Arc<Session>,
}

impl FrameSender {
    pub(crate) fn new(outbound: mpsc::Sender<Message>, session: Arc<Session>) -> Self {
        Self { outbound, session }
    }

    /// Serialize and enqueue a frame for transmission.
    ///
    /// Fails with [`GatewayError::NotConnected`] unless the connection is in
    /// a state that may carry frames.
    pub async fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        let state = self.session.state().await;
        if !matches!(
            state,
            ConnectionState::AwaitingHello
                | ConnectionState::Identifying
                | ConnectionState::Resuming
                | ConnectionState::Ready
        ) {
            return Err(GatewayError::NotConnected);
        }

        let json = message
            .to_json()
            .map_err(|e| GatewayError::ProtocolViolation(e.to_string()))?;

        tracing::trace!(op = %message.op, "Sending frame");

        self.outbound
            .send(Message::Text(json))
            .await
            .map_err(|_| GatewayError::NotConnected)
    }
}

/// A live transport connection
pub struct ConnectionHandle {
    sender: FrameSender,
    session: Arc<Session>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Establish a transport to `url`.
    ///
    /// On success the connection is in `AwaitingHello` and the returned
    /// receiver yields inbound events until the transport ends.
    pub async fn open(
        url: &str,
        session: Arc<Session>,
    ) -> GatewayResult<(Self, mpsc::Receiver<InboundEvent>)> {
        session.set_state(ConnectionState::Connecting).await;

        let (socket, _response) = match connect_async(url).await {
            Ok(pair) => pair,
            Err(e) => {
                session.set_state(ConnectionState::Disconnected).await;
                return Err(e.into());
            }
        };

        session.set_state(ConnectionState::AwaitingHello).await;
        tracing::info!(url = %url, "Gateway transport established");

        let (mut ws_sink, mut ws_stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER_SIZE);
        let (in_tx, in_rx) = mpsc::channel::<InboundEvent>(INBOUND_BUFFER_SIZE);

        // Writer: drains the outbound channel until it closes, then closes
        // the sink so the server sees a clean shutdown.
        let writer_task = tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                if let Err(e) = ws_sink.send(message).await {
                    tracing::warn!(error = %e, "Transport write failed");
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        // Reader: parses text frames and forwards them in arrival order.
        // Malformed frames are dropped, never fatal.
        let reader_task = tokio::spawn(async move {
            while let Some(next) = ws_stream.next().await {
                match next {
                    Ok(Message::Text(text)) => match GatewayMessage::from_json(&text) {
                        Ok(frame) => {
                            if in_tx.send(InboundEvent::Frame(frame)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping malformed frame");
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = match frame {
                            Some(f) => (Some(u16::from(f.code)), Some(f.reason.to_string())),
                            None => (None, None),
                        };
                        tracing::info!(code = ?code, reason = ?reason, "Server closed connection");
                        let _ = in_tx.send(InboundEvent::Closed { code, reason }).await;
                        return;
                    }
                    Ok(Message::Ping(_) | Message::Pong(_)) => {
                        // Pongs are produced by the transport layer
                    }
                    Ok(other) => {
                        tracing::debug!(kind = ?other, "Ignoring non-text frame");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Transport read failed");
                        let _ = in_tx
                            .send(InboundEvent::Closed {
                                code: None,
                                reason: Some(e.to_string()),
                            })
                            .await;
                        return;
                    }
                }
            }

            // Stream ended without a close frame
            let _ = in_tx
                .send(InboundEvent::Closed {
                    code: None,
                    reason: None,
                })
                .await;
        });

        let sender = FrameSender::new(out_tx, session.clone());

        Ok((
            Self {
                sender,
                session,
                writer_task,
                reader_task,
            },
            in_rx,
        ))
    }

    /// A cloneable sender for this connection
    #[must_use]
    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    /// Serialize and transmit a frame
    pub async fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        self.sender.send(message).await
    }

    /// Terminate the transport.
    ///
    /// Dropping the outbound channel lets the writer flush and close the
    /// sink; the reader is aborted since nothing will consume it afterwards.
    /// A straggling `FrameSender` clone keeps the channel open, so the drain
    /// is bounded and the writer aborted if it runs out.
    pub async fn close(self) {
        self.session.set_state(ConnectionState::Closing).await;

        let Self {
            sender,
            session,
            writer_task,
            reader_task,
        } = self;

        drop(sender);

        let writer_abort = writer_task.abort_handle();
        if tokio::time::timeout(CLOSE_DRAIN_TIMEOUT, writer_task)
            .await
            .is_err()
        {
            tracing::debug!("Writer did not drain in time, aborting");
            writer_abort.abort();
        }
        reader_task.abort();

        session.set_state(ConnectionState::Disconnected).await;
        tracing::info!("Gateway transport closed");
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle").finish()
    }
}
