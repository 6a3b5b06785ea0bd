//! Gateway client
//!
//! The top-level coordinator. Owns the connect/handshake/heartbeat cycle,
//! decides between resuming and re-identifying after every drop, and is the
//! only component allowed to open or close the transport.

use crate::connection::{ConnectionHandle, InboundEvent};
use crate::error::{GatewayError, GatewayResult};
use crate::events::EventBus;
use crate::handshake::HandshakeSequencer;
use crate::heartbeat::{ControlSignal, HeartbeatMonitor};
use crate::protocol::{CloseCode, GatewayMessage, PresenceUpdatePayload};
use crate::router::{DispatchRouter, RouteAction};
use crate::session::{ConnectionState, Session};
use parley_common::ClientConfig;
use parley_core::hook::NoopHook;
use parley_core::DispatchHook;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Buffer size for consumer commands
const COMMAND_BUFFER_SIZE: usize = 16;

/// Requests consumers send into the run loop
#[derive(Debug)]
enum Command {
    UpdatePresence(PresenceUpdatePayload),
    Shutdown,
}

/// How one connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionOutcome {
    /// Consumer asked for a clean shutdown
    Shutdown,
    /// Cycle the connection; `resumable` says whether the session survives
    Retry { resumable: bool, reached_ready: bool },
}

/// Cheap cloneable handle for talking to a running gateway client
#[derive(Debug, Clone)]
pub struct GatewayCommander {
    tx: mpsc::Sender<Command>,
}

impl GatewayCommander {
    /// Request a presence change; sent once the session is READY
    pub async fn update_presence(&self, presence: PresenceUpdatePayload) -> GatewayResult<()> {
        self.tx
            .send(Command::UpdatePresence(presence))
            .await
            .map_err(|_| GatewayError::NotConnected)
    }

    /// Request a clean shutdown of the run loop
    pub async fn shutdown(&self) -> GatewayResult<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| GatewayError::NotConnected)
    }
}

/// The gateway session manager
pub struct GatewayClient {
    config: ClientConfig,
    session: Arc<Session>,
    events: Arc<EventBus>,
    hook: Arc<dyn DispatchHook>,
    command_tx: mpsc::Sender<Command>,
    command_rx: mpsc::Receiver<Command>,
}

impl GatewayClient {
    /// Create a client that forwards dispatch payloads verbatim
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);

        Self {
            config,
            session: Session::new(),
            events: Arc::new(EventBus::new()),
            hook: Arc::new(NoopHook),
            command_tx,
            command_rx,
        }
    }

    /// Install a dispatch hook (e.g. the resource cache)
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn DispatchHook>) -> Self {
        self.hook = hook;
        self
    }

    /// The shared session state
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The public event surface
    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// A handle for sending commands while the client runs
    #[must_use]
    pub fn commander(&self) -> GatewayCommander {
        GatewayCommander {
            tx: self.command_tx.clone(),
        }
    }

    /// Drive the gateway until shutdown or a terminal error.
    ///
    /// Recoverable failures (transport drops, heartbeat timeouts, rejected
    /// resumes) are handled internally; only authentication rejection, fatal
    /// close codes, and reconnect exhaustion surface.
    pub async fn run(mut self) -> GatewayResult<()> {
        let router = DispatchRouter::new(
            self.session.clone(),
            self.events.clone(),
            self.hook.clone(),
        );
        let sequencer = HandshakeSequencer::new(&self.config);
        let url = self.config.gateway_connect_url();
        let mut attempts: u32 = 0;

        loop {
            match self.run_connection(&url, &router, &sequencer).await {
                Ok(ConnectionOutcome::Shutdown) => {
                    tracing::info!("Gateway shut down");
                    return Ok(());
                }
                Ok(ConnectionOutcome::Retry {
                    resumable,
                    reached_ready,
                }) => {
                    if !resumable {
                        self.session.invalidate().await;
                    }
                    if reached_ready {
                        attempts = 0;
                    }
                    attempts += 1;

                    if let Some(max) = self.config.reconnect.max_attempts {
                        if attempts > max {
                            let error = GatewayError::ReconnectExhausted { attempts: max };
                            tracing::error!(error = %error, "Giving up on reconnecting");
                            self.events.emit_closed(error.clone());
                            return Err(error);
                        }
                    }

                    tracing::info!(
                        attempt = attempts,
                        resumable,
                        delay_ms = self.config.reconnect.delay_ms,
                        "Reconnecting"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.reconnect.delay_ms)).await;
                }
                Err(error) => {
                    tracing::error!(error = %error, "Gateway terminated");
                    self.events.emit_closed(error.clone());
                    return Err(error);
                }
            }
        }
    }

    /// Run a single connection to completion
    async fn run_connection(
        &mut self,
        url: &str,
        router: &DispatchRouter,
        sequencer: &HandshakeSequencer,
    ) -> GatewayResult<ConnectionOutcome> {
        let session = self.session.clone();

        let (handle, mut inbound) = match ConnectionHandle::open(url, session.clone()).await {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(error = %error, "Failed to open gateway transport");
                return Ok(ConnectionOutcome::Retry {
                    resumable: true,
                    reached_ready: false,
                });
            }
        };

        let sender = handle.sender();
        let (control_tx, mut control_rx) = mpsc::channel(4);
        let mut monitor = HeartbeatMonitor::new();
        let mut reached_ready = false;

        let outcome: GatewayResult<ConnectionOutcome> = loop {
            tokio::select! {
                inbound_event = inbound.recv() => match inbound_event {
                    Some(InboundEvent::Frame(frame)) => {
                        match router.route(frame).await {
                            RouteAction::None => {}
                            RouteAction::SendHeartbeat => {
                                let seq = session.sequence().await;
                                if sender.send(GatewayMessage::heartbeat(seq)).await.is_err() {
                                    break Ok(ConnectionOutcome::Retry {
                                        resumable: true,
                                        reached_ready,
                                    });
                                }
                            }
                            RouteAction::BeginHandshake { heartbeat_interval } => {
                                monitor.start(
                                    heartbeat_interval,
                                    session.clone(),
                                    sender.clone(),
                                    control_tx.clone(),
                                );
                                if let Err(error) = sequencer.begin(&session, &sender).await {
                                    tracing::warn!(error = %error, "Handshake send failed");
                                    break Ok(ConnectionOutcome::Retry {
                                        resumable: true,
                                        reached_ready,
                                    });
                                }
                            }
                            RouteAction::Reconnect { resumable } => {
                                if !resumable
                                    && session.state().await == ConnectionState::Resuming
                                {
                                    tracing::warn!(
                                        error = %GatewayError::ResumeRejected,
                                        "Falling back to a fresh handshake"
                                    );
                                }
                                break Ok(ConnectionOutcome::Retry {
                                    resumable,
                                    reached_ready,
                                });
                            }
                        }

                        if !reached_ready
                            && session.state().await == ConnectionState::Ready
                        {
                            reached_ready = true;
                        }
                    }
                    Some(InboundEvent::Closed { code, reason }) => {
                        break Self::classify_close(code, reason, reached_ready);
                    }
                    None => {
                        break Ok(ConnectionOutcome::Retry {
                            resumable: true,
                            reached_ready,
                        });
                    }
                },

                signal = control_rx.recv() => {
                    if let Some(ControlSignal::HeartbeatTimeout) = signal {
                        tracing::warn!(
                            error = %GatewayError::HeartbeatTimeout,
                            "Cycling the connection"
                        );
                        break Ok(ConnectionOutcome::Retry {
                            resumable: true,
                            reached_ready,
                        });
                    }
                },

                command = self.command_rx.recv() => match command {
                    Some(Command::UpdatePresence(presence)) => {
                        if session.state().await == ConnectionState::Ready {
                            if let Err(error) =
                                sender.send(GatewayMessage::presence_update(&presence)).await
                            {
                                tracing::warn!(error = %error, "Failed to send presence update");
                            }
                        } else {
                            tracing::debug!("Dropping presence update, session not ready");
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        break Ok(ConnectionOutcome::Shutdown);
                    }
                },
            }
        };

        // Teardown order matters: stop the timer first so it cannot fire
        // against a socket mid-close, then take the transport down. The
        // local sender clone must go before close so the writer can drain.
        monitor.stop();
        drop(sender);
        handle.close().await;

        outcome
    }

    /// Map a transport close into an outcome
    fn classify_close(
        code: Option<u16>,
        reason: Option<String>,
        reached_ready: bool,
    ) -> GatewayResult<ConnectionOutcome> {
        match code.and_then(CloseCode::from_u16) {
            Some(CloseCode::AuthenticationFailed) => Err(GatewayError::AuthenticationRejected),
            Some(close_code) if close_code.is_fatal() => Err(GatewayError::FatalClose(close_code)),
            Some(close_code) => {
                tracing::warn!(code = %close_code, "Connection closed by server");
                Ok(ConnectionOutcome::Retry {
                    resumable: close_code.can_resume(),
                    reached_ready,
                })
            }
            // A plain transport drop keeps the session resumable
            None => {
                tracing::warn!(code = ?code, reason = ?reason, "Transport dropped");
                Ok(ConnectionOutcome::Retry {
                    resumable: true,
                    reached_ready,
                })
            }
        }
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient").finish()
    }
}
