//! Heartbeat monitor
//!
//! Sends liveness pings on the server-dictated interval and watches for the
//! acknowledgement. One silent interval means the connection is dead: the
//! monitor emits a single timeout signal and stops, handing recovery to the
//! coordinator.

use crate::connection::FrameSender;
use crate::protocol::GatewayMessage;
use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Signals the monitor sends the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// The server did not acknowledge a heartbeat for a full interval
    HeartbeatTimeout,
}

/// Periodic liveness monitor for one connection
#[derive(Debug, Default)]
pub struct HeartbeatMonitor {
    task: Option<JoinHandle<()>>,
}

impl HeartbeatMonitor {
    /// Create a monitor with no timer running
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin the periodic timer.
    ///
    /// Any previous timer is stopped first; exactly one timer may exist per
    /// connection, otherwise a stale timer could fire against a new socket.
    /// Every tick either sends a heartbeat carrying the last known sequence
    /// (previous beat acked) or reports the connection dead (not acked).
    pub fn start(
        &mut self,
        interval_ms: u64,
        session: Arc<Session>,
        sender: FrameSender,
        control: mpsc::Sender<ControlSignal>,
    ) {
        self.stop();

        tracing::debug!(interval_ms, "Starting heartbeat timer");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first beat belongs a
            // full interval after Hello.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if session.is_heartbeat_acked() {
                    let seq = session.sequence().await;
                    session.await_heartbeat_ack();

                    tracing::trace!(seq = ?seq, "Sending heartbeat");

                    if sender.send(GatewayMessage::heartbeat(seq)).await.is_err() {
                        tracing::debug!("Heartbeat send failed, connection gone");
                        break;
                    }
                } else {
                    tracing::warn!(
                        interval_ms,
                        "Heartbeat not acknowledged for a full interval, forcing reconnect"
                    );
                    let _ = control.send(ControlSignal::HeartbeatTimeout).await;
                    break;
                }
            }
        }));
    }

    /// Clear the timer.
    ///
    /// Must be called before a new connection is established and before the
    /// transport is torn down, in that order relative to the socket close.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Heartbeat timer stopped");
        }
    }

    /// Whether a timer is currently installed
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
