//! Notification gateway for onlookers.
//!
//! Publishing happens after a claim has committed and is not covered by the
//! claim's unit of work. A failed publish is logged and dropped; clients that
//! miss an event catch up from the board on their next refresh.

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::engine::{ClaimOutcome, GridId};
use crate::grid::Position;

/// Event pushed to everyone watching a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GridEvent {
    /// Cells were reserved by a claimant.
    CellsTaken {
        /// Grid the cells belong to.
        grid_id: GridId,
        /// Reserved cells.
        positions: Vec<Position>,
        /// Claimant's display label.
        claimant_label: String,
    },
    /// The grid was sealed and its axis numbers drawn.
    GridSealed {
        /// Sealed grid.
        grid_id: GridId,
    },
}

impl GridEvent {
    /// Grid the event concerns.
    pub fn grid_id(&self) -> GridId {
        match self {
            Self::CellsTaken { grid_id, .. } | Self::GridSealed { grid_id } => *grid_id,
        }
    }
}

/// Notification error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Notification error: {} at {}:{}", message, file, line)]
pub struct NotifyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl NotifyError {
    /// Creates a new notification error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Transport that fans grid events out to connected clients.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: GridEvent) -> Result<(), NotifyError>;
}

/// In-process gateway backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastGateway {
    sender: broadcast::Sender<GridEvent>,
}

impl BroadcastGateway {
    /// Creates a gateway buffering up to `capacity` events per subscriber.
    #[instrument]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.sender.subscribe()
    }

    /// Spawns a subscriber that writes every event to the log.
    ///
    /// The task ends once every clone of the gateway is dropped and resolves
    /// to the number of events it logged.
    #[instrument(skip(self))]
    pub fn log_events(&self) -> JoinHandle<usize> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            let mut logged = 0;
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        info!(grid_id = event.grid_id(), event = ?event, "Grid event");
                        logged += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event log fell behind the broadcast buffer");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!(logged, "Event log closed");
            logged
        })
    }
}

#[async_trait]
impl NotificationGateway for BroadcastGateway {
    async fn publish(&self, event: GridEvent) -> Result<(), NotifyError> {
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(receivers, "Grid event broadcast");
                Ok(())
            }
            Err(broadcast::error::SendError(event)) => {
                debug!(grid_id = event.grid_id(), "No subscribers for grid event");
                Ok(())
            }
        }
    }
}

/// Forwards a committed claim's events to `gateway`.
///
/// Failures are logged and swallowed: the claim has already committed and
/// must not be affected by the transport.
#[instrument(skip(gateway, outcome), fields(grid_id = outcome.grid_id(), claim_id = outcome.claim_id()))]
pub async fn announce(gateway: &dyn NotificationGateway, outcome: &ClaimOutcome) {
    for event in outcome.events() {
        if let Err(e) = gateway.publish(event).await {
            warn!(error = %e, "Failed to publish grid event");
        }
    }
}
