//! Event types for the RedValid event system
//!
//! Views publish state changes on an [`EventBus`] instead of calling back
//! into whatever front end is rendering them. Any number of front ends (the
//! command-line shell, tests) can subscribe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Phase of an upload attempt currently in flight
///
/// At most one phase is active at a time; `None` means idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    /// Generic loading (connecting the wallet, looking up the reporter)
    Loading,
    /// Creating the reporter profile
    Registering,
    /// Backend is hashing the artifact and building the unsigned transaction
    Preparing,
    /// Waiting on the wallet to sign
    Signing,
}

impl UploadPhase {
    pub fn label(&self) -> &'static str {
        match self {
            UploadPhase::Loading => "Loading",
            UploadPhase::Registering => "Registering reporter",
            UploadPhase::Preparing => "Preparing transaction",
            UploadPhase::Signing => "Waiting for wallet signature",
        }
    }
}

/// RedValid event types
///
/// Serialized with an internal `type` tag so events can be forwarded as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RedValidEvent {
    /// Wallet session established (silent reconnect or explicit connect)
    WalletConnected {
        address: String,
        timestamp: DateTime<Utc>,
    },

    /// Local wallet session cleared
    WalletDisconnected { timestamp: DateTime<Utc> },

    /// Reporter profile created for a wallet
    ReporterRegistered {
        wallet_address: String,
        timestamp: DateTime<Utc>,
    },

    /// Active upload phase changed (`None` = no phase active)
    UploadPhaseChanged {
        attempt_id: Uuid,
        phase: Option<UploadPhase>,
        timestamp: DateTime<Utc>,
    },

    /// Upload attempt finished successfully
    UploadCompleted {
        attempt_id: Uuid,
        /// True when the backend reported the artifact as already recorded
        already_registered: bool,
        tx_hash: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Upload attempt stopped with a user-facing message
    UploadFailed {
        attempt_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A verification query produced a result
    QueryCompleted {
        found: bool,
        verified: bool,
        timestamp: DateTime<Utc>,
    },
}

impl RedValidEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            RedValidEvent::WalletConnected { .. } => "WalletConnected",
            RedValidEvent::WalletDisconnected { .. } => "WalletDisconnected",
            RedValidEvent::ReporterRegistered { .. } => "ReporterRegistered",
            RedValidEvent::UploadPhaseChanged { .. } => "UploadPhaseChanged",
            RedValidEvent::UploadCompleted { .. } => "UploadCompleted",
            RedValidEvent::UploadFailed { .. } => "UploadFailed",
            RedValidEvent::QueryCompleted { .. } => "QueryCompleted",
        }
    }
}

/// Broadcast bus for [`RedValidEvent`]s
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RedValidEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers start lagging
    ///
    /// # Examples
    ///
    /// ```
    /// use redvalid_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RedValidEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RedValidEvent,
    ) -> Result<usize, broadcast::error::SendError<RedValidEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RedValidEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
