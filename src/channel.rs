//! Update channel between the polling worker and the UI thread.
//!
//! A single producer (the poller) pushes [`UpdateEvent`]s; the single consumer
//! (the UI tick) drains everything currently queued without blocking. Events
//! are applied in the order they were sent.

use core::fmt;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::obd::Dtc;
use crate::sensors::SensorKey;

/// Connection state shown in the status line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ConnectionStatus {
    /// No connection attempt has completed yet.
    #[default]
    Initializing,
    Connected,
    /// The last connection attempt failed; retrying after the backoff.
    Failed,
    /// A live connection was dropped after repeated failures.
    Lost,
}

impl ConnectionStatus {
    /// Text shown in the status line.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING...",
            Self::Connected => "CONNECTED",
            Self::Failed => "CONNECTION FAILED",
            Self::Lost => "CONNECTION LOST",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One message from the poller.
#[derive(Clone, PartialEq, Debug)]
pub enum UpdateEvent {
    /// New reading for one sensor, already in display units.
    /// `active == false` means the query failed or returned nothing.
    Gauge { key: SensorKey, value: f32, active: bool },
    /// Stored trouble codes; `None` when the vehicle reports none.
    Dtc(Option<Vec<Dtc>>),
    Status(ConnectionStatus),
}

impl UpdateEvent {
    pub const fn reading(key: SensorKey, value: f32) -> Self {
        Self::Gauge { key, value, active: true }
    }

    pub const fn inactive(key: SensorKey) -> Self {
        Self::Gauge { key, value: 0.0, active: false }
    }
}

/// Producer half, owned by the poller.
#[derive(Clone, Debug)]
pub struct UpdateSender {
    tx: UnboundedSender<UpdateEvent>,
}

impl UpdateSender {
    /// Queue an event. Returns `false` once the receiver is gone.
    pub fn send(&self, event: UpdateEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the dashboard.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: UnboundedReceiver<UpdateEvent>,
}

impl UpdateReceiver {
    /// Take every queued event, in send order. Never blocks.
    pub fn drain(&mut self) -> Vec<UpdateEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Every sender is gone, i.e. the poller has exited.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}

/// Create a connected sender/receiver pair.
pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}
