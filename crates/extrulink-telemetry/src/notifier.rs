use std::fmt;

use chrono::NaiveDateTime;
use extrulink_frame::Frame;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default number of events a slow subscriber may fall behind by.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// One accepted inbound record, as shown on the live feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LiveEvent {
    /// A simulator row, verbatim.
    Line { text: String },
    /// A binary reading with a mapped id.
    #[serde(rename_all = "camelCase")]
    Message {
        received_at: NaiveDateTime,
        id: u8,
        value: u32,
        hex: String,
    },
}

impl LiveEvent {
    pub fn line(text: impl Into<String>) -> Self {
        LiveEvent::Line { text: text.into() }
    }

    pub fn message(frame: &Frame, received_at: NaiveDateTime) -> Self {
        LiveEvent::Message {
            received_at,
            id: frame.id,
            value: frame.value,
            hex: frame.to_hex(),
        }
    }
}

impl fmt::Display for LiveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveEvent::Line { text } => f.write_str(text),
            LiveEvent::Message {
                received_at, hex, ..
            } => write!(f, "{}: {hex}", received_at.format("%H:%M:%S")),
        }
    }
}

/// Fan-out of live events to any number of subscribers.
///
/// Publishing never blocks. A subscriber that falls more than the capacity
/// behind loses the oldest events and sees `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<LiveEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event; returns how many subscribers will see it.
    pub fn publish(&self, event: LiveEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
