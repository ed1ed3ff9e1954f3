//! Forwards log events to the telemetry channel as formatted lines.
//!
//! The forwarder is one sink subscriber. For every event it builds a single
//! display line and hands it to [`TelemetryChannel::write_message`]:
//!
//! ```text
//! {component}({caller_info}) {timestamp}: {message}, Properties: {k=v, ...}
//! ```
//!
//! The timestamp uses a fixed round-trippable UTC form with seven fractional
//! digits (100 ns resolution), e.g. `2024-01-01T00:00:00.0000000Z`, so lines
//! produced on different hosts collate and parse identically.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};

use crate::event::LogEvent;
use crate::sink::LogObserver;
use crate::telemetry::TelemetryChannel;

/// Subscriber that renders each event and writes it to telemetry.
///
/// Rendering is pure and the channel write is fire-and-forget, so `on_event`
/// never panics across the observer boundary and never blocks on
/// acknowledgment.
pub struct EventForwarder {
    channel: Arc<dyn TelemetryChannel>,
}

impl EventForwarder {
    /// Creates a forwarder writing to `channel`.
    #[must_use]
    pub fn new(channel: Arc<dyn TelemetryChannel>) -> Self {
        Self { channel }
    }
}

impl LogObserver for EventForwarder {
    fn on_event(&self, event: &LogEvent) {
        self.channel.write_message(&render_line(event));
    }
}

/// Renders one event into its display line.
#[must_use]
pub fn render_line(event: &LogEvent) -> String {
    let mut line = format!(
        "{}({}) {}: {}, Properties: ",
        event.component,
        event.caller_info,
        round_trip_timestamp(&event.timestamp),
        event.message,
    );
    for (i, (key, value)) in event.properties.iter().enumerate() {
        if i > 0 {
            line.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(line, "{key}={value}");
    }
    line
}

/// Formats a timestamp in the fixed round-trippable form with seven
/// fractional digits.
///
/// Chrono has no 100 ns fractional specifier, so the tick count is rendered
/// by hand from the nanosecond field.
#[must_use]
pub fn round_trip_timestamp(timestamp: &DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        timestamp.format("%Y-%m-%dT%H:%M:%S"),
        timestamp.nanosecond() % 1_000_000_000 / 100,
    )
}
