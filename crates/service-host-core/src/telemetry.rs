// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Telemetry channel consumed by the bootstrap and the event forwarder.
//!
//! The channel is the platform event sink: fire-and-forget writes, unbounded
//! capacity, no acknowledgment. Three record kinds exist: free-form
//! messages, the one readiness record a successful startup emits, and the
//! one failure record an unsuccessful startup emits.

use tracing::{error, info};

/// External telemetry sink.
///
/// All writes are fire-and-forget; implementations must not block the caller
/// indefinitely and must not panic across this boundary.
pub trait TelemetryChannel: Send + Sync {
    /// Writes one free-form message line.
    fn write_message(&self, text: &str);

    /// Records that the service type was registered and the host is running.
    fn write_readiness(&self, process_id: u32, service_type_name: &str);

    /// Records that host startup failed, with the full error detail.
    fn write_startup_failure(&self, error_detail: &str);
}

/// Telemetry channel backed by `tracing` events under the `telemetry`
/// target.
///
/// This is the stand-in for a platform event stream in environments where
/// the subscriber installed by the binary is the delivery mechanism.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    /// Creates the channel.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryChannel for TracingTelemetry {
    fn write_message(&self, text: &str) {
        info!(target: "telemetry", "{text}");
    }

    fn write_readiness(&self, process_id: u32, service_type_name: &str) {
        info!(
            target: "telemetry",
            process_id,
            service_type_name,
            "service type registered"
        );
    }

    fn write_startup_failure(&self, error_detail: &str) {
        error!(target: "telemetry", "service host initialization failed: {error_detail}");
    }
}
