// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Service Host Core
//!
//! Building blocks for the bootstrap of a hosted service process:
//!
//! - [`sink`]: process-wide structured log fan-out with snapshot delivery
//! - [`forwarder`]: renders log events into fixed display lines for the
//!   telemetry channel
//! - [`fault`]: process panic hook and unobserved-task failure capture
//! - [`runtime`]: the registration seam to the service runtime, plus the
//!   in-process tokio-backed implementation
//! - [`bootstrap`]: the entry sequence tying it all together
//!
//! The sink, telemetry channel and runtime are constructed once by the
//! process entry code and passed explicitly; there is no ambient global
//! state apart from the panic hook, which the platform only offers
//! process-wide.

#![deny(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]

/// Process entry sequence and the handle it returns
pub mod bootstrap;

/// Environment-driven host configuration
pub mod config;

/// Host error taxonomy
pub mod error;

/// Structured log events and severity levels
pub mod event;

/// Panic hook and unobserved-task failure capture
pub mod fault;

/// Event-to-telemetry line forwarding
pub mod forwarder;

/// Service runtime registration interface
pub mod runtime;

/// Log event fan-out
pub mod sink;

/// Telemetry channel interface
pub mod telemetry;

pub use bootstrap::{BootstrapHandle, BootstrapStatus, ServiceBootstrap};
pub use config::HostConfig;
pub use error::HostError;
pub use event::{LogEvent, LogLevel};
pub use runtime::{
    HostedService, RegistrationError, ServiceContext, ServiceFactory, ServiceRuntime,
    TokioServiceRuntime,
};
pub use sink::{LogObserver, LogSink, Subscription};
pub use telemetry::{TelemetryChannel, TracingTelemetry};
