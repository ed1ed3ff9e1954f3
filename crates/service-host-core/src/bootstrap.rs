// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process entry sequence for the service host.
//!
//! [`ServiceBootstrap::start`] runs once at process start:
//!
//! 1. **Starting**: subscribe an [`EventForwarder`] over the telemetry
//!    channel to the sink and install the process fault capture.
//! 2. **Registering**: hand the `(service type name, factory)` pair to the
//!    runtime and wait for it to accept or refuse.
//! 3. **Running** on success (one readiness record) or **Failed** on
//!    refusal (one startup-failure record, error propagated so the process
//!    exits non-zero). Nothing is retried here; restart policy belongs to
//!    whatever supervises the process.
//!
//! The returned [`BootstrapHandle`] keeps the forwarder subscription alive
//! for the life of the process and exposes `wait_for_shutdown`, which
//! resolves only once `shutdown` is called; the entry code chooses how to
//! park on it.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::error::HostError;
use crate::fault;
use crate::forwarder::EventForwarder;
use crate::runtime::{ServiceFactory, ServiceRuntime};
use crate::sink::{LogSink, Subscription};
use crate::telemetry::TelemetryChannel;

/// Status of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// Wiring the log pipeline and fault capture.
    Starting,
    /// Waiting for the runtime to accept the registration.
    Registering,
    /// Registration accepted; the runtime owns the service lifecycle.
    Running,
    /// Registration refused. Terminal.
    Failed,
}

/// Handle to a bootstrapped host.
///
/// Dropping the handle drops the forwarder subscription, so hold it for the
/// life of the process.
#[derive(Debug)]
pub struct BootstrapHandle {
    status: Arc<RwLock<BootstrapStatus>>,
    status_tx: broadcast::Sender<BootstrapStatus>,
    shutdown_token: CancellationToken,
    _forwarder_subscription: Subscription,
}

impl BootstrapHandle {
    /// Current status.
    pub async fn status(&self) -> BootstrapStatus {
        *self.status.read().await
    }

    /// Check if the host is currently running.
    pub async fn is_running(&self) -> bool {
        matches!(*self.status.read().await, BootstrapStatus::Running)
    }

    /// Get a receiver for status updates.
    #[must_use]
    pub fn status_receiver(&self) -> broadcast::Receiver<BootstrapStatus> {
        self.status_tx.subscribe()
    }

    /// Request shutdown; `wait_for_shutdown` callers resume.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }

    /// Resolves only when [`shutdown`](Self::shutdown) is called. With no
    /// shutdown request this waits forever, keeping the process alive while
    /// the runtime drives the service on its own tasks.
    pub async fn wait_for_shutdown(&self) {
        self.shutdown_token.cancelled().await;
    }
}

/// The process entry sequence.
pub struct ServiceBootstrap {
    config: HostConfig,
    sink: LogSink,
    telemetry: Arc<dyn TelemetryChannel>,
    runtime: Arc<dyn ServiceRuntime>,
}

impl ServiceBootstrap {
    /// Creates a bootstrap over explicitly-injected collaborators.
    #[must_use]
    pub fn new(
        config: HostConfig,
        sink: LogSink,
        telemetry: Arc<dyn TelemetryChannel>,
        runtime: Arc<dyn ServiceRuntime>,
    ) -> Self {
        Self {
            config,
            sink,
            telemetry,
            runtime,
        }
    }

    /// Runs the entry sequence.
    ///
    /// # Errors
    ///
    /// Propagates the runtime's refusal after writing the startup-failure
    /// telemetry record. The caller must let the error surface so the
    /// process exits non-zero instead of idling silently.
    pub async fn start(self, factory: ServiceFactory) -> Result<BootstrapHandle, HostError> {
        let status = Arc::new(RwLock::new(BootstrapStatus::Starting));
        let (status_tx, _status_rx) = broadcast::channel(16);

        let forwarder = EventForwarder::new(Arc::clone(&self.telemetry));
        let subscription = self.sink.subscribe(Arc::new(forwarder));
        fault::install(self.sink.clone());
        debug!("log forwarding and fault capture installed");

        set_status(&status, &status_tx, BootstrapStatus::Registering).await;
        let service_type_name = &self.config.service_type_name;
        match self.runtime.register(service_type_name, factory).await {
            Ok(()) => {
                self.telemetry
                    .write_readiness(std::process::id(), service_type_name);
                set_status(&status, &status_tx, BootstrapStatus::Running).await;
                info!("service type {service_type_name} registered, host running");
                Ok(BootstrapHandle {
                    status,
                    status_tx,
                    shutdown_token: CancellationToken::new(),
                    _forwarder_subscription: subscription,
                })
            }
            Err(e) => {
                self.telemetry.write_startup_failure(&e.to_string());
                set_status(&status, &status_tx, BootstrapStatus::Failed).await;
                Err(HostError::Registration(e))
            }
        }
    }
}

async fn set_status(
    status: &Arc<RwLock<BootstrapStatus>>,
    status_tx: &broadcast::Sender<BootstrapStatus>,
    next: BootstrapStatus,
) {
    *status.write().await = next;
    let _ = status_tx.send(next);
}
