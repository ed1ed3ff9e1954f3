// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Registration interface to the service runtime.
//!
//! The runtime is the external collaborator that owns service instances:
//! the host hands it a `(service type name, factory)` pair and the runtime
//! calls back into the factory to create instances on tasks it schedules.
//!
//! [`TokioServiceRuntime`] is the in-process implementation: registration,
//! instantiation and spawning, nothing else. Restart and placement policy
//! belong to whatever supervises the process.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::fault;
use crate::sink::LogSink;

/// Context the runtime hands to each hosted service instance.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Name of the registered service type this instance belongs to.
    pub service_type_name: String,
    /// Cancelled by the runtime when the instance should stop.
    pub shutdown: CancellationToken,
}

/// One hosted service instance.
///
/// The runtime drives `run` on a task it owns; `run` should return promptly
/// once the context's shutdown token is cancelled.
#[async_trait]
pub trait HostedService: Send {
    /// Runs the instance to completion.
    async fn run(self: Box<Self>, ctx: ServiceContext);
}

/// Produces one hosted service instance from a runtime-provided context.
pub type ServiceFactory = Arc<dyn Fn(ServiceContext) -> Box<dyn HostedService> + Send + Sync>;

/// Errors returned by [`ServiceRuntime::register`].
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Service runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Registration rejected: {0}")]
    Rejected(String),

    #[error("Service type already registered: {0}")]
    AlreadyRegistered(String),
}

/// Accepts service type registrations.
#[async_trait]
pub trait ServiceRuntime: Send + Sync {
    /// Registers a service type. Completes once the runtime has accepted
    /// the registration and owns the instance lifecycle.
    async fn register(
        &self,
        service_type_name: &str,
        factory: ServiceFactory,
    ) -> Result<(), RegistrationError>;
}

/// In-process runtime backed by the tokio scheduler.
///
/// Each accepted registration instantiates one service via the factory and
/// spawns its `run` on a detached task watched by the fault capture, so a
/// panicking instance surfaces as an unobserved task failure instead of
/// vanishing. `shutdown` cancels every instance's context token.
pub struct TokioServiceRuntime {
    sink: LogSink,
    shutdown: CancellationToken,
    registered: Mutex<Vec<String>>,
}

impl TokioServiceRuntime {
    /// Creates a runtime that logs instance faults to `sink`.
    #[must_use]
    pub fn new(sink: LogSink) -> Self {
        Self {
            sink,
            shutdown: CancellationToken::new(),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Requests shutdown of every hosted instance.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[async_trait]
impl ServiceRuntime for TokioServiceRuntime {
    async fn register(
        &self,
        service_type_name: &str,
        factory: ServiceFactory,
    ) -> Result<(), RegistrationError> {
        let mut registered = self.registered.lock().await;
        if registered.iter().any(|name| name == service_type_name) {
            return Err(RegistrationError::AlreadyRegistered(
                service_type_name.to_string(),
            ));
        }
        registered.push(service_type_name.to_string());
        drop(registered);

        let ctx = ServiceContext {
            service_type_name: service_type_name.to_string(),
            shutdown: self.shutdown.child_token(),
        };
        let instance = factory(ctx.clone());
        let task = tokio::spawn(instance.run(ctx));
        fault::observe_task(&self.sink, task);

        debug!("service type {service_type_name} registered");
        Ok(())
    }
}
