// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod heartbeat;
mod logger;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use service_host_core::{
    HostConfig, HostError, LogSink, ServiceBootstrap, ServiceRuntime, TokioServiceRuntime,
    TracingTelemetry,
};

use crate::heartbeat::HeartbeatService;
use crate::logger::Formatter;

#[tokio::main]
pub async fn main() -> Result<(), HostError> {
    let config = HostConfig::from_env()?;

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(config.log_level.clone())
                .expect("could not parse log level in configuration"),
        )
        .event_format(Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let sink = LogSink::new();
    let telemetry = Arc::new(TracingTelemetry::new());
    let runtime = Arc::new(TokioServiceRuntime::new(sink.clone()));

    let bootstrap = ServiceBootstrap::new(
        config.clone(),
        sink.clone(),
        telemetry,
        Arc::clone(&runtime) as Arc<dyn ServiceRuntime>,
    );
    let factory = HeartbeatService::factory(
        sink,
        Duration::from_secs(config.heartbeat_interval_secs),
    );

    let handle = match bootstrap.start(factory).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Service host startup failed: {e}");
            return Err(e);
        }
    };

    // The runtime drives the service on its own tasks from here; stay alive
    // until a shutdown request or an interrupt releases the wait.
    tokio::select! {
        () = handle.wait_for_shutdown() => {
            info!("Shutdown requested, exiting");
        }
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for interrupt: {e}");
            }
            info!("Interrupt received, shutting down");
            runtime.shutdown();
            handle.shutdown();
        }
    }

    Ok(())
}
