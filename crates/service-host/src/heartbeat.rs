//! Stand-in hosted service used by the binary.
//!
//! Publishes a heartbeat event through the sink on a fixed interval until
//! its context token is cancelled. The real hosted service is an external
//! collaborator; this instance only exercises the registration and log
//! pipeline wiring.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::interval;
use tracing::debug;

use service_host_core::{HostedService, LogEvent, LogLevel, LogSink, ServiceContext, ServiceFactory};

/// Hosted service that emits one heartbeat event per interval.
pub struct HeartbeatService {
    sink: LogSink,
    period: Duration,
}

impl HeartbeatService {
    /// Factory registering instances of this service with the runtime.
    pub fn factory(sink: LogSink, period: Duration) -> ServiceFactory {
        Arc::new(move |_ctx| {
            Box::new(HeartbeatService {
                sink: sink.clone(),
                period,
            }) as Box<dyn HostedService>
        })
    }
}

#[async_trait]
impl HostedService for HeartbeatService {
    async fn run(self: Box<Self>, ctx: ServiceContext) {
        let mut beat = interval(self.period);
        beat.tick().await; // discard first tick, which is instantaneous

        let mut sequence: u64 = 0;
        loop {
            tokio::select! {
                _ = beat.tick() => {
                    sequence += 1;
                    self.sink.publish(
                        &LogEvent::new(
                            LogLevel::Info,
                            ctx.service_type_name.clone(),
                            "heartbeat",
                            "heartbeat",
                        )
                        .with_property("seq", sequence.to_string()),
                    );
                }
                () = ctx.shutdown.cancelled() => {
                    debug!("heartbeat service stopping after {sequence} beats");
                    break;
                }
            }
        }
    }
}
