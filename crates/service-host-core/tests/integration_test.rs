// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use service_host_core::{
    BootstrapStatus, HostConfig, HostedService, LogEvent, LogLevel, LogSink, ServiceBootstrap,
    ServiceContext, ServiceFactory, TelemetryChannel, TokioServiceRuntime,
};

/// Telemetry channel that records every write for assertions.
#[derive(Default)]
struct RecordingChannel {
    messages: Mutex<Vec<String>>,
    readiness: Mutex<Vec<(u32, String)>>,
    failures: Mutex<Vec<String>>,
}

impl TelemetryChannel for RecordingChannel {
    fn write_message(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    fn write_readiness(&self, process_id: u32, service_type_name: &str) {
        self.readiness
            .lock()
            .unwrap()
            .push((process_id, service_type_name.to_string()));
    }

    fn write_startup_failure(&self, error_detail: &str) {
        self.failures.lock().unwrap().push(error_detail.to_string());
    }
}

/// Service that logs one event through the sink, then parks on its context.
struct ChattyService {
    sink: LogSink,
}

#[async_trait]
impl HostedService for ChattyService {
    async fn run(self: Box<Self>, ctx: ServiceContext) {
        self.sink.publish(
            &LogEvent::new(
                LogLevel::Info,
                ctx.service_type_name.clone(),
                "integration_test.rs",
                "instance up",
            )
            .with_property("instance", "0"),
        );
        ctx.shutdown.cancelled().await;
    }
}

fn chatty_factory(sink: LogSink) -> ServiceFactory {
    Arc::new(move |_ctx| {
        Box::new(ChattyService { sink: sink.clone() }) as Box<dyn HostedService>
    })
}

fn test_config(service_type_name: &str) -> HostConfig {
    HostConfig {
        service_type_name: service_type_name.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_end_to_end_startup_and_event_forwarding() {
    let sink = LogSink::new();
    let telemetry = Arc::new(RecordingChannel::default());
    let runtime = Arc::new(TokioServiceRuntime::new(sink.clone()));

    let bootstrap = ServiceBootstrap::new(
        test_config("ChattyType"),
        sink.clone(),
        Arc::clone(&telemetry) as Arc<dyn TelemetryChannel>,
        Arc::clone(&runtime) as Arc<dyn service_host_core::ServiceRuntime>,
    );

    let handle = bootstrap
        .start(chatty_factory(sink.clone()))
        .await
        .expect("startup must succeed");
    assert_eq!(handle.status().await, BootstrapStatus::Running);

    // Exactly one readiness record, carrying this process's id.
    {
        let readiness = telemetry.readiness.lock().unwrap();
        assert_eq!(readiness.len(), 1);
        assert_eq!(readiness[0], (std::process::id(), "ChattyType".to_string()));
    }

    // The instance's event reaches the telemetry channel through the
    // forwarder, rendered as a display line.
    timeout(Duration::from_secs(1), async {
        loop {
            if telemetry
                .messages
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.contains("instance up") && m.contains("Properties: instance=0"))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("instance event never reached telemetry");

    let line = telemetry
        .messages
        .lock()
        .unwrap()
        .iter()
        .find(|m| m.contains("instance up"))
        .cloned()
        .unwrap();
    assert!(line.starts_with("ChattyType(integration_test.rs) "));

    // Park and release.
    runtime.shutdown();
    handle.shutdown();
    timeout(Duration::from_secs(1), handle.wait_for_shutdown())
        .await
        .expect("shutdown wait must resolve");
}

#[tokio::test]
async fn test_startup_failure_exits_loudly_without_readiness() {
    use service_host_core::{RegistrationError, ServiceRuntime};

    struct UnavailableRuntime;

    #[async_trait]
    impl ServiceRuntime for UnavailableRuntime {
        async fn register(
            &self,
            _service_type_name: &str,
            _factory: ServiceFactory,
        ) -> Result<(), RegistrationError> {
            Err(RegistrationError::Unavailable(
                "orchestrator unavailable".to_string(),
            ))
        }
    }

    let sink = LogSink::new();
    let telemetry = Arc::new(RecordingChannel::default());
    let bootstrap = ServiceBootstrap::new(
        test_config("DoomedType"),
        sink.clone(),
        Arc::clone(&telemetry) as Arc<dyn TelemetryChannel>,
        Arc::new(UnavailableRuntime),
    );

    let err = bootstrap
        .start(chatty_factory(sink))
        .await
        .expect_err("startup must fail");
    assert!(err.to_string().contains("orchestrator unavailable"));

    let failures = telemetry.failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("orchestrator unavailable"));
    assert!(telemetry.readiness.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_registration_across_bootstraps_fails() {
    let sink = LogSink::new();
    let runtime = Arc::new(TokioServiceRuntime::new(sink.clone()));

    let first = ServiceBootstrap::new(
        test_config("SharedType"),
        sink.clone(),
        Arc::new(RecordingChannel::default()) as Arc<dyn TelemetryChannel>,
        Arc::clone(&runtime) as Arc<dyn service_host_core::ServiceRuntime>,
    );
    first
        .start(chatty_factory(sink.clone()))
        .await
        .expect("first startup must succeed");

    let telemetry = Arc::new(RecordingChannel::default());
    let second = ServiceBootstrap::new(
        test_config("SharedType"),
        sink.clone(),
        Arc::clone(&telemetry) as Arc<dyn TelemetryChannel>,
        Arc::clone(&runtime) as Arc<dyn service_host_core::ServiceRuntime>,
    );
    let err = second
        .start(chatty_factory(sink))
        .await
        .expect_err("second startup must fail");

    assert!(err.to_string().contains("SharedType"));
    assert_eq!(telemetry.failures.lock().unwrap().len(), 1);

    runtime.shutdown();
}
