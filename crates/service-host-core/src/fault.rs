//! Process-wide fault capture.
//!
//! Two classes of otherwise-silent failure are converted into error-severity
//! log events before the process dies or carries on:
//!
//! - **Unhandled panics** on any thread. [`install`] hooks the process panic
//!   hook once; the hook logs the fault and then chains to the previously
//!   installed hook, so the default fatal behavior proceeds untouched.
//! - **Unobserved task failures**. A detached task whose [`JoinHandle`] is
//!   handed to [`observe_task`] gets a watcher that logs a panic outcome and
//!   consumes the payload, so the fault is observed and cannot escalate.
//!
//! Installation is one-way: the hook is never removed for the lifetime of
//! the process. Calling [`install`] again retargets which sink the hook logs
//! to without stacking hooks.

use std::any::Any;
use std::panic::{self, PanicHookInfo};
use std::sync::{Once, RwLock};

use tokio::task::JoinHandle;

use crate::event::{LogEvent, LogLevel};
use crate::sink::LogSink;

const COMPONENT: &str = "FaultCapture";

static HOOK_SINK: RwLock<Option<LogSink>> = RwLock::new(None);
static HOOK_INSTALL: Once = Once::new();

/// Installs the process panic hook, targeting `sink`.
///
/// The first call installs the hook; subsequent calls only swap the sink the
/// hook publishes to. The hook itself stays installed for the life of the
/// process.
pub fn install(sink: LogSink) {
    match HOOK_SINK.write() {
        Ok(mut guard) => *guard = Some(sink),
        Err(poisoned) => *poisoned.into_inner() = Some(sink),
    }

    HOOK_INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_unhandled(info);
            // Default fatal behavior proceeds; never suppress it here.
            previous(info);
        }));
    });
}

/// Whether the panic hook has been installed.
#[must_use]
pub fn is_installed() -> bool {
    HOOK_INSTALL.is_completed()
}

/// Watches a detached task and logs a panic outcome as an unobserved task
/// failure.
///
/// Taking the panic payload out of the [`JoinError`](tokio::task::JoinError)
/// marks the fault observed; the process continues. Task cancellation is not
/// a fault and is not logged.
///
/// Returns the watcher's own handle, mainly so tests can await it.
pub fn observe_task<T>(sink: &LogSink, handle: JoinHandle<T>) -> JoinHandle<()>
where
    T: Send + 'static,
{
    let sink = sink.clone();
    tokio::spawn(async move {
        if let Err(join_error) = handle.await {
            if join_error.is_panic() {
                let payload = join_error.into_panic();
                let event = LogEvent::new(
                    LogLevel::Error,
                    COMPONENT,
                    "detached task",
                    "Unobserved task exception",
                )
                .with_property("payload", payload_string(payload.as_ref()));
                sink.publish(&event);
            }
        }
    })
}

fn log_unhandled(info: &PanicHookInfo<'_>) {
    let sink = match HOOK_SINK.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    let Some(sink) = sink else {
        return;
    };

    let caller_info = info
        .location()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    let event = LogEvent::new(LogLevel::Error, COMPONENT, caller_info, "Unhandled exception")
        .with_property("payload", payload_string(info.payload()));
    sink.publish(&event);
}

/// Best-effort string form of a panic payload. Payloads that are not
/// string-like render a fixed placeholder so the record shape stays stable.
fn payload_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    /// Collects every event published to a sink.
    fn recording_sink() -> (LogSink, Arc<Mutex<Vec<LogEvent>>>) {
        let sink = LogSink::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        let sub = sink.subscribe_fn(move |event| {
            events_clone.lock().unwrap().push(event.clone());
        });
        // Keep the subscription alive for the test's duration.
        std::mem::forget(sub);
        (sink, events)
    }

    #[test]
    fn test_payload_string_str() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(payload_string(payload.as_ref()), "boom");
    }

    #[test]
    fn test_payload_string_owned() {
        let payload: Box<dyn Any + Send> = Box::new("boom owned".to_string());
        assert_eq!(payload_string(payload.as_ref()), "boom owned");
    }

    #[test]
    fn test_payload_string_placeholder_for_non_string() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(payload_string(payload.as_ref()), "<non-string panic payload>");
    }

    #[test]
    #[serial]
    fn test_panic_hook_logs_unhandled_exception() {
        let (sink, events) = recording_sink();
        install(sink);
        assert!(is_installed());

        let handle = thread::spawn(|| {
            panic!("hook test fault 7311");
        });
        assert!(handle.join().is_err());

        let events = events.lock().unwrap();
        let record = events
            .iter()
            .find(|e| e.properties.iter().any(|(_, v)| v.contains("7311")))
            .expect("panic was not logged");
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "Unhandled exception");
        assert_eq!(record.component, COMPONENT);
        // The panic site is carried as caller info.
        assert!(record.caller_info.contains("fault.rs"));
    }

    #[test]
    #[serial]
    fn test_reinstall_retargets_sink() {
        let (first_sink, first_events) = recording_sink();
        install(first_sink);
        let (second_sink, second_events) = recording_sink();
        install(second_sink);

        let handle = thread::spawn(|| {
            panic!("retarget fault 9020");
        });
        assert!(handle.join().is_err());

        let hits = |events: &Arc<Mutex<Vec<LogEvent>>>| {
            events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.properties.iter().any(|(_, v)| v.contains("9020")))
                .count()
        };
        assert_eq!(hits(&first_events), 0);
        assert_eq!(hits(&second_events), 1);
    }

    #[tokio::test]
    async fn test_observe_task_logs_panic_and_process_continues() {
        let (sink, events) = recording_sink();

        let task = tokio::spawn(async {
            panic!("detached fault 5518");
        });
        let watcher = observe_task::<()>(&sink, task);
        watcher.await.expect("watcher must not fail");

        let events = events.lock().unwrap();
        let record = events
            .iter()
            .find(|e| e.message == "Unobserved task exception")
            .expect("task panic was not logged");
        assert_eq!(record.level, LogLevel::Error);
        assert!(record
            .properties
            .iter()
            .any(|(k, v)| k == "payload" && v.contains("5518")));
    }

    #[tokio::test]
    async fn test_observe_task_ignores_cancellation() {
        let (sink, events) = recording_sink();

        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        task.abort();
        let watcher = observe_task(&sink, task);
        watcher.await.expect("watcher must not fail");

        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_observe_task_quiet_on_success() {
        let (sink, events) = recording_sink();

        let task = tokio::spawn(async { 40 + 2 });
        observe_task(&sink, task).await.expect("watcher must not fail");

        assert!(events.lock().unwrap().is_empty());
    }
}
