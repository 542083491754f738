//! End-to-end session lifecycle tests over a scripted in-process client.
//!
//! These tests drive the full stack: panel open (remoting + front attach),
//! UI-visible lifecycle events, and the recording state machine, with the
//! wire replaced by a scripted [`ClientLike`] implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use serde_json::{Value, json};

use remrec::{
    PanelSurface, ProfilerFrontFactory, RecorderFront, RecordingState, SessionEvent,
    SessionEventKind, SessionPanel,
};
use remrec_runtime::connection::{ClientLike, Remoting, Target};
use remrec_runtime::error::{Error, Result};

/// Client replying to the recording protocol from a fixed script.
struct ScriptedClient {
    sent: Mutex<Vec<String>>,
    fail_start_with: Option<String>,
    results: Value,
}

impl ScriptedClient {
    fn new(results: Value) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_start_with: None,
            results,
        })
    }

    fn failing_start(message: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_start_with: Some(message.to_string()),
            results: Value::Null,
        })
    }
}

impl ClientLike for ScriptedClient {
    fn send_message(
        &self,
        _form: &Value,
        method: &str,
        _params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        self.sent.lock().push(method.to_string());
        let reply = match method {
            "startRecording" => match &self.fail_start_with {
                Some(message) => Err(Error::Protocol(message.clone())),
                None => Ok(Value::Null),
            },
            "stopRecording" => Ok(self.results.clone()),
            other => Err(Error::Protocol(format!("unknown method: {other}"))),
        };
        Box::pin(async move { reply })
    }

    fn is_closed(&self) -> bool {
        false
    }
}

struct HostRemoting {
    calls: AtomicU32,
}

impl HostRemoting {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }
}

impl Remoting for HostRemoting {
    fn make_remote(
        &self,
        target: Target,
    ) -> Pin<Box<dyn Future<Output = Result<Target>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(Target::remote(target.client(), target.form().clone())) })
    }
}

/// Surface capturing the front it was handed.
struct CapturingSurface {
    front: Mutex<Option<Arc<dyn RecorderFront>>>,
}

impl CapturingSurface {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            front: Mutex::new(None),
        })
    }
}

impl PanelSurface for CapturingSurface {
    fn start(&self, front: Arc<dyn RecorderFront>) {
        *self.front.lock() = Some(front);
    }
}

fn panel_over(
    client: Arc<ScriptedClient>,
    remoting: Arc<HostRemoting>,
    surface: Arc<CapturingSurface>,
) -> Arc<SessionPanel> {
    SessionPanel::new(
        Target::local(client, json!({"actor": "profiler1"})),
        remoting,
        Arc::new(ProfilerFrontFactory),
        surface as Arc<dyn PanelSurface>,
    )
}

#[tokio::test]
async fn full_recording_cycle_over_the_wire() {
    let client = ScriptedClient::new(json!({"duration": 42}));
    let remoting = HostRemoting::new();
    let surface = CapturingSurface::new();
    let panel = panel_over(Arc::clone(&client), Arc::clone(&remoting), Arc::clone(&surface));

    panel.open().await.unwrap();
    assert!(panel.is_ready());
    assert_eq!(remoting.calls.load(Ordering::SeqCst), 1);
    assert!(surface.front.lock().is_some());

    let bus = panel.bus();
    let observed = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        SessionEventKind::RecordingStarted,
        SessionEventKind::RecordingStopped,
    ] {
        let observed = Arc::clone(&observed);
        bus.on(kind, move |event| observed.lock().push(event.clone()));
    }

    let controller = panel.controller().unwrap();
    controller.start_recording().await.unwrap();

    let results = controller.stop_recording().await.unwrap();
    assert_eq!(results, json!({"duration": 42}));
    assert_eq!(controller.state(), RecordingState::Idle);

    let observed = observed.lock();
    assert_eq!(observed.len(), 2);
    assert!(matches!(observed[0], SessionEvent::RecordingStarted));
    assert!(
        matches!(&observed[1], SessionEvent::RecordingStopped(payload) if *payload == json!({"duration": 42}))
    );

    assert_eq!(
        *client.sent.lock(),
        vec!["startRecording".to_string(), "stopRecording".to_string()]
    );
}

#[tokio::test]
async fn ui_events_drive_a_full_cycle() {
    let client = ScriptedClient::new(json!({"frames": []}));
    let panel = panel_over(client, HostRemoting::new(), CapturingSurface::new());
    panel.open().await.unwrap();

    let bus = panel.bus();
    let controller = panel.controller().unwrap();

    bus.emit(SessionEvent::UiStartRecording);
    tokio::task::yield_now().await;
    assert_eq!(controller.state(), RecordingState::Recording);

    let stopped = bus.wait_for(SessionEventKind::RecordingStopped);
    bus.emit(SessionEvent::UiStopRecording);
    tokio::task::yield_now().await;

    let event = stopped.await.unwrap();
    assert!(matches!(event, SessionEvent::RecordingStopped(payload) if payload == json!({"frames": []})));
    assert_eq!(controller.state(), RecordingState::Idle);
}

#[tokio::test]
async fn start_timeout_rolls_back_without_started_event() {
    let client = ScriptedClient::failing_start("timeout");
    let panel = panel_over(client, HostRemoting::new(), CapturingSurface::new());
    panel.open().await.unwrap();

    let started = Arc::new(AtomicU32::new(0));
    let started_for_handler = Arc::clone(&started);
    panel.bus().on(SessionEventKind::RecordingStarted, move |_| {
        started_for_handler.fetch_add(1, Ordering::SeqCst);
    });

    let controller = panel.controller().unwrap();
    let err = controller.start_recording().await.unwrap_err();

    assert!(matches!(err, Error::Start(_)));
    assert!(err.recording_cause().unwrap().to_string().contains("timeout"));
    assert_eq!(controller.state(), RecordingState::Idle);
    assert_eq!(started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn destroy_after_open_tears_down_ui_adapters() {
    let client = ScriptedClient::new(Value::Null);
    let panel = panel_over(client, HostRemoting::new(), CapturingSurface::new());
    panel.open().await.unwrap();

    let bus = panel.bus();
    let controller = panel.controller().unwrap();
    panel.destroy();
    assert!(panel.is_destroyed());

    bus.emit(SessionEvent::UiStartRecording);
    tokio::task::yield_now().await;
    assert_eq!(controller.state(), RecordingState::Idle);
}
