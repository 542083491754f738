//! Recording lifecycle state machine.
//!
//! The [`RecordingController`] owns one start/stop state machine conducted
//! through an attached [`RecorderFront`] and republishes lifecycle
//! transitions on the session [`EventBus`]:
//!
//! ```text
//! Idle → Starting → Recording → Stopping → Idle → …
//!          │ start failed         │ stop failed
//!          ▼                      ▼
//!         Idle                 Recording
//! ```
//!
//! The state field is the controller's only mutable shared state and is only
//! ever written by `start_recording` / `stop_recording`. Interleavings
//! between independent async chains are handled by the invalid-state guards,
//! not locks held across await points. There is no cancellation: an in-flight
//! front call runs to completion and the caller reacts afterward.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use remrec_runtime::error::{Error, Result};

use crate::events::{EventBus, SessionEvent, SessionEventKind, Subscription};
use crate::front::RecorderFront;
use crate::prefs::{PrefBranch, PreferenceChannel};

/// Position of a controller in its recording lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No session in flight; a new recording may start.
    Idle,
    /// The front's start operation is in flight.
    Starting,
    /// A recording session is live.
    Recording,
    /// The front's stop operation is in flight.
    Stopping,
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecordingState::Idle => "idle",
            RecordingState::Starting => "starting",
            RecordingState::Recording => "recording",
            RecordingState::Stopping => "stopping",
        };
        f.write_str(label)
    }
}

/// Drives the start/stop recording lifecycle against an attached front.
///
/// Exactly one session may be starting or recording at a time per controller;
/// a second start is rejected with [`Error::InvalidState`] while one is in
/// flight.
pub struct RecordingController {
    state: Mutex<RecordingState>,
    front: Arc<dyn RecorderFront>,
    bus: Arc<EventBus<SessionEvent>>,
    prefs: Option<Arc<PrefBranch>>,
    pref_channel: Option<PreferenceChannel>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl RecordingController {
    /// Creates an idle controller over the given front and bus.
    pub fn new(front: Arc<dyn RecorderFront>, bus: Arc<EventBus<SessionEvent>>) -> Self {
        Self {
            state: Mutex::new(RecordingState::Idle),
            front,
            bus,
            prefs: None,
            pref_channel: None,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Creates a controller that also consumes configuration from a
    /// preference branch, refreshed on any change within it.
    pub fn with_prefs(
        front: Arc<dyn RecorderFront>,
        bus: Arc<EventBus<SessionEvent>>,
        prefs: Arc<PrefBranch>,
    ) -> Self {
        let branch_for_refresh = Arc::clone(&prefs);
        let pref_channel = PreferenceChannel::new(
            prefs.store(),
            prefs.branch().to_string(),
            move || branch_for_refresh.refresh(),
        );
        Self {
            state: Mutex::new(RecordingState::Idle),
            front,
            bus,
            prefs: Some(prefs),
            pref_channel: Some(pref_channel),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> RecordingState {
        *self.state.lock()
    }

    /// Returns the configuration branch, if one was supplied.
    pub fn prefs(&self) -> Option<&Arc<PrefBranch>> {
        self.prefs.as_ref()
    }

    /// Wires UI request events to the start/stop operations and begins
    /// observing the preference branch.
    ///
    /// Handlers hold only a weak reference back to the controller, so an
    /// initialized controller can still be dropped.
    pub fn initialize(self: &Arc<Self>) {
        let mut subscriptions = self.subscriptions.lock();

        let weak = Arc::downgrade(self);
        subscriptions.push(self.bus.on(SessionEventKind::UiStartRecording, move |_| {
            Self::spawn_ui_request(&weak, "start", |controller| async move {
                controller.start_recording().await.map(|_| ())
            });
        }));

        let weak = Arc::downgrade(self);
        subscriptions.push(self.bus.on(SessionEventKind::UiStopRecording, move |_| {
            Self::spawn_ui_request(&weak, "stop", |controller| async move {
                controller.stop_recording().await.map(|_| ())
            });
        }));

        if let Some(channel) = &self.pref_channel {
            channel.register();
        }
    }

    /// Removes the UI adapters registered by [`initialize`](Self::initialize)
    /// and stops observing preferences.
    ///
    /// Idempotent. After destroy no UI event can mutate the state machine:
    /// the handlers are removed from the bus, not merely ignored.
    pub fn destroy(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            self.bus.off(subscription);
        }
        if let Some(channel) = &self.pref_channel {
            channel.unregister();
        }
    }

    fn spawn_ui_request<F, Fut>(weak: &Weak<Self>, operation: &'static str, run: F)
    where
        F: FnOnce(Arc<Self>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let Some(controller) = weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(error) = run(controller).await {
                tracing::warn!(%error, operation, "UI-initiated recording request failed");
            }
        });
    }

    /// Starts a recording session.
    ///
    /// Transitions `Idle → Starting`, invokes the front's start operation,
    /// and on success transitions to `Recording` and emits
    /// [`SessionEvent::RecordingStarted`]. On failure rolls back to `Idle`
    /// and returns [`Error::Start`]; no event is emitted.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] (state untouched) unless currently `Idle`.
    pub async fn start_recording(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != RecordingState::Idle {
                return Err(Error::InvalidState {
                    operation: "start recording",
                    state: state.to_string(),
                });
            }
            *state = RecordingState::Starting;
        }

        match self.front.start_recording().await {
            Ok(()) => {
                *self.state.lock() = RecordingState::Recording;
                tracing::debug!("Recording started");
                self.bus.emit(SessionEvent::RecordingStarted);
                Ok(())
            }
            Err(error) => {
                *self.state.lock() = RecordingState::Idle;
                Err(Error::Start(Box::new(error)))
            }
        }
    }

    /// Stops the live recording session.
    ///
    /// Transitions `Recording → Stopping`, invokes the front's stop
    /// operation, and on success transitions to `Idle` and emits
    /// [`SessionEvent::RecordingStopped`] carrying the results payload. On
    /// failure rolls back to `Recording` and returns [`Error::Stop`]; the
    /// session is still live and stop may be retried.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] (state untouched) unless currently `Recording`.
    pub async fn stop_recording(&self) -> Result<serde_json::Value> {
        {
            let mut state = self.state.lock();
            if *state != RecordingState::Recording {
                return Err(Error::InvalidState {
                    operation: "stop recording",
                    state: state.to_string(),
                });
            }
            *state = RecordingState::Stopping;
        }

        match self.front.stop_recording().await {
            Ok(results) => {
                *self.state.lock() = RecordingState::Idle;
                tracing::debug!("Recording stopped");
                self.bus.emit(SessionEvent::RecordingStopped(results.clone()));
                Ok(results)
            }
            Err(error) => {
                *self.state.lock() = RecordingState::Recording;
                Err(Error::Stop(Box::new(error)))
            }
        }
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.destroy();
    }
}
