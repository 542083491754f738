//! Session panel orchestration.
//!
//! A [`SessionPanel`] wires one host-visible panel instance together: it
//! remotes the owning target, attaches the recording front, hands the front
//! to the host's content surface, and stands up a [`RecordingController`]
//! over it. The host only sees the open/destroy lifecycle and the `Ready` /
//! `Destroyed` events on the panel bus.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use remrec_runtime::connection::{RemoteConnection, Remoting, Target};
use remrec_runtime::error::Result;

use crate::controller::RecordingController;
use crate::events::{EventBus, SessionEvent};
use crate::front::{FrontFactory, RecorderFront};
use crate::prefs::PrefBranch;

/// Host-owned content surface a freshly attached front is handed to.
pub trait PanelSurface: Send + Sync {
    fn start(&self, front: Arc<dyn RecorderFront>);
}

/// One host-visible panel instance orchestrating connection and recording.
pub struct SessionPanel {
    target: Mutex<Target>,
    connection: RemoteConnection,
    factory: Arc<dyn FrontFactory>,
    surface: Arc<dyn PanelSurface>,
    bus: Arc<EventBus<SessionEvent>>,
    prefs: Option<Arc<PrefBranch>>,
    controller: Mutex<Option<Arc<RecordingController>>>,
    ready: AtomicBool,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for SessionPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPanel")
            .field("ready", &self.ready)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl SessionPanel {
    /// Creates a closed panel over the host-supplied collaborators.
    pub fn new(
        target: Target,
        remoting: Arc<dyn Remoting>,
        factory: Arc<dyn FrontFactory>,
        surface: Arc<dyn PanelSurface>,
    ) -> Arc<Self> {
        Arc::new(Self {
            target: Mutex::new(target),
            connection: RemoteConnection::new(remoting),
            factory,
            surface,
            bus: Arc::new(EventBus::new()),
            prefs: None,
            controller: Mutex::new(None),
            ready: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Creates a panel whose controller consumes the given preference branch.
    pub fn with_prefs(
        target: Target,
        remoting: Arc<dyn Remoting>,
        factory: Arc<dyn FrontFactory>,
        surface: Arc<dyn PanelSurface>,
        prefs: Arc<PrefBranch>,
    ) -> Arc<Self> {
        Arc::new(Self {
            target: Mutex::new(target),
            connection: RemoteConnection::new(remoting),
            factory,
            surface,
            bus: Arc::new(EventBus::new()),
            prefs: Some(prefs),
            controller: Mutex::new(None),
            ready: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Returns the panel's event bus.
    pub fn bus(&self) -> Arc<EventBus<SessionEvent>> {
        Arc::clone(&self.bus)
    }

    /// Returns the recording controller once the panel has opened.
    pub fn controller(&self) -> Option<Arc<RecordingController>> {
        self.controller.lock().clone()
    }

    /// Returns true once [`open`](Self::open) completed successfully.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Returns true once the panel has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Opens the panel: remotes the target, attaches the front, hands it to
    /// the content surface, and initializes the recording controller. Marks
    /// the panel ready and emits [`SessionEvent::Ready`] last.
    ///
    /// Any failure before that point is reported through the host error
    /// channel and leaves the panel not-ready with nothing emitted; the
    /// caller may retry by calling `open` again.
    pub async fn open(self: &Arc<Self>) -> Result<Arc<Self>> {
        match self.open_inner().await {
            Ok(()) => Ok(Arc::clone(self)),
            Err(error) => {
                tracing::error!(%error, "Session panel open failed");
                Err(error)
            }
        }
    }

    async fn open_inner(&self) -> Result<()> {
        // Local debugging needs to make the target remote first.
        let target = self.target.lock().clone();
        let target = self.connection.ensure_remote(target).await?;
        *self.target.lock() = target.clone();

        let factory = Arc::clone(&self.factory);
        let front = self
            .connection
            .attach_front(&target, |client, form| factory.create(client, form))
            .await?;

        self.surface.start(Arc::clone(&front));

        let controller = Arc::new(match &self.prefs {
            Some(prefs) => RecordingController::with_prefs(
                front,
                Arc::clone(&self.bus),
                Arc::clone(prefs),
            ),
            None => RecordingController::new(front, Arc::clone(&self.bus)),
        });
        controller.initialize();
        *self.controller.lock() = Some(controller);

        self.ready.store(true, Ordering::SeqCst);
        self.bus.emit(SessionEvent::Ready);
        Ok(())
    }

    /// Destroys the panel, tearing down the controller's subscriptions.
    ///
    /// Idempotent: the destroyed flag is set strictly before `Destroyed` is
    /// emitted, and a second call is a no-op, so `Destroyed` fires exactly
    /// once.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.ready.store(false, Ordering::SeqCst);
        if let Some(controller) = self.controller.lock().take() {
            controller.destroy();
        }
        self.bus.emit(SessionEvent::Destroyed);
    }
}
