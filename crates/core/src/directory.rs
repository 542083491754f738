//! Discovery and selection of live runtimes.
//!
//! A [`RuntimeDirectory`] holds the advisory set of discoverable remote
//! endpoints and latches onto the first local one that appears. The directory
//! models "connect to the first local runtime found, then stop looking": once
//! a selection is made it is never re-evaluated, even if later updates add or
//! remove candidates.
//!
//! Only the main-process discovery path is supported; per-target discovery is
//! not implemented.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{BusEvent, EventBus};

/// Transport class of a discoverable runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Local,
    Usb,
    Network,
}

/// A discoverable remote endpoint capable of hosting debuggable targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    kind: RuntimeKind,
    id: String,
}

impl Runtime {
    pub fn new(kind: RuntimeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> RuntimeKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Events raised by a [`RuntimeDirectory`].
#[derive(Debug, Clone)]
pub enum DirectoryEvent {
    /// The candidate set changed.
    ListUpdated,
    /// A runtime was latched as the directory's selection.
    RuntimeSelected(Runtime),
}

/// Key identifying a [`DirectoryEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryEventKind {
    ListUpdated,
    RuntimeSelected,
}

impl BusEvent for DirectoryEvent {
    type Key = DirectoryEventKind;

    fn key(&self) -> DirectoryEventKind {
        match self {
            DirectoryEvent::ListUpdated => DirectoryEventKind::ListUpdated,
            DirectoryEvent::RuntimeSelected(_) => DirectoryEventKind::RuntimeSelected,
        }
    }
}

/// Discovers candidate runtimes and exposes a stable selection.
///
/// "No selection yet" is a valid steady state: if no local runtime ever
/// appears the directory simply remains unselected.
pub struct RuntimeDirectory {
    runtimes: Mutex<Vec<Runtime>>,
    selection: Mutex<Option<Runtime>>,
    bus: Arc<EventBus<DirectoryEvent>>,
}

impl RuntimeDirectory {
    /// Creates an empty, unselected directory.
    pub fn new() -> Self {
        Self {
            runtimes: Mutex::new(Vec::new()),
            selection: Mutex::new(None),
            bus: Arc::new(EventBus::new()),
        }
    }

    /// Begins discovery: spawns a loop applying every update received on the
    /// channel until the sender side is dropped.
    pub fn init(
        self: &Arc<Self>,
        mut updates: mpsc::UnboundedReceiver<Vec<Runtime>>,
    ) -> JoinHandle<()> {
        let directory = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(runtimes) = updates.recv().await {
                directory.apply_update(runtimes);
            }
            tracing::debug!("Runtime discovery channel closed");
        })
    }

    /// Replaces the candidate set and, while unselected, latches the first
    /// local runtime in listed order.
    pub fn apply_update(&self, runtimes: Vec<Runtime>) {
        tracing::debug!(count = runtimes.len(), "Runtime list updated");
        *self.runtimes.lock() = runtimes;
        self.bus.emit(DirectoryEvent::ListUpdated);

        let mut selection = self.selection.lock();
        if selection.is_some() {
            // Selection is latched; later updates never re-trigger it.
            return;
        }

        let local = self
            .runtimes
            .lock()
            .iter()
            .find(|runtime| runtime.kind() == RuntimeKind::Local)
            .cloned();

        if let Some(runtime) = local {
            tracing::debug!(id = runtime.id(), "Selected local runtime");
            *selection = Some(runtime.clone());
            drop(selection);
            self.bus.emit(DirectoryEvent::RuntimeSelected(runtime));
        }
    }

    /// Returns the latched selection, if one has been made.
    pub fn selected(&self) -> Option<Runtime> {
        self.selection.lock().clone()
    }

    /// Returns the current candidate set.
    pub fn runtimes(&self) -> Vec<Runtime> {
        self.runtimes.lock().clone()
    }

    /// Returns the directory's event bus.
    pub fn bus(&self) -> Arc<EventBus<DirectoryEvent>> {
        Arc::clone(&self.bus)
    }
}

impl Default for RuntimeDirectory {
    fn default() -> Self {
        Self::new()
    }
}
