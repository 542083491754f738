//! remrec: recording session layer for remote debugging targets
//!
//! This crate drives one bounded start→stop recording interaction against a
//! remote debuggee. The host supplies the connection handle, the target, and
//! the UI; this layer owns the session lifecycle between them:
//!
//! - [`EventBus`] decouples the host UI from the session components
//! - [`RuntimeDirectory`] discovers live runtimes and latches the first local one
//! - [`SessionPanel`] opens a session: remote the target, attach a front,
//!   stand up a controller
//! - [`RecordingController`] runs the `Idle → Starting → Recording → Stopping`
//!   state machine over the attached [`RecorderFront`]
//! - [`PreferenceChannel`] feeds configuration refreshes into the controller
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use remrec::{ProfilerFrontFactory, SessionEvent, SessionEventKind, SessionPanel};
//! use remrec_runtime::Target;
//!
//! # async fn open_session(
//! #     target: Target,
//! #     remoting: Arc<dyn remrec_runtime::Remoting>,
//! #     surface: Arc<dyn remrec::PanelSurface>,
//! # ) -> remrec_runtime::Result<()> {
//! let panel = SessionPanel::new(target, remoting, Arc::new(ProfilerFrontFactory), surface);
//! panel.open().await?;
//!
//! let controller = panel.controller().expect("panel is ready");
//! controller.start_recording().await?;
//! let results = controller.stop_recording().await?;
//! println!("recorded: {results}");
//!
//! panel.destroy();
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod directory;
pub mod events;
pub mod front;
pub mod panel;
pub mod prefs;

// Re-export key types at crate root
pub use controller::{RecordingController, RecordingState};
pub use directory::{DirectoryEvent, DirectoryEventKind, Runtime, RuntimeDirectory, RuntimeKind};
pub use events::{BusEvent, EventBus, SessionEvent, SessionEventKind, Subscription};
pub use front::{FrontFactory, ProfilerFront, ProfilerFrontFactory, RecorderFront};
pub use panel::{PanelSurface, SessionPanel};
pub use prefs::{ObserverId, PrefBranch, PrefStore, PreferenceChannel};

// Re-export the runtime error taxonomy for callers of this crate
pub use remrec_runtime::{Error, Result};
