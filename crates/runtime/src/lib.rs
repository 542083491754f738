//! remrec-runtime - Remote target lifecycle, connection handles, and RPC channel
//!
//! This crate provides the low-level plumbing a recording session needs to
//! talk to a remote debuggee:
//!
//! - **Connection**: turning a local target remote and attaching fronts
//! - **Channel**: form-addressed RPC proxy a front communicates through
//! - **Errors**: the shared error taxonomy for the session layer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   remrec    │  Session layer (controller, panel, directory)
//! └──────┬──────┘
//!        │ builds fronts over Channel
//! ┌──────▼──────────┐
//! │ remrec-runtime  │  This crate
//! │  ┌───────────┐  │
//! │  │ RemoteConn│  │  ensure_remote / attach_front
//! │  └───────────┘  │
//! │  ┌───────────┐  │
//! │  │ Channel   │  │  (client, form)-bound RPC proxy
//! │  └───────────┘  │
//! └─────────────────┘
//! ```
//!
//! The wire transport behind [`ClientLike`] is externally defined; the host
//! owns the handle, sessions only route requests through it.

pub mod channel;
pub mod connection;
pub mod error;

// Re-export key types at crate root
pub use channel::Channel;
pub use connection::{ClientLike, RemoteConnection, Remoting, Target};
pub use error::{Error, Result};
