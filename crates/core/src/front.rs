//! Protocol fronts for the recording capability.
//!
//! A front is a local RPC stub bound to one `(client, form)` pair at attach
//! time; it is never rebound across a different client or form without being
//! recreated. A front is exclusively owned by the component that attached it
//! and must not be shared across session instances.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use serde_json::Value;

use remrec_runtime::channel::Channel;
use remrec_runtime::connection::ClientLike;
use remrec_runtime::error::Result;

/// RPC stub for a remote recording capability.
///
/// `stop_recording` resolves with the results payload, which is opaque to
/// this layer and forwarded verbatim to listeners.
pub trait RecorderFront: DowncastSync {
    /// Asks the remote end to begin recording.
    fn start_recording(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Asks the remote end to stop recording and hand back the results.
    fn stop_recording(&self) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;
}

impl_downcast!(sync RecorderFront);

/// Factory for constructing a front over a freshly attached target.
///
/// Implementations decide the concrete front type; the session layer only
/// sees `Arc<dyn RecorderFront>`.
pub trait FrontFactory: Send + Sync {
    fn create(&self, client: Arc<dyn ClientLike>, form: Value) -> Result<Arc<dyn RecorderFront>>;
}

/// Default front speaking the profiler protocol over a [`Channel`].
///
/// Issues `startRecording` / `stopRecording` requests addressed by the form
/// the front was bound to.
pub struct ProfilerFront {
    channel: Channel,
}

impl ProfilerFront {
    /// Creates a front bound to the given client and form.
    pub fn new(client: Arc<dyn ClientLike>, form: Value) -> Self {
        Self {
            channel: Channel::new(client, form),
        }
    }

    /// Returns the form this front is bound to.
    pub fn form(&self) -> &Value {
        self.channel.form()
    }
}

impl RecorderFront for ProfilerFront {
    fn start_recording(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.channel
                .send_no_result("startRecording", Value::Null)
                .await
        })
    }

    fn stop_recording(&self) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(async move { self.channel.send("stopRecording", Value::Null).await })
    }
}

impl std::fmt::Debug for ProfilerFront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilerFront")
            .field("form", self.form())
            .finish()
    }
}

/// Factory producing [`ProfilerFront`] instances.
#[derive(Debug, Default)]
pub struct ProfilerFrontFactory;

impl FrontFactory for ProfilerFrontFactory {
    fn create(&self, client: Arc<dyn ClientLike>, form: Value) -> Result<Arc<dyn RecorderFront>> {
        Ok(Arc::new(ProfilerFront::new(client, form)))
    }
}
