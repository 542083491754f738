//! Remote target lifecycle and front attachment.
//!
//! This module owns the transition of a (possibly local) debuggee into a
//! remote-capable one, and the attachment of a protocol front over the
//! resulting connection:
//!
//! - [`ClientLike`] is the host-owned connection handle a session talks through
//! - [`Target`] is the addressable debuggee, local or remote
//! - [`Remoting`] is the host-provided operation that makes a target remote
//! - [`RemoteConnection`] drives `ensure_remote` / `attach_front` during
//!   session open
//!
//! The transport behind [`ClientLike`] is externally defined; this layer only
//! correlates a target's capability descriptor (its *form*) with the handle
//! that can route messages to it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};

/// Trait defining the interface a session needs from a connection handle.
///
/// The handle is owned by the host; sessions only route requests through it.
/// Implementations must be cheap to share (`Arc<dyn ClientLike>`).
pub trait ClientLike: Send + Sync {
    /// Sends a request addressed by the recipient's form and awaits the reply.
    fn send_message(
        &self,
        form: &Value,
        method: &str,
        params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;

    /// Returns true once the underlying transport can no longer carry
    /// requests. Attaching a front to a closed client fails.
    fn is_closed(&self) -> bool;
}

/// An addressable remote-or-local debuggee.
///
/// Supplied by the host and outliving any session; this layer only reads it
/// and transitions it to remote via [`RemoteConnection::ensure_remote`]. The
/// `form` is an opaque capability descriptor understood by the client.
#[derive(Clone)]
pub struct Target {
    is_remote: bool,
    form: Value,
    client: Arc<dyn ClientLike>,
}

impl Target {
    /// Creates a local target that still needs remoting before use.
    pub fn local(client: Arc<dyn ClientLike>, form: Value) -> Self {
        Self {
            is_remote: false,
            form,
            client,
        }
    }

    /// Creates an already-remote target.
    pub fn remote(client: Arc<dyn ClientLike>, form: Value) -> Self {
        Self {
            is_remote: true,
            form,
            client,
        }
    }

    /// Returns true if the target is already remote-capable.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns the capability descriptor for this target.
    pub fn form(&self) -> &Value {
        &self.form
    }

    /// Returns the connection handle this target is reachable through.
    pub fn client(&self) -> Arc<dyn ClientLike> {
        Arc::clone(&self.client)
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("is_remote", &self.is_remote)
            .field("form", &self.form)
            .finish()
    }
}

/// Host-provided remoting operation.
///
/// Turns a local [`Target`] into a remote one. The returned future resolves
/// with the now-remote target or rejects if remoting cannot be established.
pub trait Remoting: Send + Sync {
    fn make_remote(
        &self,
        target: Target,
    ) -> Pin<Box<dyn Future<Output = Result<Target>> + Send + '_>>;
}

/// Owns the lifecycle of turning a target remote and attaching fronts to it.
///
/// One instance per session panel. `ensure_remote` must be called at most
/// once per open cycle; callers must not race two calls on the same target.
pub struct RemoteConnection {
    remoting: Arc<dyn Remoting>,
}

impl RemoteConnection {
    /// Creates a connection helper over the host's remoting operation.
    pub fn new(remoting: Arc<dyn Remoting>) -> Self {
        Self { remoting }
    }

    /// Ensures the target is remote, remoting it if necessary.
    ///
    /// Idempotent on an already-remote target: resolves immediately with the
    /// same target and performs no remoting call.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if the host remoting operation rejects.
    pub async fn ensure_remote(&self, target: Target) -> Result<Target> {
        if target.is_remote() {
            tracing::debug!("Target already remote, skipping remoting");
            return Ok(target);
        }

        tracing::debug!("Remoting local target");
        self.remoting
            .make_remote(target)
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }

    /// Constructs exactly one front bound to the target's `(client, form)`
    /// pair using the supplied factory.
    ///
    /// # Errors
    ///
    /// [`Error::Attach`] if the client is closed or the factory fails.
    pub async fn attach_front<F>(
        &self,
        target: &Target,
        factory: impl FnOnce(Arc<dyn ClientLike>, Value) -> Result<F>,
    ) -> Result<F> {
        let client = target.client();
        if client.is_closed() {
            return Err(Error::Attach("client transport is closed".to_string()));
        }

        factory(client, target.form().clone()).map_err(|e| Error::Attach(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct FakeClient {
        closed: AtomicBool,
    }

    impl FakeClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                closed: AtomicBool::new(false),
            })
        }
    }

    impl ClientLike for FakeClient {
        fn send_message(
            &self,
            _form: &Value,
            _method: &str,
            _params: Value,
        ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
            Box::pin(async { Ok(Value::Null) })
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    struct CountingRemoting {
        calls: AtomicU32,
        fail: bool,
    }

    impl CountingRemoting {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail,
            })
        }
    }

    impl Remoting for CountingRemoting {
        fn make_remote(
            &self,
            target: Target,
        ) -> Pin<Box<dyn Future<Output = Result<Target>> + Send + '_>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(Error::Protocol("remoting refused".to_string()))
                } else {
                    Ok(Target::remote(target.client(), target.form().clone()))
                }
            })
        }
    }

    #[tokio::test]
    async fn ensure_remote_remotes_local_target() {
        let remoting = CountingRemoting::new(false);
        let conn = RemoteConnection::new(remoting.clone());
        let target = Target::local(FakeClient::new(), json!({"actor": "profiler1"}));

        let remote = conn.ensure_remote(target).await.unwrap();

        assert!(remote.is_remote());
        assert_eq!(remoting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_remote_is_idempotent_on_remote_target() {
        let remoting = CountingRemoting::new(false);
        let conn = RemoteConnection::new(remoting.clone());
        let target = Target::remote(FakeClient::new(), json!({"actor": "profiler1"}));

        let first = conn.ensure_remote(target).await.unwrap();
        let second = conn.ensure_remote(first.clone()).await.unwrap();

        assert!(first.is_remote());
        assert!(second.is_remote());
        assert_eq!(first.form(), second.form());
        assert_eq!(remoting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ensure_remote_maps_host_rejection_to_connection_error() {
        let conn = RemoteConnection::new(CountingRemoting::new(true));
        let target = Target::local(FakeClient::new(), json!({}));

        let err = conn.ensure_remote(target).await.unwrap_err();

        assert!(matches!(err, Error::Connection(_)));
        assert!(err.to_string().contains("remoting refused"));
    }

    #[tokio::test]
    async fn attach_front_passes_client_and_form_to_factory() {
        let conn = RemoteConnection::new(CountingRemoting::new(false));
        let form = json!({"actor": "profiler7"});
        let target = Target::remote(FakeClient::new(), form.clone());

        let attached_form = conn
            .attach_front(&target, |_client, form| Ok(form))
            .await
            .unwrap();

        assert_eq!(attached_form, form);
    }

    #[tokio::test]
    async fn attach_front_fails_on_closed_client() {
        let conn = RemoteConnection::new(CountingRemoting::new(false));
        let client = FakeClient::new();
        client.closed.store(true, Ordering::SeqCst);
        let target = Target::remote(client, json!({}));

        let err = conn
            .attach_front(&target, |_client, form| Ok(form))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Attach(_)));
    }

    #[tokio::test]
    async fn attach_front_wraps_factory_failure() {
        let conn = RemoteConnection::new(CountingRemoting::new(false));
        let target = Target::remote(FakeClient::new(), json!({}));

        let err = conn
            .attach_front(&target, |_client, _form| -> Result<()> {
                Err(Error::Protocol("unknown actor".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Attach(_)));
        assert!(err.to_string().contains("unknown actor"));
    }
}
