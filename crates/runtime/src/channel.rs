//! Channel - RPC communication proxy for protocol fronts.
//!
//! The Channel provides a typed interface for sending requests to the remote
//! end on behalf of a front. Every front holds a Channel bound to one
//! `(client, form)` pair; the binding never changes for the lifetime of the
//! front.

use crate::connection::ClientLike;
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Channel provides RPC communication for a front.
///
/// Requests are addressed by the form the channel was bound to at attach
/// time and routed through the owning client handle.
#[derive(Clone)]
pub struct Channel {
    form: Value,
    client: Arc<dyn ClientLike>,
}

impl Channel {
    /// Creates a new Channel bound to the given client and form.
    pub fn new(client: Arc<dyn ClientLike>, form: Value) -> Self {
        Self { form, client }
    }

    /// Sends a method call to the remote end and awaits the response.
    pub async fn send<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        let response = self
            .client
            .send_message(&self.form, method, params_value)
            .await?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Sends a method call with no parameters.
    pub async fn send_no_params<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
        self.send(method, Value::Null).await
    }

    /// Sends a method call that returns no result (void).
    pub async fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: Value = self.send(method, params).await?;
        Ok(())
    }

    /// Returns the form this channel is bound to.
    pub fn form(&self) -> &Value {
        &self.form
    }
}
