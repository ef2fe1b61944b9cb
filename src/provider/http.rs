//! HTTP wallet bridge - JSON-RPC 2.0 over HTTP
//!
//! For wallets that expose the injected-provider methods on a local endpoint
//! (Frame listens on `http://127.0.0.1:1248`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Eip1193Transport, ProviderError};

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Option<String>,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl HttpTransport {
    /// `None` models a host with no wallet installed.
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.filter(|url| !url.trim().is_empty()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> Option<&str> { self.endpoint.as_deref() }
}

#[async_trait]
impl Eip1193Transport for HttpTransport {
    fn is_available(&self) -> bool { self.endpoint.is_some() }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let endpoint = self.endpoint.as_deref().ok_or(ProviderError::Unavailable)?;
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("{method} json decode failed: {e}")))?;

        if let Some(err) = body.error {
            return Err(ProviderError::from_rpc(err.code, err.message, err.data.as_ref()));
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("{method} status {status}")));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }
}
