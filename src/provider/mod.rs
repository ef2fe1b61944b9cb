//! Provider adapter - typed, awaitable view of an injected wallet provider
//!
//! # Architecture
//!
//! ```text
//! SessionManager
//!     │
//!     ├── WalletProvider (trait object, injected at construction)
//!     │     ├── Eip1193Provider<T>   request(method, params) over any transport
//!     │     │     └── HttpTransport  JSON-RPC 2.0 to a local wallet bridge
//!     │     └── test fakes
//!     │
//!     ├── TransactionSigner (capability bound to one account)
//!     │
//!     └── EventReceiver ← accountsChanged / chainChanged
//! ```
//!
//! Every operation may suspend for human approval. No timeouts are imposed.

pub mod eip1193;
pub mod watcher;

#[cfg(feature = "native")]
pub mod http;

pub use eip1193::{Eip1193Provider, Eip1193Signer, Eip1193Transport};
pub use watcher::ProviderWatcher;

#[cfg(feature = "native")]
pub use http::HttpTransport;

use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::rpc::{code, event};
use crate::core::NativeAmount;
use crate::networks::{ChainDescriptor, ChainId};

/// Errors surfaced by the provider layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no wallet provider installed")]
    Unavailable,
    #[error("user rejected the request")]
    UserRejected,
    #[error("unrecognized chain: {0}")]
    UnrecognizedChain(String),
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Classify a JSON-RPC error object.
    ///
    /// Some mobile wallets report an unknown chain as `-32603` with the real
    /// code under `data.originalError.code`.
    pub fn from_rpc(code: i64, message: impl Into<String>, data: Option<&Value>) -> Self {
        let message = message.into();
        let nested = data
            .and_then(|d| d.get("originalError"))
            .and_then(|e| e.get("code"))
            .and_then(Value::as_i64);
        match (code, nested) {
            (code::USER_REJECTED, _) => Self::UserRejected,
            (code::UNRECOGNIZED_CHAIN, _) => Self::UnrecognizedChain(message),
            (code::INTERNAL, Some(code::UNRECOGNIZED_CHAIN)) => Self::UnrecognizedChain(message),
            (code::INTERNAL, Some(code::USER_REJECTED)) => Self::UserRejected,
            _ => Self::Rpc { code, message },
        }
    }
}

/// Event pushed by the provider outside of any request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

impl ProviderEvent {
    /// Wire name of the notification
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountsChanged(_) => event::ACCOUNTS_CHANGED,
            Self::ChainChanged(_) => event::CHAIN_CHANGED,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<ProviderEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ProviderEvent>;

/// Handle that keeps an event subscription alive. Dropping it unsubscribes.
#[derive(Debug, Default)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription with no backing task; delivery stops when the sender is dropped.
    pub fn detached() -> Self { Self { task: None } }

    /// Subscription backed by a delivery task that is aborted on unsubscribe.
    pub fn from_task(task: JoinHandle<()>) -> Self { Self { task: Some(task) } }

    pub fn unsubscribe(mut self) { self.stop(); }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) { self.stop(); }
}

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    /// False when the receipt status is `0x0` (execution reverted)
    pub success: bool,
}

/// Signing capability bound to one account
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Submit a native-currency transfer. Returns once the wallet acknowledges it.
    async fn send_transfer(&self, to: Address, value: NativeAmount) -> Result<TxHash, ProviderError>;

    /// Suspend until the transaction is included in a block.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TransactionReceipt, ProviderError>;
}

/// Typed surface of an injected wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// True only if a provider object exists in the host environment.
    fn is_available(&self) -> bool;

    /// `eth_requestAccounts`; may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_accounts`; never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn active_chain(&self) -> Result<ChainId, ProviderError>;

    async fn balance(&self, account: Address) -> Result<NativeAmount, ProviderError>;

    async fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, ProviderError>;

    /// `wallet_switchEthereumChain`. Fails with `UnrecognizedChain` when the
    /// wallet does not know the chain; the caller then adds it.
    async fn switch_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`.
    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;

    async fn subscribe(&self) -> Result<(Subscription, EventReceiver), ProviderError>;
}
