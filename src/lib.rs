//! Beedash: wallet session and network-state core for a single-account EVM dashboard.
//!
//! # Architecture
//!
//! ```text
//! Presentation (snapshots in, intents out)
//!   │
//!   ├── SessionManager (the one mutable session)
//!   │     ├── connect / disconnect / switch_network / send_transaction / refresh_balance
//!   │     ├── event pump      ← accountsChanged / chainChanged
//!   │     └── BalanceRefresher (periodic, bound to one session epoch)
//!   │
//!   ├── WalletProvider (injected capability)
//!   │     └── Eip1193Provider<T: Eip1193Transport>
//!   │           └── HttpTransport (local wallet bridge, native)
//!   │
//!   ├── TransactionSubmitter → TransferOutcome → TransactionLog
//!   │
//!   └── networks (static chain table)
//! ```
//!
//! # Intents
//!
//! | Intent | Method | Effect |
//! |--------|--------|--------|
//! | connect | `session.connect()` | Prompt for an account, bind to the active chain |
//! | disconnect | `session.disconnect()` | Clear account, chain, balance and signer |
//! | switch | `session.switch_network(id)` | Ask the wallet to switch (or add) a chain |
//! | send | `session.send_transaction(to, amount)` | Validate, submit, confirm, refresh balance |
//! | refresh | `session.refresh_balance()` | Refetch balance; failures are only logged |
//!
//! # Features
//!
//! - `native` - HTTP wallet bridge, log subscriber, `beedash` CLI
//!
//! # Usage
//!
//! ```ignore
//! use beedash::{DashConfig, Eip1193Provider, HttpTransport, SessionManager};
//! use std::sync::Arc;
//!
//! let config = DashConfig::from_env()?;
//! let transport = HttpTransport::new(config.provider_url.clone());
//! let provider = Arc::new(Eip1193Provider::new(transport, &config));
//! let session = SessionManager::new(provider, config);
//!
//! session.start().await?;
//! session.connect().await?;
//! let outcome = session.send_transaction("0x5aAe...", "0.1").await?;
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod config;
pub mod core;
pub mod history;
pub mod networks;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod submitter;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::{ConfigError, DashConfig};
pub use core::{AmountError, NativeAmount};
pub use history::{TransactionLog, TransactionRecord, TransactionStatus};
pub use networks::{ChainDescriptor, ChainId, NetworkError};
pub use provider::{
    Eip1193Provider, Eip1193Transport, ProviderError, ProviderEvent, Subscription, TransactionReceipt,
    TransactionSigner, WalletProvider,
};
pub use runtime::{install_signal_handlers, Shutdown};
pub use session::{ConnectionStatus, SessionError, SessionManager, SessionSnapshot};
pub use submitter::{TransactionSubmitter, TransferError, TransferOutcome};

#[cfg(feature = "native")]
pub use provider::HttpTransport;
