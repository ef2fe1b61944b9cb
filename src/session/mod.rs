//! Wallet session manager - connection lifecycle and network state
//!
//! # State machine
//!
//! ```text
//!                 connect()
//! Disconnected ─────────────→ Connecting ──ok──→ Connected ⇄ accountsChanged([a])
//!      ↑                          │                  │
//!      │                     rejected/failed    chainChanged
//!      │                          ↓                  ↓
//!      └──── disconnect() ──── Error          Connecting (silent reconnect)
//!      └──── accountsChanged([]) ───────────────────┘
//! ```
//!
//! All state lives in one `SessionState` behind a mutex that is never held
//! across an await. Every async completion carries the epoch it started
//! under and is dropped when the epoch moved on, so a connect resolving after
//! `disconnect()` or a balance fetched for a replaced account never lands.
//!
//! Observers read [`SessionSnapshot`]s from a `watch` channel.

mod refresh;

use alloy_primitives::Address;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::DashConfig;
use crate::core::NativeAmount;
use crate::networks::{self, ChainDescriptor, ChainId, DEFAULT_SYMBOL};
use crate::provider::{ProviderError, ProviderEvent, TransactionSigner, WalletProvider};
use crate::submitter::{TransactionSubmitter, TransferError, TransferOutcome};

use refresh::BalanceRefresher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ConnectionFailure {
    UserRejected,
    ProviderFailure(String),
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRejected => f.write_str("connection request rejected"),
            Self::ProviderFailure(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no wallet provider installed")]
    NotAvailable,
    #[error("connection request rejected")]
    Rejected,
    #[error("{0}")]
    Provider(String),
    #[error("wallet not connected")]
    NotConnected,
    #[error("network switch rejected")]
    SwitchRejected,
    #[error("network switch failed: {0}")]
    SwitchFailed(String),
    #[error("connection attempt superseded")]
    Superseded,
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Read-only view for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub network_name: Option<String>,
    pub symbol: String,
    pub balance: Option<NativeAmount>,
    pub has_signer: bool,
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            account: None,
            chain_id: None,
            network_name: None,
            symbol: DEFAULT_SYMBOL.into(),
            balance: None,
            has_signer: false,
            error: None,
        }
    }
}

/// Account and chain exist together or not at all.
struct ActiveSession {
    account: Address,
    chain: ChainDescriptor,
    signer: Option<Arc<dyn TransactionSigner>>,
    balance: Option<NativeAmount>,
}

enum Connection {
    Disconnected,
    Connecting,
    Connected(ActiveSession),
    Error(ConnectionFailure),
}

struct SessionState {
    connection: Connection,
    epoch: u64,
    refresher: Option<BalanceRefresher>,
}

impl SessionState {
    /// Bump the epoch and stop the refresher bound to the old one.
    fn advance(&mut self) -> u64 {
        self.epoch += 1;
        if let Some(refresher) = self.refresher.take() {
            refresher.stop();
        }
        self.epoch
    }

    fn active(&mut self, epoch: u64) -> Option<&mut ActiveSession> {
        if self.epoch != epoch {
            return None;
        }
        match &mut self.connection {
            Connection::Connected(session) => Some(session),
            _ => None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        match &self.connection {
            Connection::Disconnected => SessionSnapshot::default(),
            Connection::Connecting => SessionSnapshot { status: ConnectionStatus::Connecting, ..Default::default() },
            Connection::Error(failure) => SessionSnapshot {
                status: ConnectionStatus::Error,
                error: Some(failure.to_string()),
                ..Default::default()
            },
            Connection::Connected(s) => SessionSnapshot {
                status: ConnectionStatus::Connected,
                account: Some(s.account),
                chain_id: Some(s.chain.id),
                network_name: Some(s.chain.display_name.clone()),
                symbol: s.chain.native_symbol.clone(),
                balance: s.balance,
                has_signer: s.signer.is_some(),
                error: None,
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Attempt {
    /// `eth_requestAccounts`; may prompt, failures surface as `Error`
    Interactive,
    /// `eth_accounts`; no prompt, failures fall back to `Disconnected`
    Silent,
}

struct Inner {
    provider: Arc<dyn WalletProvider>,
    config: DashConfig,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &SessionState) {
        let next = state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn current_epoch(&self) -> u64 { self.lock().epoch }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().ok().and_then(Option::take) {
            pump.abort();
        }
    }
}

/// Owner of the single wallet session. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn WalletProvider>, config: DashConfig) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                state: Mutex::new(SessionState { connection: Connection::Disconnected, epoch: 0, refresher: None }),
                snapshots,
                pump: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot { self.inner.snapshots.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> { self.inner.snapshots.subscribe() }

    pub fn config(&self) -> &DashConfig { &self.inner.config }

    /// Signing capability of the connected account, if any.
    pub fn signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        match &self.inner.lock().connection {
            Connection::Connected(s) => s.signer.clone(),
            _ => None,
        }
    }

    /// Subscribe to provider events and silently restore an authorized session.
    pub async fn start(&self) -> Result<(), SessionError> {
        if !self.inner.provider.is_available() {
            tracing::info!("no wallet provider; session stays disconnected");
            return Ok(());
        }
        let (subscription, mut events) = self
            .inner
            .provider
            .subscribe()
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;

        let weak = Arc::downgrade(&self.inner);
        let pump = tokio::spawn(async move {
            let _subscription = subscription;
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                SessionManager { inner }.handle_event(event).await;
            }
            tracing::debug!("event pump stopped");
        });
        let previous = self
            .inner
            .pump
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(pump);
        if let Some(previous) = previous {
            previous.abort();
        }

        self.restore().await;
        Ok(())
    }

    /// Reconnect without prompting when the wallet already authorized an
    /// account. Returns whether the session ended up connected.
    pub async fn restore(&self) -> bool {
        let epoch = {
            let mut state = self.inner.lock();
            if !matches!(state.connection, Connection::Disconnected | Connection::Error(_)) {
                return matches!(state.connection, Connection::Connected(_));
            }
            if !self.inner.provider.is_available() {
                return false;
            }
            state.connection = Connection::Connecting;
            let epoch = state.advance();
            self.inner.publish(&state);
            epoch
        };
        match self.establish(epoch, Attempt::Silent).await {
            Ok(()) => matches!(self.inner.lock().connection, Connection::Connected(_)),
            Err(e) => {
                tracing::warn!(error = %e, "silent reconnect failed");
                false
            }
        }
    }

    /// Prompt the wallet for an account and connect to its active chain.
    /// A call while already connected or connecting is a no-op.
    pub async fn connect(&self) -> Result<(), SessionError> {
        let epoch = {
            let mut state = self.inner.lock();
            if matches!(state.connection, Connection::Connected(_) | Connection::Connecting) {
                tracing::debug!("connect ignored; session already active");
                return Ok(());
            }
            if !self.inner.provider.is_available() {
                return Err(SessionError::NotAvailable);
            }
            state.connection = Connection::Connecting;
            let epoch = state.advance();
            self.inner.publish(&state);
            epoch
        };
        tracing::info!("connecting wallet");
        self.establish(epoch, Attempt::Interactive).await
    }

    /// Forget the session. Synchronous and idempotent; the wallet's own
    /// authorization is left untouched.
    pub fn disconnect(&self) {
        let mut state = self.inner.lock();
        let was_active = !matches!(state.connection, Connection::Disconnected);
        state.connection = Connection::Disconnected;
        state.advance();
        self.inner.publish(&state);
        if was_active {
            tracing::info!("wallet disconnected");
        }
    }

    /// Ask the wallet to switch chains, adding the chain when it is unknown.
    /// The session itself moves only when the resulting `chainChanged` arrives.
    pub async fn switch_network(&self, target: ChainId) -> Result<(), SessionError> {
        let current = match &self.inner.lock().connection {
            Connection::Connected(s) => s.chain.id,
            _ => return Err(SessionError::NotConnected),
        };
        if current == target {
            return Ok(());
        }

        let chain = networks::resolve(target);
        tracing::info!(from = %current, to = %target, "switching network");
        match self.inner.provider.switch_chain(&chain).await {
            Ok(()) => Ok(()),
            Err(ProviderError::UserRejected) => Err(SessionError::SwitchRejected),
            Err(ProviderError::UnrecognizedChain(_)) => self.add_network(&chain).await,
            Err(e) => Err(SessionError::SwitchFailed(e.to_string())),
        }
    }

    async fn add_network(&self, chain: &ChainDescriptor) -> Result<(), SessionError> {
        if chain.rpc_endpoints.is_empty() {
            return Err(SessionError::SwitchFailed(format!("no RPC endpoint known for chain {}", chain.id)));
        }
        tracing::info!(chain = %chain.id, "chain unknown to wallet; adding it");
        match self.inner.provider.add_chain(chain).await {
            Ok(()) => Ok(()),
            Err(ProviderError::UserRejected) => Err(SessionError::SwitchRejected),
            Err(e) => Err(SessionError::SwitchFailed(e.to_string())),
        }
    }

    /// Transfer native currency from the connected account, then refresh the balance once.
    pub async fn send_transaction(&self, to: &str, amount: &str) -> Result<TransferOutcome, SessionError> {
        let (signer, chain_id, balance) = match &self.inner.lock().connection {
            Connection::Connected(ActiveSession { signer: Some(signer), chain, balance, .. }) => {
                (signer.clone(), chain.id, *balance)
            }
            _ => return Err(SessionError::NotConnected),
        };

        let outcome = TransactionSubmitter::new(signer, chain_id).submit(to, amount, balance).await?;
        self.refresh_balance().await;
        Ok(outcome)
    }

    /// Refetch the balance of the connected account. Failures are logged, not returned.
    pub async fn refresh_balance(&self) {
        let (epoch, account) = {
            let state = self.inner.lock();
            match &state.connection {
                Connection::Connected(s) => (state.epoch, s.account),
                _ => return,
            }
        };

        match self.inner.provider.balance(account).await {
            Ok(balance) => {
                let mut state = self.inner.lock();
                match state.active(epoch) {
                    Some(session) if session.account == account => {
                        session.balance = Some(balance);
                        self.inner.publish(&state);
                    }
                    _ => tracing::debug!(%account, "discarding stale balance"),
                }
            }
            Err(e) => tracing::warn!(%account, error = %e, "balance refresh failed"),
        }
    }

    /// Reconcile a provider-originated event into the session.
    pub async fn handle_event(&self, event: ProviderEvent) {
        tracing::debug!(event = event.name(), ?event, "provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => self.disconnect(),
                Some(&account) => self.switch_account(account).await,
            },
            ProviderEvent::ChainChanged(chain) => self.reinitialize(chain).await,
        }
    }

    async fn switch_account(&self, account: Address) {
        let epoch = {
            let mut state = self.inner.lock();
            let Connection::Connected(session) = &mut state.connection else {
                tracing::debug!(%account, "accounts changed while not connected; ignored");
                return;
            };
            if session.account == account {
                return;
            }
            session.account = account;
            session.signer = None;
            session.balance = None;
            let epoch = state.advance();
            self.inner.publish(&state);
            epoch
        };
        tracing::info!(%account, "account changed");

        let signer = match self.inner.provider.signer(account).await {
            Ok(signer) => Some(signer),
            Err(e) => {
                tracing::warn!(%account, error = %e, "signer unavailable for new account");
                None
            }
        };

        {
            let mut state = self.inner.lock();
            let Some(session) = state.active(epoch) else {
                tracing::debug!(%account, "discarding stale account switch");
                return;
            };
            session.signer = signer;
            // the session stays connected without a signer, so it keeps its refresh timer
            state.refresher = Some(self.spawn_refresher(epoch));
            self.inner.publish(&state);
        }
        self.refresh_balance().await;
    }

    /// Chain switches invalidate every derived handle: rebuild the session from scratch.
    async fn reinitialize(&self, chain: ChainId) {
        let epoch = {
            let mut state = self.inner.lock();
            if !matches!(state.connection, Connection::Connected(_) | Connection::Connecting) {
                tracing::debug!(%chain, "chain changed while disconnected; ignored");
                return;
            }
            state.connection = Connection::Connecting;
            let epoch = state.advance();
            self.inner.publish(&state);
            epoch
        };
        tracing::info!(%chain, "chain changed; reinitializing session");
        if let Err(e) = self.establish(epoch, Attempt::Silent).await {
            tracing::warn!(%chain, error = %e, "reinitialization failed");
        }
    }

    /// Resolve account, chain and signer, then commit if `epoch` is still current.
    async fn establish(&self, epoch: u64, attempt: Attempt) -> Result<(), SessionError> {
        let resolved = self.resolve_session(attempt).await;

        {
            let mut state = self.inner.lock();
            if state.epoch != epoch || !matches!(state.connection, Connection::Connecting) {
                tracing::debug!(epoch, "discarding superseded connection attempt");
                return Err(SessionError::Superseded);
            }
            let (next, result) = match (resolved, attempt) {
                (Ok(Some(session)), _) => {
                    tracing::info!(account = %session.account, chain = %session.chain.id, "wallet connected");
                    state.refresher = Some(self.spawn_refresher(epoch));
                    (Connection::Connected(session), Ok(()))
                }
                (Ok(None), Attempt::Silent) => (Connection::Disconnected, Ok(())),
                (Ok(None), Attempt::Interactive) => {
                    let msg = "wallet returned no accounts".to_string();
                    (Connection::Error(ConnectionFailure::ProviderFailure(msg.clone())), Err(SessionError::Provider(msg)))
                }
                (Err(e), Attempt::Silent) => (Connection::Disconnected, Err(SessionError::Provider(e.to_string()))),
                (Err(ProviderError::UserRejected), Attempt::Interactive) => {
                    tracing::info!("connection request rejected");
                    (Connection::Error(ConnectionFailure::UserRejected), Err(SessionError::Rejected))
                }
                (Err(ProviderError::Unavailable), Attempt::Interactive) => {
                    let failure = ConnectionFailure::ProviderFailure(ProviderError::Unavailable.to_string());
                    (Connection::Error(failure), Err(SessionError::NotAvailable))
                }
                (Err(e), Attempt::Interactive) => {
                    tracing::warn!(error = %e, "connection failed");
                    (Connection::Error(ConnectionFailure::ProviderFailure(e.to_string())), Err(SessionError::Provider(e.to_string())))
                }
            };
            state.connection = next;
            self.inner.publish(&state);
            if result.is_err() || !matches!(state.connection, Connection::Connected(_)) {
                return result;
            }
        }

        self.refresh_balance().await;
        Ok(())
    }

    async fn resolve_session(&self, attempt: Attempt) -> Result<Option<ActiveSession>, ProviderError> {
        let provider = &self.inner.provider;
        let accounts = match attempt {
            Attempt::Interactive => provider.request_accounts().await?,
            Attempt::Silent => provider.accounts().await?,
        };
        let Some(&account) = accounts.first() else {
            return Ok(None);
        };
        let chain = networks::resolve(provider.active_chain().await?);
        let signer = provider.signer(account).await?;
        Ok(Some(ActiveSession { account, chain, signer: Some(signer), balance: None }))
    }

    fn spawn_refresher(&self, epoch: u64) -> BalanceRefresher {
        BalanceRefresher::spawn(Arc::downgrade(&self.inner), epoch, self.inner.config.refresh_interval)
    }

    /// Stop background work: the event pump and the balance refresher.
    pub fn shutdown(&self) {
        let pump = self.inner.pump.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(pump) = pump {
            pump.abort();
        }
        if let Some(refresher) = self.inner.lock().refresher.take() {
            refresher.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_snapshot_defaults_symbol() {
        let state = SessionState { connection: Connection::Disconnected, epoch: 0, refresher: None };
        let snap = state.snapshot();
        assert_eq!(snap.status, ConnectionStatus::Disconnected);
        assert_eq!(snap.symbol, "ETH");
        assert!(snap.account.is_none() && snap.chain_id.is_none());
    }

    #[test]
    fn error_snapshot_carries_message() {
        let state = SessionState {
            connection: Connection::Error(ConnectionFailure::ProviderFailure("rpc down".into())),
            epoch: 3,
            refresher: None,
        };
        let snap = state.snapshot();
        assert_eq!(snap.status, ConnectionStatus::Error);
        assert_eq!(snap.error.as_deref(), Some("rpc down"));
        assert!(!snap.has_signer);
    }

    #[test]
    fn snapshot_serializes_lowercase_status() {
        let json = serde_json::to_value(SessionSnapshot::default()).unwrap();
        assert_eq!(json["status"], "disconnected");
        assert_eq!(json["symbol"], "ETH");
        assert!(json["balance"].is_null());
    }
}
