//! Polling event source for transports without push notifications
//!
//! Polls `eth_accounts` and `eth_chainId` and emits `AccountsChanged` /
//! `ChainChanged` only when the answer differs from the previous poll. The
//! first successful poll is the baseline and emits nothing.

use alloy_primitives::Address;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::eip1193::{parse_accounts, parse_chain_id, Eip1193Transport};
use super::{EventReceiver, EventSender, ProviderEvent, Subscription};
use crate::core::rpc::method;
use crate::networks::ChainId;

pub struct ProviderWatcher<T> {
    transport: Arc<T>,
    interval: Duration,
}

impl<T: Eip1193Transport> ProviderWatcher<T> {
    pub fn new(transport: Arc<T>, interval: Duration) -> Self { Self { transport, interval } }

    /// Start polling. Stops when the subscription is dropped or the receiver closes.
    pub fn spawn(self) -> (Subscription, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(tx));
        (Subscription::from_task(task), rx)
    }

    async fn run(self, tx: EventSender) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut accounts: Option<Vec<Address>> = None;
        let mut chain: Option<ChainId> = None;

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => {}
            }

            match self.transport.request(method::ACCOUNTS, json!([])).await.and_then(|v| parse_accounts(&v)) {
                Ok(current) => {
                    if accounts.as_ref().is_some_and(|prev| *prev != current)
                        && tx.send(ProviderEvent::AccountsChanged(current.clone())).is_err()
                    {
                        break;
                    }
                    accounts = Some(current);
                }
                Err(e) => tracing::debug!(error = %e, "accounts poll failed"),
            }

            match self.transport.request(method::CHAIN_ID, json!([])).await.and_then(|v| parse_chain_id(&v)) {
                Ok(current) => {
                    if chain.is_some_and(|prev| prev != current)
                        && tx.send(ProviderEvent::ChainChanged(current)).is_err()
                    {
                        break;
                    }
                    chain = Some(current);
                }
                Err(e) => tracing::debug!(error = %e, "chain poll failed"),
            }
        }
        tracing::debug!("provider watcher stopped");
    }
}
