//! Periodic balance refresh bound to one session epoch

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{Inner, SessionManager};

/// Cancellable refresh task. Aborted on drop; exits by itself once its
/// epoch is superseded or the manager is gone.
pub(super) struct BalanceRefresher {
    task: JoinHandle<()>,
}

impl BalanceRefresher {
    pub(super) fn spawn(inner: Weak<Inner>, epoch: u64, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else { break };
                if inner.current_epoch() != epoch {
                    break;
                }
                tracing::trace!(epoch, "balance refresh tick");
                SessionManager { inner }.refresh_balance().await;
            }
        });
        Self { task }
    }

    pub(super) fn stop(self) { self.task.abort(); }
}

impl Drop for BalanceRefresher {
    fn drop(&mut self) { self.task.abort(); }
}
