//! Transaction history - in-memory, most recent first, gone at process exit

use alloy_primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::core::NativeAmount;
use crate::networks::{self, ChainId};
use crate::submitter::TransferOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub to: Address,
    pub amount: NativeAmount,
    pub chain_id: ChainId,
    pub submitted_at: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl TransactionRecord {
    pub fn from_outcome(outcome: &TransferOutcome, submitted_at: DateTime<Utc>) -> Self {
        Self {
            hash: outcome.receipt.hash,
            to: outcome.to,
            amount: outcome.amount,
            chain_id: outcome.chain_id,
            submitted_at,
            status: TransactionStatus::Success,
        }
    }

    pub fn explorer_url(&self) -> String {
        networks::resolve(self.chain_id).explorer_tx_url(&self.hash.to_string())
    }
}

#[derive(Debug, Default)]
pub struct TransactionLog {
    records: VecDeque<TransactionRecord>,
}

impl TransactionLog {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, outcome: &TransferOutcome) -> &TransactionRecord {
        self.records.push_front(TransactionRecord::from_outcome(outcome, Utc::now()));
        &self.records[0]
    }

    /// Most recent first
    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> { self.records.iter() }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
