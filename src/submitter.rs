//! Transaction submitter - validate, submit and confirm one native transfer
//!
//! Validation runs entirely before the signer is touched, in this order:
//!
//! | Check | Error |
//! |-------|-------|
//! | recipient and amount present | `MissingField` |
//! | recipient is a 20-byte hex address (EIP-55 if mixed case) | `InvalidRecipient` |
//! | amount is a positive decimal, at most 18 places | `InvalidAmount` |
//! | balance known and amount strictly below it | `BalanceUnknown` / `InsufficientFunds` |

use alloy_primitives::{Address, TxHash};
use serde::Serialize;
use std::sync::Arc;

use crate::core::NativeAmount;
use crate::networks::ChainId;
use crate::provider::{ProviderError, TransactionReceipt, TransactionSigner};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid recipient address '{0}'")]
    InvalidRecipient(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("balance not loaded yet")]
    BalanceUnknown,
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: NativeAmount, available: NativeAmount },
    #[error("transaction rejected by user")]
    Rejected,
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("transaction failed: {0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for TransferError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::UserRejected => Self::Rejected,
            other => Self::Provider(other),
        }
    }
}

impl TransferError {
    /// True for errors raised before any signer interaction.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidRecipient(_)
                | Self::InvalidAmount(_)
                | Self::BalanceUnknown
                | Self::InsufficientFunds { .. }
        )
    }
}

/// Successful transfer, handed to the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub receipt: TransactionReceipt,
    pub to: Address,
    pub amount: NativeAmount,
    pub chain_id: ChainId,
}

pub fn parse_recipient(raw: &str) -> Result<Address, TransferError> {
    let invalid = || TransferError::InvalidRecipient(raw.to_string());
    let digits = raw.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| invalid())
    } else {
        raw.parse::<Address>().map_err(|_| invalid())
    }
}

pub fn validate_transfer(
    to: &str,
    amount: &str,
    balance: Option<NativeAmount>,
) -> Result<(Address, NativeAmount), TransferError> {
    let (to, amount) = (to.trim(), amount.trim());
    if to.is_empty() {
        return Err(TransferError::MissingField("recipient"));
    }
    if amount.is_empty() {
        return Err(TransferError::MissingField("amount"));
    }

    let recipient = parse_recipient(to)?;

    let value: NativeAmount = amount
        .parse()
        .map_err(|e: crate::core::AmountError| TransferError::InvalidAmount(e.to_string()))?;
    if value.is_zero() {
        return Err(TransferError::InvalidAmount("amount must be greater than zero".into()));
    }

    let available = balance.ok_or(TransferError::BalanceUnknown)?;
    // Equal is rejected: the transfer must leave room for fees
    if value >= available {
        return Err(TransferError::InsufficientFunds { requested: value, available });
    }
    Ok((recipient, value))
}

pub struct TransactionSubmitter {
    signer: Arc<dyn TransactionSigner>,
    chain_id: ChainId,
}

impl TransactionSubmitter {
    pub fn new(signer: Arc<dyn TransactionSigner>, chain_id: ChainId) -> Self { Self { signer, chain_id } }

    /// Validate, send, then wait for confirmation. Every call is a new transfer.
    pub async fn submit(
        &self,
        to: &str,
        amount: &str,
        balance: Option<NativeAmount>,
    ) -> Result<TransferOutcome, TransferError> {
        let (recipient, value) = validate_transfer(to, amount, balance)?;

        let hash = self.signer.send_transfer(recipient, value).await?;
        tracing::info!(%hash, to = %recipient, amount = %value, chain = %self.chain_id, "transfer submitted");

        let receipt = self.signer.wait_for_receipt(hash).await?;
        if !receipt.success {
            return Err(TransferError::Reverted(hash));
        }
        tracing::info!(%hash, block = ?receipt.block_number, "transfer confirmed");

        Ok(TransferOutcome { receipt, to: recipient, amount: value, chain_id: self.chain_id })
    }
}
