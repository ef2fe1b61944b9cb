//! EIP-1193 adapter - `WalletProvider` over a `request(method, params)` transport
//!
//! The transport is the only host capability: an injected provider object, a
//! JSON-RPC bridge, or a scripted fake. Events are synthesized by a
//! [`ProviderWatcher`] polling the same transport.

use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::{
    EventReceiver, ProviderError, ProviderWatcher, Subscription, TransactionReceipt,
    TransactionSigner, WalletProvider,
};
use crate::config::DashConfig;
use crate::core::rpc::{method, LATEST};
use crate::core::NativeAmount;
use crate::networks::{ChainDescriptor, ChainId};

/// Raw request surface of an injected provider
#[async_trait]
pub trait Eip1193Transport: Send + Sync + 'static {
    fn is_available(&self) -> bool;

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

pub struct Eip1193Provider<T> {
    transport: Arc<T>,
    event_poll_interval: Duration,
    receipt_poll_interval: Duration,
}

impl<T: Eip1193Transport> Eip1193Provider<T> {
    pub fn new(transport: T, config: &DashConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    pub fn from_shared(transport: Arc<T>, config: &DashConfig) -> Self {
        Self {
            transport,
            event_poll_interval: config.event_poll_interval,
            receipt_poll_interval: config.receipt_poll_interval,
        }
    }

    pub fn transport(&self) -> &Arc<T> { &self.transport }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        if !self.transport.is_available() {
            return Err(ProviderError::Unavailable);
        }
        tracing::trace!(method, "provider request");
        self.transport.request(method, params).await
    }
}

#[async_trait]
impl<T: Eip1193Transport> WalletProvider for Eip1193Provider<T> {
    fn is_available(&self) -> bool { self.transport.is_available() }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        parse_accounts(&self.call(method::REQUEST_ACCOUNTS, json!([])).await?)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        parse_accounts(&self.call(method::ACCOUNTS, json!([])).await?)
    }

    async fn active_chain(&self) -> Result<ChainId, ProviderError> {
        parse_chain_id(&self.call(method::CHAIN_ID, json!([])).await?)
    }

    async fn balance(&self, account: Address) -> Result<NativeAmount, ProviderError> {
        let raw = self.call(method::GET_BALANCE, json!([account, LATEST])).await?;
        let text = raw
            .as_str()
            .ok_or_else(|| ProviderError::Malformed(format!("balance: string expected, got {raw}")))?;
        NativeAmount::from_hex_quantity(text).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    async fn signer(&self, account: Address) -> Result<Arc<dyn TransactionSigner>, ProviderError> {
        if !self.transport.is_available() {
            return Err(ProviderError::Unavailable);
        }
        Ok(Arc::new(Eip1193Signer {
            transport: self.transport.clone(),
            address: account,
            receipt_poll_interval: self.receipt_poll_interval,
        }))
    }

    async fn switch_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        self.call(method::SWITCH_CHAIN, json!([{ "chainId": chain.hex_id() }])).await?;
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        self.call(method::ADD_CHAIN, json!([chain.add_chain_params()])).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<(Subscription, EventReceiver), ProviderError> {
        if !self.transport.is_available() {
            return Err(ProviderError::Unavailable);
        }
        Ok(ProviderWatcher::new(self.transport.clone(), self.event_poll_interval).spawn())
    }
}

/// Signer that forwards transfers to the wallet behind the transport
pub struct Eip1193Signer<T> {
    transport: Arc<T>,
    address: Address,
    receipt_poll_interval: Duration,
}

#[async_trait]
impl<T: Eip1193Transport> TransactionSigner for Eip1193Signer<T> {
    fn address(&self) -> Address { self.address }

    async fn send_transfer(&self, to: Address, value: NativeAmount) -> Result<TxHash, ProviderError> {
        let tx = json!({
            "from": self.address,
            "to": to,
            "value": value.to_hex_quantity(),
        });
        let raw = self.transport.request(method::SEND_TRANSACTION, json!([tx])).await?;
        parse_tx_hash(&raw)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TransactionReceipt, ProviderError> {
        loop {
            let raw = self
                .transport
                .request(method::GET_TRANSACTION_RECEIPT, json!([hash]))
                .await?;
            if let Some(receipt) = parse_receipt(hash, &raw)? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

pub(crate) fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let items = value
        .as_array()
        .ok_or_else(|| ProviderError::Malformed(format!("accounts: array expected, got {value}")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| ProviderError::Malformed("accounts: string expected".into()))?
                .parse::<Address>()
                .map_err(|e| ProviderError::Malformed(format!("invalid account address: {e}")))
        })
        .collect()
}

pub(crate) fn parse_chain_id(value: &Value) -> Result<ChainId, ProviderError> {
    if let Some(n) = value.as_u64() {
        return Ok(ChainId(n));
    }
    value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("chain id: string or number expected, got {value}")))?
        .parse()
        .map_err(|e: crate::networks::NetworkError| ProviderError::Malformed(e.to_string()))
}

fn parse_tx_hash(value: &Value) -> Result<TxHash, ProviderError> {
    value
        .as_str()
        .ok_or_else(|| ProviderError::Malformed(format!("tx hash: string expected, got {value}")))?
        .parse::<TxHash>()
        .map_err(|e| ProviderError::Malformed(format!("invalid tx hash: {e}")))
}

fn parse_quantity(value: Option<&Value>) -> Option<u64> {
    let text = value?.as_str()?;
    u64::from_str_radix(text.strip_prefix("0x")?, 16).ok()
}

/// `None` while the transaction is still pending.
fn parse_receipt(hash: TxHash, value: &Value) -> Result<Option<TransactionReceipt>, ProviderError> {
    if value.is_null() {
        return Ok(None);
    }
    if !value.is_object() {
        return Err(ProviderError::Malformed(format!("receipt: object expected, got {value}")));
    }
    // Pre-Byzantium receipts carry no status field
    let success = value.get("status").and_then(Value::as_str).map_or(true, |s| s != "0x0");
    Ok(Some(TransactionReceipt {
        hash,
        block_number: parse_quantity(value.get("blockNumber")),
        gas_used: parse_quantity(value.get("gasUsed")),
        success,
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Transport answering from per-method queues; the last answer repeats.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub unavailable: bool,
        answers: Mutex<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn answer(self, method: &str, result: Result<Value, ProviderError>) -> Self {
            self.answers.lock().unwrap().entry(method.into()).or_default().push_back(result);
            self
        }

        pub fn calls(&self) -> Vec<(String, Value)> { self.calls.lock().unwrap().clone() }

        pub fn set(&self, method: &str, result: Result<Value, ProviderError>) {
            let mut answers = self.answers.lock().unwrap();
            let queue = answers.entry(method.into()).or_default();
            queue.clear();
            queue.push_back(result);
        }
    }

    #[async_trait]
    impl Eip1193Transport for ScriptedTransport {
        fn is_available(&self) -> bool { !self.unavailable }

        async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            let mut answers = self.answers.lock().unwrap();
            let queue = answers
                .get_mut(method)
                .ok_or_else(|| ProviderError::Rpc { code: -32601, message: format!("{method} not scripted") })?;
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(Ok(Value::Null))
            } else {
                queue.front().cloned().unwrap_or(Ok(Value::Null))
            }
        }
    }

    const ALICE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    fn provider(transport: ScriptedTransport) -> Eip1193Provider<ScriptedTransport> {
        Eip1193Provider::new(transport, &DashConfig::default())
    }

    #[tokio::test]
    async fn reads_accounts_chain_and_balance() {
        let p = provider(
            ScriptedTransport::default()
                .answer(method::REQUEST_ACCOUNTS, Ok(json!([ALICE])))
                .answer(method::CHAIN_ID, Ok(json!("0xaa36a7")))
                .answer(method::GET_BALANCE, Ok(json!("0x22b1c8c1227a0000"))),
        );
        let accounts = p.request_accounts().await.unwrap();
        assert_eq!(accounts, vec![ALICE.parse::<Address>().unwrap()]);
        assert_eq!(p.active_chain().await.unwrap(), ChainId(11155111));
        let balance = p.balance(accounts[0]).await.unwrap();
        assert_eq!(balance.to_string(), "2.5");

        let calls = p.transport().calls();
        assert_eq!(calls[2].1[1], LATEST);
    }

    #[tokio::test]
    async fn unavailable_transport_short_circuits() {
        let p = provider(ScriptedTransport { unavailable: true, ..Default::default() });
        assert!(!p.is_available());
        assert_eq!(p.request_accounts().await, Err(ProviderError::Unavailable));
        assert!(p.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn switch_and_add_chain_payloads() {
        let p = provider(
            ScriptedTransport::default()
                .answer(method::SWITCH_CHAIN, Ok(Value::Null))
                .answer(method::ADD_CHAIN, Ok(Value::Null)),
        );
        let polygon = crate::networks::resolve(ChainId(137));
        p.switch_chain(&polygon).await.unwrap();
        p.add_chain(&polygon).await.unwrap();

        let calls = p.transport().calls();
        assert_eq!(calls[0].1, json!([{ "chainId": "0x89" }]));
        assert_eq!(calls[1].1[0]["chainName"], "Polygon Mainnet");
        assert_eq!(calls[1].1[0]["nativeCurrency"]["decimals"], 18);
    }

    #[tokio::test]
    async fn rejected_request_is_typed() {
        let p = provider(
            ScriptedTransport::default().answer(method::REQUEST_ACCOUNTS, Err(ProviderError::UserRejected)),
        );
        assert_eq!(p.request_accounts().await, Err(ProviderError::UserRejected));
    }

    #[tokio::test(start_paused = true)]
    async fn signer_polls_until_receipt() {
        let p = provider(
            ScriptedTransport::default()
                .answer(method::SEND_TRANSACTION, Ok(json!(HASH)))
                .answer(method::GET_TRANSACTION_RECEIPT, Ok(Value::Null))
                .answer(method::GET_TRANSACTION_RECEIPT, Ok(Value::Null))
                .answer(
                    method::GET_TRANSACTION_RECEIPT,
                    Ok(json!({ "status": "0x1", "blockNumber": "0x10", "gasUsed": "0x5208" })),
                ),
        );
        let alice: Address = ALICE.parse().unwrap();
        let signer = p.signer(alice).await.unwrap();
        let hash = signer.send_transfer(alice, "1".parse().unwrap()).await.unwrap();
        let receipt = signer.wait_for_receipt(hash).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(16));
        assert_eq!(receipt.gas_used, Some(21000));

        let calls = p.transport().calls();
        assert_eq!(calls[0].1[0]["value"], "0xde0b6b3a7640000");
        assert_eq!(calls.iter().filter(|(m, _)| m == method::GET_TRANSACTION_RECEIPT).count(), 3);
    }

    #[test]
    fn reverted_receipt_is_flagged() {
        let hash: TxHash = HASH.parse().unwrap();
        let receipt = parse_receipt(hash, &json!({ "status": "0x0" })).unwrap().unwrap();
        assert!(!receipt.success);
        assert!(parse_receipt(hash, &json!("oops")).is_err());
    }

    #[test]
    fn chain_id_accepts_number_or_string() {
        assert_eq!(parse_chain_id(&json!(56)).unwrap(), ChainId(56));
        assert_eq!(parse_chain_id(&json!("0x38")).unwrap(), ChainId(56));
        assert!(parse_chain_id(&json!(null)).is_err());
    }
}
