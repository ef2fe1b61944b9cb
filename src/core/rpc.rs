//! JSON-RPC vocabulary for injected wallet providers
//!
//! Centralized registry for method names, event names and error codes.

/// Provider request methods
pub mod method {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
}

/// Provider notification names
pub mod event {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";
}

/// EIP-1193 / EIP-1474 error codes
pub mod code {
    /// User rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// Chain not added to the wallet (wallet_switchEthereumChain)
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// Internal JSON-RPC error; some mobile wallets wrap 4902 inside it
    pub const INTERNAL: i64 = -32603;
}

/// Block tag used for balance reads
pub const LATEST: &str = "latest";

/// Decimals of every native currency in the chain table
pub const NATIVE_DECIMALS: u8 = 18;
