//! Shared primitives: RPC vocabulary and native-currency amounts.

pub mod amount;
pub mod rpc;

pub use amount::{AmountError, NativeAmount};
