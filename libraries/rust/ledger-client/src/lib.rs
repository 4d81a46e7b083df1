use std::{any::Any, time::Duration};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod contract;
pub mod transaction;
mod types;

pub use contract::{EventConfig, Ticket, TicketManager};
pub use transaction::{with_deadline, TransactionEnvelope, TransactionError};
pub use types::{
    Account, Invocation, Settlement, SettlementStatus, SignedTransaction, UnsignedTransaction,
};

/// A wallet that holds the user's keys and can sign transactions on their behalf.
///
/// The connected account and the signing capability are always supplied by the wallet at the
/// time of the call, they are never stored on a shared contract client.
#[async_trait(?Send)]
pub trait WalletAdapter: Clone + 'static {
    type Error: Any + std::fmt::Debug;

    /// The account currently connected, or `None` while the wallet is disconnected
    fn account(&self) -> Option<Account>;

    /// Sign a transaction envelope
    ///
    /// Wallets usually prompt the user here, so this may take arbitrarily long or be rejected.
    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, Self::Error>;
}

/// A type that provides an interface to a remote ledger hosting the ticket manager contract.
#[async_trait(?Send)]
pub trait ContractClient: Clone + 'static {
    type Error: Any + std::fmt::Debug;

    /// The current time, as unix seconds
    fn get_current_time(&self) -> i64;

    /// Wait for the given duration using the platform's timer
    async fn sleep(&self, duration: Duration);

    /// Assemble an unsigned transaction for a state-changing contract call
    async fn build(
        &self,
        source: &Account,
        invocation: &Invocation,
    ) -> Result<UnsignedTransaction, Self::Error>;

    /// Submit a signed transaction and wait for it to settle
    async fn send(&self, transaction: SignedTransaction) -> Result<Settlement, Self::Error>;

    /// Evaluate a read-only contract call
    async fn query(&self, invocation: &Invocation) -> Result<Value, Self::Error>;
}

#[async_trait(?Send)]
pub trait ContractClientExt: ContractClient {
    /// Evaluate a read-only call and decode its result
    async fn query_as<T: DeserializeOwned>(
        &self,
        invocation: &Invocation,
    ) -> Result<T, TransactionError> {
        let value = self
            .query(invocation)
            .await
            .map_err(|e| TransactionError::Network(format!("{e:?}")))?;

        serde_json::from_value(value).map_err(|e| {
            TransactionError::Decode(format!("result of {}: {e}", invocation.function))
        })
    }
}

impl<T: ContractClient> ContractClientExt for T {}
