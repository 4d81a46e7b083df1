use std::{future::Future, marker::PhantomData, time::Duration};

use futures::{pin_mut, select_biased, FutureExt};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{ContractClient, SettlementStatus, UnsignedTransaction, WalletAdapter};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("wallet did not sign: {0}")]
    Signing(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("contract rejected transaction: {0}")]
    Rejected(String),

    #[error("could not encode arguments: {0}")]
    Encode(String),

    #[error("could not decode result: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,
}

/// An unsigned transaction for a contract call returning `T`.
///
/// Submitting consumes the envelope, so a given envelope is signed and sent at most once.
/// Re-triggering a call means building a new envelope.
pub struct TransactionEnvelope<C, T> {
    client: C,
    transaction: UnsignedTransaction,
    _output: PhantomData<fn() -> T>,
}

impl<C: ContractClient, T: DeserializeOwned> TransactionEnvelope<C, T> {
    pub(crate) fn new(client: C, transaction: UnsignedTransaction) -> Self {
        Self {
            client,
            transaction,
            _output: PhantomData,
        }
    }

    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.transaction
    }

    /// Sign the transaction with the wallet, submit it and wait for it to settle
    pub async fn sign_and_submit<W: WalletAdapter>(
        self,
        wallet: &W,
    ) -> Result<T, TransactionError> {
        let function = self.transaction.invocation.function.clone();

        let signed = wallet
            .sign_transaction(&self.transaction)
            .await
            .map_err(|e| TransactionError::Signing(format!("{e:?}")))?;

        log::debug!("sending {function} signed by {}", signed.signer);
        let settlement = self
            .client
            .send(signed)
            .await
            .map_err(|e| TransactionError::Network(format!("{e:?}")))?;

        match settlement.status {
            SettlementStatus::Success { value } => {
                log::info!("tx result success: {function} {}", settlement.hash);

                serde_json::from_value(value)
                    .map_err(|e| TransactionError::Decode(format!("result of {function}: {e}")))
            }
            SettlementStatus::Failed { reason } => {
                log::error!("tx result failed: {function} {}: {reason}", settlement.hash);
                Err(TransactionError::Rejected(reason))
            }
        }
    }
}

/// Run a submission chain, giving up once `timeout` elapses or `cancel` is triggered.
///
/// When the chain is abandoned its future is dropped. Anything already submitted may still
/// settle on the ledger, the caller only stops waiting for it.
pub async fn with_deadline<C, T, F>(
    client: &C,
    timeout: Duration,
    cancel: &CancellationToken,
    chain: F,
) -> Result<T, TransactionError>
where
    C: ContractClient,
    F: Future<Output = Result<T, TransactionError>>,
{
    if cancel.is_cancelled() {
        return Err(TransactionError::Cancelled);
    }

    let chain = chain.fuse();
    let timer = client.sleep(timeout).fuse();
    let cancelled = cancel.cancelled().fuse();
    pin_mut!(chain, timer, cancelled);

    select_biased! {
        result = chain => result,
        _ = cancelled => Err(TransactionError::Cancelled),
        _ = timer => Err(TransactionError::TimedOut(timeout)),
    }
}
