use std::future::Future;

use chrono::FixedOffset;
use tokio_util::sync::CancellationToken;

use live_ticket_ledger_client::{
    with_deadline, Account, ContractClient, TicketManager, TransactionError, WalletAdapter,
};

use crate::config::LiveTicketAppConfig;

/// Central object for client implementations, holding the collaborators shared by all flows.
///
/// Only read-only access happens here: every flow keeps its own in-flight state.
pub struct ClientState<W, C> {
    pub(crate) wallet: W,
    pub(crate) tickets: TicketManager<C>,
    config: LiveTicketAppConfig,
    local_offset: FixedOffset,
}

impl<W: WalletAdapter, C: ContractClient> ClientState<W, C> {
    pub fn new(
        wallet: W,
        contract: C,
        config: LiveTicketAppConfig,
        local_offset: FixedOffset,
    ) -> Self {
        Self {
            tickets: TicketManager::new(contract, &config.contract_id),
            wallet,
            config,
            local_offset,
        }
    }

    pub fn config(&self) -> &LiveTicketAppConfig {
        &self.config
    }

    pub fn account(&self) -> Option<Account> {
        self.wallet.account()
    }

    /// Offset from UTC of the times the user types into forms
    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }

    pub fn current_time(&self) -> i64 {
        self.tickets.client().get_current_time()
    }

    /// Run a build/sign/submit chain under the configured timeout
    pub async fn submit<T>(
        &self,
        cancel: &CancellationToken,
        chain: impl Future<Output = Result<T, TransactionError>>,
    ) -> Result<T, TransactionError> {
        with_deadline(
            self.tickets.client(),
            self.config.submit_timeout(),
            cancel,
            chain,
        )
        .await
    }
}
