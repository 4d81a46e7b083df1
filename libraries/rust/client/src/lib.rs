use std::sync::Arc;

use chrono::{Offset, Utc};
use live_ticket_ledger_client::{Account, ContractClient, TicketManager, WalletAdapter};

use buy_ticket::BuyTicketFlow;
use client::ClientState;
use config::LiveTicketAppConfig;
use init_event::InitEventFlow;

pub mod buy_ticket;
mod client;
pub mod config;
pub mod flow;
pub mod init_event;
pub mod notice;

pub use chrono::FixedOffset;
pub use flow::{FlowError, FlowState};
pub use live_ticket_ledger_client as ledger;
pub use notice::Notice;

/// Central client object for the ticketing app
#[derive(Clone)]
pub struct LiveTicketClient<W, C> {
    client: Arc<ClientState<W, C>>,
}

impl<W: WalletAdapter, C: ContractClient> LiveTicketClient<W, C> {
    /// A client whose users enter times in UTC
    pub fn new(wallet: W, contract: C, config: LiveTicketAppConfig) -> Self {
        Self::with_local_offset(wallet, contract, config, Utc.fix())
    }

    /// A client whose users enter times at `local_offset` from UTC
    pub fn with_local_offset(
        wallet: W,
        contract: C,
        config: LiveTicketAppConfig,
        local_offset: FixedOffset,
    ) -> Self {
        Self {
            client: Arc::new(ClientState::new(wallet, contract, config, local_offset)),
        }
    }

    pub fn config(&self) -> &LiveTicketAppConfig {
        self.client.config()
    }

    /// The account of the connected wallet, if any
    pub fn account(&self) -> Option<Account> {
        self.client.account()
    }

    /// Direct access to the contract binding, for reads outside of the flows
    pub fn tickets(&self) -> &TicketManager<C> {
        &self.client.tickets
    }

    /// A new event initialization flow, with its own state
    pub fn init_event(&self) -> InitEventFlow<W, C> {
        InitEventFlow::new(self.client.clone())
    }

    /// A new ticket purchase flow, with its own state
    pub fn buy_ticket(&self) -> BuyTicketFlow<W, C> {
        BuyTicketFlow::new(self.client.clone())
    }
}
