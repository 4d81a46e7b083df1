use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use live_ticket_ledger_client::{ContractClient, Ticket, TransactionError, WalletAdapter};

use crate::{
    client::ClientState,
    flow::{FlowError, FlowState, FlowStatus},
    notice::Notice,
};

/// A purchased ticket, as displayed to the buyer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TicketView {
    pub id: u32,
    pub owner: String,
    pub purchase_time: u64,
    pub purchase_price: u32,
    pub event_name: String,
}

impl TicketView {
    /// Purchase time as an RFC 3339 timestamp
    pub fn purchased_at(&self) -> Option<String> {
        let seconds = i64::try_from(self.purchase_time).ok()?;
        DateTime::<Utc>::from_timestamp(seconds, 0).map(|time| time.to_rfc3339())
    }
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            owner: ticket.owner.to_string(),
            purchase_time: ticket.purchase_time,
            purchase_price: ticket.purchase_price,
            event_name: ticket.event_name,
        }
    }
}

/// What the purchase panel should display
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuyTicketView {
    pub button_label: &'static str,
    pub button_enabled: bool,
    pub wallet_hint: Option<&'static str>,
    pub success_message: Option<&'static str>,
    pub ticket: Option<TicketView>,
    pub error: Option<String>,
}

/// Flow for buying a single ticket with the connected wallet
pub struct BuyTicketFlow<W, C> {
    client: Arc<ClientState<W, C>>,
    status: FlowStatus<TicketView>,
}

impl<W: WalletAdapter, C: ContractClient> BuyTicketFlow<W, C> {
    pub(crate) fn new(client: Arc<ClientState<W, C>>) -> Self {
        Self {
            client,
            status: FlowStatus::new(),
        }
    }

    pub fn state(&self) -> FlowState<TicketView> {
        self.status.state()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.status.notice()
    }

    pub fn is_submitting(&self) -> bool {
        self.status.is_submitting()
    }

    pub fn can_buy(&self) -> bool {
        !self.is_submitting() && self.client.account().is_some()
    }

    /// The ticket bought by the last successful trigger
    pub fn ticket(&self) -> Option<TicketView> {
        match self.state() {
            FlowState::Settled(ticket) => Some(ticket),
            _ => None,
        }
    }

    pub fn view(&self) -> BuyTicketView {
        let ticket = self.ticket();

        BuyTicketView {
            button_label: if self.is_submitting() {
                "Processing purchase..."
            } else {
                "Buy Ticket"
            },
            button_enabled: self.can_buy(),
            wallet_hint: self
                .client
                .account()
                .is_none()
                .then_some("You need to connect your wallet before buying a ticket."),
            success_message: ticket.as_ref().map(|_| "Ticket purchased successfully!"),
            ticket,
            error: self
                .notice()
                .filter(Notice::is_error)
                .map(|notice| notice.to_string()),
        }
    }

    /// Buy one ticket at the contract's current price.
    ///
    /// Once the purchase has settled, the remaining inventory is read and logged before the flow
    /// leaves `Submitting`. That read never affects the outcome of the purchase.
    pub async fn buy(&self, cancel: &CancellationToken) -> Result<TicketView, FlowError> {
        let submission = self.status.begin()?;

        let Some(buyer) = self.client.account() else {
            log::debug!("buy ticket refused: no wallet connected");
            submission.reject(Notice::PurchaseWalletRequired);
            return Err(FlowError::WalletRequired);
        };

        log::debug!("buying ticket for {buyer}");
        let result = self
            .client
            .submit(cancel, async {
                let envelope = self.client.tickets.buy_ticket(&buyer).await?;
                envelope.sign_and_submit(&self.client.wallet).await
            })
            .await;

        let ticket = match result {
            Ok(ticket) => TicketView::from(ticket),
            Err(TransactionError::Cancelled) => {
                log::info!("buy ticket cancelled");
                submission.abandon();
                return Err(TransactionError::Cancelled.into());
            }
            Err(e) => {
                log::error!("buy ticket failed: {e:?}");
                submission.fail(match &e {
                    TransactionError::TimedOut(_) => Notice::TimedOut,
                    _ => Notice::PurchaseFailed,
                });
                return Err(e.into());
            }
        };

        log::info!(
            "bought ticket #{} for {} at {}",
            ticket.id,
            ticket.owner,
            ticket.purchase_price
        );

        // the trigger stays disabled until the inventory read is done
        self.log_tickets_left(cancel).await;
        submission.settle(ticket.clone(), None);

        Ok(ticket)
    }

    async fn log_tickets_left(&self, cancel: &CancellationToken) {
        let result = self
            .client
            .submit(cancel, self.client.tickets.get_ticket_left())
            .await;

        match result {
            Ok(left) => log::info!("tickets left: {left}"),
            Err(e) => log::warn!("could not read tickets left: {e}"),
        }
    }
}
