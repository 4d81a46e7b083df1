use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{
    Account, ContractClient, ContractClientExt, Invocation, TransactionEnvelope, TransactionError,
};

/// Parameters of the event managed by a ticket manager contract
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    pub organizer: Account,

    /// Starting ticket price, in the smallest currency unit
    pub base_price: u32,

    /// Unix time (seconds) after which no more tickets are sold
    pub sale_end: u64,
    pub ticket_count: u32,
    pub event_name: String,
}

/// A ticket issued by the contract.
///
/// Numbers are accepted either as JSON numbers or as decimal strings, since 64-bit values
/// typically travel as strings through JS bindings.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: u32,

    pub owner: Account,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub purchase_time: u64,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub purchase_price: u32,

    pub event_name: String,
}

#[derive(Serialize)]
struct BuyTicketArgs<'a> {
    buyer: &'a Account,
}

#[derive(Serialize)]
struct TicketOwnerArgs {
    ticket_id: u32,
}

#[derive(Serialize)]
struct NoArgs {}

/// Typed binding for a deployed ticket manager contract
#[derive(Clone)]
pub struct TicketManager<C> {
    client: C,
    contract_id: String,
}

impl<C: ContractClient> TicketManager<C> {
    pub fn new(client: C, contract_id: &str) -> Self {
        Self {
            client,
            contract_id: contract_id.to_owned(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// Prepare a transaction that configures the event. The contract only accepts this once.
    pub async fn init(
        &self,
        source: &Account,
        config: &EventConfig,
    ) -> Result<TransactionEnvelope<C, ()>, TransactionError> {
        self.prepare(source, "init", config).await
    }

    /// Prepare a transaction that buys one ticket at the contract's current price
    pub async fn buy_ticket(
        &self,
        buyer: &Account,
    ) -> Result<TransactionEnvelope<C, Ticket>, TransactionError> {
        self.prepare(buyer, "buy_ticket", &BuyTicketArgs { buyer })
            .await
    }

    /// Number of tickets still for sale
    pub async fn get_ticket_left(&self) -> Result<u32, TransactionError> {
        self.read("get_ticket_left", &NoArgs {}).await
    }

    /// Price the next ticket will be sold at
    pub async fn get_last_current_price(&self) -> Result<u32, TransactionError> {
        self.read("get_last_current_price", &NoArgs {}).await
    }

    pub async fn get_ticket_owner(&self, ticket_id: u32) -> Result<Account, TransactionError> {
        self.read("get_ticket_owner", &TicketOwnerArgs { ticket_id })
            .await
    }

    async fn prepare<T>(
        &self,
        source: &Account,
        function: &str,
        args: &impl Serialize,
    ) -> Result<TransactionEnvelope<C, T>, TransactionError>
    where
        T: serde::de::DeserializeOwned,
    {
        let invocation = Invocation::new(&self.contract_id, function, args)?;
        let transaction = self
            .client
            .build(source, &invocation)
            .await
            .map_err(|e| TransactionError::Network(format!("{e:?}")))?;

        Ok(TransactionEnvelope::new(self.client.clone(), transaction))
    }

    async fn read<T>(&self, function: &str, args: &impl Serialize) -> Result<T, TransactionError>
    where
        T: serde::de::DeserializeOwned,
    {
        let invocation = Invocation::new(&self.contract_id, function, args)?;
        self.client.query_as(&invocation).await
    }
}
