use std::{collections::VecDeque, sync::Arc, time::Duration};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use live_ticket_ledger_client::{
    Account, ContractClient, Invocation, Settlement, SettlementStatus, SignedTransaction,
    UnsignedTransaction,
};

use crate::{ledger::TicketLedger, wallet::signature_for};

/// Address the simulated ticket manager is deployed at, unless told otherwise
pub const TICKET_MANAGER_ID: &str = "CTICKETMANAGERSIMULATED";

/// A request received by the simulated network
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Build(Invocation),
    Send(Invocation),
    Query(Invocation),
}

impl RpcCall {
    pub fn function(&self) -> &str {
        match self {
            Self::Build(ix) | Self::Send(ix) | Self::Query(ix) => &ix.function,
        }
    }

    pub fn invocation(&self) -> &Invocation {
        match self {
            Self::Build(ix) | Self::Send(ix) | Self::Query(ix) => ix,
        }
    }
}

struct SimulationState {
    contract_id: String,
    ledger: Mutex<TicketLedger>,
    clock: Mutex<i64>,
    sequence: Mutex<u64>,
    journal: Mutex<Vec<RpcCall>>,
    send_failures: Mutex<VecDeque<String>>,
    query_failures: Mutex<VecDeque<String>>,
    sends_paused: watch::Sender<bool>,
    queries_paused: watch::Sender<bool>,
}

/// A network hosting a single ticket manager contract, executed in memory
#[derive(Clone)]
pub struct SimulationClient {
    state: Arc<SimulationState>,
}

impl std::fmt::Debug for SimulationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SimulationClient")
            .field(&self.state.contract_id)
            .finish()
    }
}

impl SimulationClient {
    /// A network whose clock starts at `now` (unix seconds)
    pub fn new(now: i64) -> Self {
        Self::with_contract(TICKET_MANAGER_ID, now)
    }

    pub fn with_contract(contract_id: &str, now: i64) -> Self {
        let (sends_paused, _) = watch::channel(false);
        let (queries_paused, _) = watch::channel(false);

        Self {
            state: Arc::new(SimulationState {
                contract_id: contract_id.to_owned(),
                ledger: Mutex::new(TicketLedger::default()),
                clock: Mutex::new(now),
                sequence: Mutex::new(0),
                journal: Mutex::new(vec![]),
                send_failures: Mutex::new(VecDeque::new()),
                query_failures: Mutex::new(VecDeque::new()),
                sends_paused,
                queries_paused,
            }),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.state.contract_id
    }

    pub fn set_time(&self, now: i64) {
        *self.state.clock.lock() = now;
    }

    pub fn advance_time(&self, seconds: i64) {
        *self.state.clock.lock() += seconds;
    }

    /// Inspect or modify the contract state directly
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut TicketLedger) -> R) -> R {
        f(&mut self.state.ledger.lock())
    }

    /// Every request received so far, oldest first
    pub fn journal(&self) -> Vec<RpcCall> {
        self.state.journal.lock().clone()
    }

    /// Number of transactions submitted for `function`
    pub fn sends_of(&self, function: &str) -> usize {
        self.state
            .journal
            .lock()
            .iter()
            .filter(|call| matches!(call, RpcCall::Send(ix) if ix.function == function))
            .count()
    }

    /// Number of requests of any kind made so far
    pub fn request_count(&self) -> usize {
        self.state.journal.lock().len()
    }

    /// Make the next submission fail as if the network were unreachable
    pub fn fail_next_send(&self, reason: &str) {
        self.state.send_failures.lock().push_back(reason.to_owned());
    }

    /// Make the next read-only query fail as if the network were unreachable
    pub fn fail_next_query(&self, reason: &str) {
        self.state.query_failures.lock().push_back(reason.to_owned());
    }

    /// Hold submissions until [`SimulationClient::resume_sends`] is called
    pub fn pause_sends(&self) {
        self.state.sends_paused.send_replace(true);
    }

    pub fn resume_sends(&self) {
        self.state.sends_paused.send_replace(false);
    }

    /// Hold read-only queries until [`SimulationClient::resume_queries`] is called
    pub fn pause_queries(&self) {
        self.state.queries_paused.send_replace(true);
    }

    pub fn resume_queries(&self) {
        self.state.queries_paused.send_replace(false);
    }

    fn record(&self, call: RpcCall) {
        log::debug!("rpc: {call:?}");
        self.state.journal.lock().push(call);
    }

    fn check_contract(&self, invocation: &Invocation) -> anyhow::Result<bool> {
        if invocation.contract_id != self.state.contract_id {
            bail!("contract {} not found", invocation.contract_id);
        }

        TicketLedger::is_mutating(&invocation.function)
            .ok_or_else(|| anyhow!("function {} not found", invocation.function))
    }

    async fn wait_until_resumed(gate: &watch::Sender<bool>) {
        let mut paused = gate.subscribe();

        while *paused.borrow_and_update() {
            if paused.changed().await.is_err() {
                break;
            }
        }
    }

    fn now(&self) -> u64 {
        u64::try_from(*self.state.clock.lock()).unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl ContractClient for SimulationClient {
    type Error = anyhow::Error;

    fn get_current_time(&self) -> i64 {
        *self.state.clock.lock()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }

    async fn build(
        &self,
        source: &Account,
        invocation: &Invocation,
    ) -> Result<UnsignedTransaction, Self::Error> {
        self.record(RpcCall::Build(invocation.clone()));

        if !self.check_contract(invocation)? {
            bail!("{} is read-only, query it instead", invocation.function);
        }

        let sequence = {
            let mut sequence = self.state.sequence.lock();
            *sequence += 1;
            *sequence
        };

        let payload = base64::encode(serde_json::to_vec(&(source, invocation, sequence))?);

        Ok(UnsignedTransaction {
            source: source.clone(),
            invocation: invocation.clone(),
            sequence,
            payload,
        })
    }

    async fn send(&self, signed: SignedTransaction) -> Result<Settlement, Self::Error> {
        let transaction = &signed.transaction;
        self.record(RpcCall::Send(transaction.invocation.clone()));

        Self::wait_until_resumed(&self.state.sends_paused).await;

        if let Some(reason) = self.state.send_failures.lock().pop_front() {
            bail!("{reason}");
        }
        if signed.signer != transaction.source
            || signed.signature != signature_for(&signed.signer, &transaction.payload)
        {
            bail!("transaction signature is invalid");
        }
        self.check_contract(&transaction.invocation)?;

        let hash = format!("{:064x}", transaction.sequence);
        let now = self.now();
        let outcome = self
            .state
            .ledger
            .lock()
            .invoke(&transaction.invocation, &signed.signer, now);

        let status = match outcome {
            Ok(value) => SettlementStatus::Success { value },
            Err(e) => {
                log::debug!("contract rejected {hash}: {e}");
                SettlementStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(Settlement { hash, status })
    }

    async fn query(&self, invocation: &Invocation) -> Result<Value, Self::Error> {
        self.record(RpcCall::Query(invocation.clone()));

        Self::wait_until_resumed(&self.state.queries_paused).await;

        if let Some(reason) = self.state.query_failures.lock().pop_front() {
            bail!("{reason}");
        }
        if self.check_contract(invocation)? {
            bail!("{} changes state, submit a transaction instead", invocation.function);
        }

        Ok(self.state.ledger.lock().read(invocation)?)
    }
}
