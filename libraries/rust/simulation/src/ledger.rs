// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2022 JET PROTOCOL HOLDINGS, LLC.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! In-memory execution of the ticket manager contract

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use live_ticket_ledger_client::{Account, EventConfig, Invocation, Ticket};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("already initialized")]
    AlreadyInitialized,

    #[error("not initialized")]
    NotInitialized,

    #[error("ticket sale ended")]
    SaleEnded,

    #[error("no tickets left")]
    SoldOut,

    #[error("ticket not found")]
    TicketNotFound,

    #[error("{0} has not authorized this call")]
    Unauthorized(Account),

    #[error("function {0} is not exported by the contract")]
    UnknownFunction(String),

    #[error("invalid arguments to {function}: {reason}")]
    InvalidArguments { function: String, reason: String },
}

#[derive(Deserialize)]
struct BuyTicketArgs {
    buyer: Account,
}

#[derive(Deserialize)]
struct TicketOwnerArgs {
    ticket_id: u32,
}

/// State held by a single ticket manager contract
#[derive(Debug, Default, Clone)]
pub struct TicketLedger {
    config: Option<EventConfig>,
    ticket_left: u32,
    last_ticket_id: u32,
    current_price: u32,
    tickets: BTreeMap<u32, Ticket>,
}

impl TicketLedger {
    pub fn config(&self) -> Option<&EventConfig> {
        self.config.as_ref()
    }

    pub fn init(&mut self, config: EventConfig) -> Result<(), ContractError> {
        if self.config.is_some() {
            return Err(ContractError::AlreadyInitialized);
        }

        log::info!(
            "Event initialized: {}, Total tickets: {}",
            config.event_name,
            config.ticket_count
        );

        self.ticket_left = config.ticket_count;
        self.last_ticket_id = 0;
        self.current_price = config.base_price;
        self.config = Some(config);

        Ok(())
    }

    /// Sell the next ticket to `buyer` at the current price, then raise the price by 2%, up
    /// to twice the base price.
    pub fn buy_ticket(&mut self, buyer: Account, now: u64) -> Result<Ticket, ContractError> {
        let config = self.config.as_ref().ok_or(ContractError::NotInitialized)?;

        if now > config.sale_end {
            return Err(ContractError::SaleEnded);
        }
        if self.ticket_left == 0 {
            return Err(ContractError::SoldOut);
        }

        let price = self.current_price;
        log::debug!("payment required: {price} for ticket");

        let ticket = Ticket {
            id: self.last_ticket_id,
            owner: buyer,
            purchase_time: now,
            purchase_price: price,
            event_name: config.event_name.clone(),
        };

        let max_price = u64::from(config.base_price) * 2;
        let next_price = (u64::from(price) * 102 / 100).min(max_price);

        self.current_price = u32::try_from(next_price).unwrap_or(u32::MAX);
        self.last_ticket_id += 1;
        self.ticket_left -= 1;
        self.tickets.insert(ticket.id, ticket.clone());

        Ok(ticket)
    }

    pub fn ticket_left(&self) -> u32 {
        self.ticket_left
    }

    pub fn current_price(&self) -> u32 {
        self.current_price
    }

    pub fn ticket(&self, ticket_id: u32) -> Option<&Ticket> {
        self.tickets.get(&ticket_id)
    }

    pub fn ticket_owner(&self, ticket_id: u32) -> Result<&Account, ContractError> {
        self.tickets
            .get(&ticket_id)
            .map(|ticket| &ticket.owner)
            .ok_or(ContractError::TicketNotFound)
    }

    /// Whether `function` changes contract state, or `None` if the contract has no such function
    pub fn is_mutating(function: &str) -> Option<bool> {
        match function {
            "init" | "buy_ticket" => Some(true),
            "get_ticket_left" | "get_last_current_price" | "get_ticket_owner" => Some(false),
            _ => None,
        }
    }

    /// Execute a state-changing call authorized by `signer`
    pub fn invoke(
        &mut self,
        invocation: &Invocation,
        signer: &Account,
        now: u64,
    ) -> Result<Value, ContractError> {
        match invocation.function.as_str() {
            "init" => {
                self.init(decode_args(invocation)?)?;
                Ok(Value::Null)
            }
            "buy_ticket" => {
                let args: BuyTicketArgs = decode_args(invocation)?;
                if args.buyer != *signer {
                    return Err(ContractError::Unauthorized(args.buyer));
                }

                let ticket = self.buy_ticket(args.buyer, now)?;

                // 64 bit values are carried as strings, the way JS bindings hand them over
                Ok(json!({
                    "id": ticket.id,
                    "owner": ticket.owner,
                    "purchase_time": ticket.purchase_time.to_string(),
                    "purchase_price": ticket.purchase_price,
                    "event_name": ticket.event_name,
                }))
            }
            _ => self.read(invocation),
        }
    }

    /// Evaluate a read-only call
    pub fn read(&self, invocation: &Invocation) -> Result<Value, ContractError> {
        match invocation.function.as_str() {
            "get_ticket_left" => Ok(json!(self.ticket_left)),
            "get_last_current_price" => Ok(json!(self.current_price)),
            "get_ticket_owner" => {
                let args: TicketOwnerArgs = decode_args(invocation)?;
                Ok(json!(self.ticket_owner(args.ticket_id)?))
            }
            other => Err(ContractError::UnknownFunction(other.to_owned())),
        }
    }
}

fn decode_args<T: serde::de::DeserializeOwned>(
    invocation: &Invocation,
) -> Result<T, ContractError> {
    serde_json::from_value(Value::Object(invocation.args.clone())).map_err(|e| {
        ContractError::InvalidArguments {
            function: invocation.function.clone(),
            reason: e.to_string(),
        }
    })
}
