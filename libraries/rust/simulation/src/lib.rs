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

//! An in-memory network and wallet for exercising the ticketing client without a live chain

pub mod ledger;
pub mod runtime;
pub mod wallet;

pub use ledger::{ContractError, TicketLedger};
pub use runtime::{RpcCall, SimulationClient, TICKET_MANAGER_ID};
pub use wallet::{signature_for, TestWallet};
