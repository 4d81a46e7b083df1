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

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;

use live_ticket_ledger_client::{Account, SignedTransaction, UnsignedTransaction, WalletAdapter};

/// The signature a simulated wallet produces for `payload`
pub fn signature_for(signer: &Account, payload: &str) -> String {
    base64::encode(format!("{signer}:{payload}"))
}

#[derive(Default)]
struct WalletState {
    account: Option<Account>,
    rejection: Option<String>,
    signed: Vec<UnsignedTransaction>,
}

/// A wallet for tests, which can be disconnected or told to refuse signing
#[derive(Clone, Default)]
pub struct TestWallet {
    state: Arc<Mutex<WalletState>>,
}

impl std::fmt::Debug for TestWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TestWallet")
            .field(&self.state.lock().account)
            .finish()
    }
}

impl TestWallet {
    pub fn connected(account: impl Into<Account>) -> Self {
        let wallet = Self::default();
        wallet.connect(account);
        wallet
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connect(&self, account: impl Into<Account>) {
        self.state.lock().account = Some(account.into());
    }

    pub fn disconnect(&self) {
        self.state.lock().account = None;
    }

    /// Refuse every signing request until [`TestWallet::allow_signing`] is called
    pub fn reject_signing(&self, reason: &str) {
        self.state.lock().rejection = Some(reason.to_owned());
    }

    pub fn allow_signing(&self) {
        self.state.lock().rejection = None;
    }

    /// Every transaction this wallet has signed, oldest first
    pub fn signed(&self) -> Vec<UnsignedTransaction> {
        self.state.lock().signed.clone()
    }
}

#[async_trait(?Send)]
impl WalletAdapter for TestWallet {
    type Error = anyhow::Error;

    fn account(&self) -> Option<Account> {
        self.state.lock().account.clone()
    }

    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, Self::Error> {
        let mut state = self.state.lock();

        let Some(signer) = state.account.clone() else {
            bail!("wallet is not connected");
        };
        if let Some(reason) = &state.rejection {
            bail!("user rejected the request: {reason}");
        }

        state.signed.push(transaction.clone());

        Ok(SignedTransaction {
            signature: signature_for(&signer, &transaction.payload),
            transaction: transaction.clone(),
            signer,
        })
    }
}
