use async_trait::async_trait;
use wasm_bindgen::prelude::*;

use live_ticket_ledger_client::{Account, SignedTransaction, UnsignedTransaction, WalletAdapter};

use crate::json::to_json;

#[wasm_bindgen]
extern "C" {
    /// The wallet kit the page has connected, such as a browser extension
    #[derive(Clone)]
    pub type WalletKit;

    #[wasm_bindgen(method, js_name = getAddress)]
    pub fn get_address(this: &WalletKit) -> Option<String>;

    #[wasm_bindgen(method, catch, js_name = signTransaction)]
    pub async fn sign_transaction(
        this: &WalletKit,
        transaction: String,
    ) -> Result<JsValue, js_sys::Error>;
}

#[derive(Clone)]
pub struct JsWalletAdapter {
    js_obj: WalletKit,
}

impl std::fmt::Debug for JsWalletAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsWalletAdapter")
            .field("account", &self.account())
            .finish()
    }
}

impl JsWalletAdapter {
    pub fn new(js_obj: WalletKit) -> Self {
        Self { js_obj }
    }
}

#[async_trait(?Send)]
impl WalletAdapter for JsWalletAdapter {
    type Error = js_sys::Error;

    fn account(&self) -> Option<Account> {
        self.js_obj
            .get_address()
            .filter(|address| !address.is_empty())
            .map(Account::from)
    }

    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> Result<SignedTransaction, Self::Error> {
        let signer = self
            .account()
            .ok_or_else(|| js_sys::Error::new("wallet is not connected"))?;

        let js_signature = self
            .js_obj
            .sign_transaction(to_json(transaction)?)
            .await?;
        let signature = js_signature
            .as_string()
            .ok_or_else(|| js_sys::Error::new("signTransaction did not return a string"))?;

        Ok(SignedTransaction {
            transaction: transaction.clone(),
            signer,
            signature,
        })
    }
}
