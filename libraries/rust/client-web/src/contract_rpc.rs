use std::time::Duration;

use async_trait::async_trait;
use js_sys::Reflect;
use serde_json::Value;
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;

use live_ticket_ledger_client::{
    Account, ContractClient, Invocation, Settlement, SignedTransaction, UnsignedTransaction,
};

use crate::json::{from_json, to_json};

#[wasm_bindgen]
extern "C" {
    /// Connection to the contract RPC endpoint. Requests and responses are JSON strings.
    #[derive(Clone)]
    pub type ContractRpc;

    #[wasm_bindgen(method, catch)]
    pub async fn build(
        this: &ContractRpc,
        source: String,
        invocation: String,
    ) -> Result<JsValue, js_sys::Error>;

    #[wasm_bindgen(method, catch)]
    pub async fn send(this: &ContractRpc, transaction: String) -> Result<JsValue, js_sys::Error>;

    #[wasm_bindgen(method, catch)]
    pub async fn query(this: &ContractRpc, invocation: String) -> Result<JsValue, js_sys::Error>;
}

#[derive(Clone)]
pub struct JsContractClient {
    js_obj: ContractRpc,
}

impl std::fmt::Debug for JsContractClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsContractClient").finish()
    }
}

impl JsContractClient {
    pub fn new(js_obj: ContractRpc) -> Self {
        Self { js_obj }
    }
}

#[async_trait(?Send)]
impl ContractClient for JsContractClient {
    type Error = js_sys::Error;

    fn get_current_time(&self) -> i64 {
        (js_sys::Date::now() / 1000.0) as i64
    }

    async fn sleep(&self, duration: Duration) {
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let timer = js_sys::Promise::new(&mut |resolve, _| {
            if let Err(e) = set_timeout(&resolve, millis) {
                log::error!("no timer available, submissions will not time out: {e:?}");
            }
        });

        // the timer promise never rejects
        let _ = JsFuture::from(timer).await;
    }

    async fn build(
        &self,
        source: &Account,
        invocation: &Invocation,
    ) -> Result<UnsignedTransaction, Self::Error> {
        let response = self
            .js_obj
            .build(source.to_string(), to_json(invocation)?)
            .await?;

        from_json("build", response)
    }

    async fn send(&self, transaction: SignedTransaction) -> Result<Settlement, Self::Error> {
        let response = self.js_obj.send(to_json(&transaction)?).await?;

        from_json("send", response)
    }

    async fn query(&self, invocation: &Invocation) -> Result<Value, Self::Error> {
        let response = self.js_obj.query(to_json(invocation)?).await?;

        from_json("query", response)
    }
}

/// Schedule `callback` on the window when there is one, or else through the global `setTimeout`
/// of workers and other hosts
fn set_timeout(callback: &js_sys::Function, millis: i32) -> Result<(), JsValue> {
    if let Some(window) = web_sys::window() {
        window.set_timeout_with_callback_and_timeout_and_arguments_0(callback, millis)?;
        return Ok(());
    }

    let global = js_sys::global();
    let set_timeout = Reflect::get(&global, &JsValue::from_str("setTimeout"))?
        .dyn_into::<js_sys::Function>()?;
    set_timeout.call2(&global, callback, &JsValue::from(millis))?;

    Ok(())
}
