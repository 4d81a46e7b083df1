use std::cell::RefCell;

use tokio_util::sync::CancellationToken;
use wasm_bindgen::prelude::*;

use live_ticket_client::{
    buy_ticket::BuyTicketFlow, config::LiveTicketAppConfig, init_event::InitEventFlow,
    FixedOffset, FlowError, LiveTicketClient,
};

mod contract_rpc;
mod json;
mod wallet_adapter;

pub use contract_rpc::{ContractRpc, JsContractClient};
pub use wallet_adapter::{JsWalletAdapter, WalletKit};

type WebClient = LiveTicketClient<JsWalletAdapter, JsContractClient>;

/// Entry point for the ticketing app's UI
#[wasm_bindgen]
pub struct LiveTicketWebClient {
    client: WebClient,
    init_event: InitEventFlow<JsWalletAdapter, JsContractClient>,
    buy_ticket: BuyTicketFlow<JsWalletAdapter, JsContractClient>,
    cancel: RefCell<CancellationToken>,
}

#[wasm_bindgen]
impl LiveTicketWebClient {
    pub fn connect(
        config_json: &str,
        wallet: WalletKit,
        rpc: ContractRpc,
    ) -> Result<LiveTicketWebClient, JsError> {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = LiveTicketAppConfig::from_json(config_json)?;
        log::info!("connecting to ticket manager {}", config.contract_id);

        let client = LiveTicketClient::with_local_offset(
            JsWalletAdapter::new(wallet),
            JsContractClient::new(rpc),
            config,
            browser_offset()?,
        );

        Ok(Self {
            init_event: client.init_event(),
            buy_ticket: client.buy_ticket(),
            client,
            cancel: RefCell::new(CancellationToken::new()),
        })
    }

    /// Address of the connected wallet
    pub fn account(&self) -> Option<String> {
        self.client.account().map(|account| account.to_string())
    }

    /// Initial contents for the event creation form
    #[wasm_bindgen(js_name = initEventForm)]
    pub fn init_event_form(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.init_event.default_form())?)
    }

    #[wasm_bindgen(js_name = openInitEventForm)]
    pub fn open_init_event_form(&self) -> bool {
        self.init_event.open_form()
    }

    #[wasm_bindgen(js_name = closeInitEventForm)]
    pub fn close_init_event_form(&self) -> bool {
        self.init_event.close_form()
    }

    /// Configure the event from the submitted form
    #[wasm_bindgen(js_name = initEvent)]
    pub async fn init_event(&self, form: JsValue) -> Result<(), ClientError> {
        let form = serde_wasm_bindgen::from_value(form)?;
        let cancel = self.cancel.borrow().clone();

        Ok(self.init_event.submit(&form, &cancel).await?)
    }

    /// Buy a ticket with the connected wallet, returning the ticket
    #[wasm_bindgen(js_name = buyTicket)]
    pub async fn buy_ticket(&self) -> Result<JsValue, ClientError> {
        let cancel = self.cancel.borrow().clone();
        let ticket = self.buy_ticket.buy(&cancel).await?;

        Ok(serde_wasm_bindgen::to_value(&ticket)?)
    }

    /// Stop waiting on every outstanding submission. A transaction that was already sent may
    /// still settle.
    pub fn cancel(&self) {
        self.cancel.replace(CancellationToken::new()).cancel();
    }

    #[wasm_bindgen(js_name = initEventView)]
    pub fn init_event_view(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.init_event.view())?)
    }

    #[wasm_bindgen(js_name = buyTicketView)]
    pub fn buy_ticket_view(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.buy_ticket.view())?)
    }
}

/// The browser's current offset from UTC, as used by `datetime-local` inputs
fn browser_offset() -> Result<FixedOffset, JsError> {
    // minutes behind UTC, so UTC-5 is 300
    let minutes = js_sys::Date::new_0().get_timezone_offset();

    FixedOffset::west_opt((minutes * 60.0) as i32)
        .ok_or_else(|| JsError::new(&format!("unsupported timezone offset: {minutes} minutes")))
}

#[derive(Clone)]
pub struct ClientError {
    value: js_sys::Error,
}

impl From<ClientError> for JsValue {
    fn from(this: ClientError) -> Self {
        this.value.into()
    }
}

impl From<FlowError> for ClientError {
    fn from(err: FlowError) -> Self {
        Self {
            value: js_sys::Error::new(&err.to_string()),
        }
    }
}

impl From<serde_wasm_bindgen::Error> for ClientError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Self {
            value: js_sys::Error::new(&format!("invalid value: {err}")),
        }
    }
}

#[wasm_bindgen(start, js_name = initModule)]
pub fn init_module() {
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}
