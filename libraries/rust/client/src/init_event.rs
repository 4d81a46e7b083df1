use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use live_ticket_ledger_client::{
    Account, ContractClient, EventConfig, TransactionError, WalletAdapter,
};

use crate::{
    client::ClientState,
    flow::{FlowError, FlowState, FlowStatus},
    notice::Notice,
};

const SALE_END_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];
const ONE_DAY: i64 = 24 * 60 * 60;

/// Raw contents of the event creation form, as typed by the user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitEventForm {
    pub event_name: String,
    pub base_price: String,

    /// Local date and time in `YYYY-MM-DDTHH:MM` form
    pub sale_end: String,
    pub ticket_count: String,
}

impl InitEventForm {
    /// The form as first presented: 50 tickets at 1000, on sale for one day from `now`.
    /// The sale end is shown in the user's local time, `local_offset` from UTC.
    pub fn with_defaults(now: i64, local_offset: FixedOffset) -> Self {
        let sale_end = DateTime::<Utc>::from_timestamp(now.saturating_add(ONE_DAY), 0)
            .map(|end| {
                end.with_timezone(&local_offset)
                    .format(SALE_END_FORMATS[0])
                    .to_string()
            })
            .unwrap_or_default();

        Self {
            event_name: "Live Ticket".to_owned(),
            base_price: "1000".to_owned(),
            sale_end,
            ticket_count: "50".to_owned(),
        }
    }

    /// Convert the form into the contract's event parameters, reading the sale end as a time
    /// `local_offset` from UTC
    pub fn parse(
        &self,
        organizer: Account,
        local_offset: FixedOffset,
    ) -> Result<EventConfig, FlowError> {
        let base_price = parse_number::<u32>("base price", &self.base_price)?;
        let ticket_count = parse_number::<u32>("ticket count", &self.ticket_count)?;

        if ticket_count == 0 {
            return Err(FlowError::InvalidInput {
                field: "ticket count",
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(EventConfig {
            organizer,
            base_price,
            sale_end: parse_sale_end(&self.sale_end, local_offset)?,
            ticket_count,
            event_name: self.event_name.clone(),
        })
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, input: &str) -> Result<T, FlowError>
where
    T::Err: std::fmt::Display,
{
    input
        .trim()
        .parse()
        .map_err(|e: T::Err| FlowError::InvalidInput {
            field,
            reason: format!("{input:?}: {e}"),
        })
}

fn parse_sale_end(input: &str, local_offset: FixedOffset) -> Result<u64, FlowError> {
    let input = input.trim();
    let local = SALE_END_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| local_offset.from_local_datetime(&naive).single())
        .ok_or_else(|| FlowError::InvalidInput {
            field: "sale end",
            reason: format!("{input:?} is not a date and time"),
        })?;

    u64::try_from(local.timestamp()).map_err(|_| FlowError::InvalidInput {
        field: "sale end",
        reason: format!("{input:?} is before 1970"),
    })
}

/// What the event creation panel should display
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitEventView {
    pub open_label: &'static str,
    pub open_enabled: bool,
    pub form_open: bool,
    pub confirm_label: &'static str,
    pub confirm_enabled: bool,
    pub cancel_enabled: bool,
    pub notice: Option<String>,
    pub notice_is_error: bool,
}

/// Flow for configuring the event on the ticket manager contract
pub struct InitEventFlow<W, C> {
    client: Arc<ClientState<W, C>>,
    status: FlowStatus<()>,
    form_open: Mutex<bool>,
}

impl<W: WalletAdapter, C: ContractClient> InitEventFlow<W, C> {
    pub(crate) fn new(client: Arc<ClientState<W, C>>) -> Self {
        Self {
            client,
            status: FlowStatus::new(),
            form_open: Mutex::new(false),
        }
    }

    pub fn state(&self) -> FlowState<()> {
        self.status.state()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.status.notice()
    }

    pub fn is_submitting(&self) -> bool {
        self.status.is_submitting()
    }

    /// Whether a trigger would currently be accepted
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.client.account().is_some()
    }

    pub fn default_form(&self) -> InitEventForm {
        InitEventForm::with_defaults(self.client.current_time(), self.client.local_offset())
    }

    pub fn is_form_open(&self) -> bool {
        *self.form_open.lock()
    }

    /// Show the form. Refused while disconnected or while a submission is outstanding.
    pub fn open_form(&self) -> bool {
        if !self.can_submit() {
            return false;
        }

        *self.form_open.lock() = true;
        true
    }

    /// Hide the form. Refused while a submission is outstanding.
    pub fn close_form(&self) -> bool {
        if self.is_submitting() {
            return false;
        }

        *self.form_open.lock() = false;
        true
    }

    pub fn view(&self) -> InitEventView {
        let submitting = self.is_submitting();
        let notice = self.notice();

        InitEventView {
            open_label: if submitting {
                "Initializing..."
            } else {
                "Create Event"
            },
            open_enabled: self.can_submit(),
            form_open: self.is_form_open(),
            confirm_label: if submitting { "Creating..." } else { "Confirm" },
            confirm_enabled: self.can_submit(),
            cancel_enabled: !submitting,
            notice_is_error: notice.as_ref().map(Notice::is_error).unwrap_or_default(),
            notice: notice.map(|n| n.to_string()),
        }
    }

    /// Initialize the event from the form contents.
    ///
    /// Nothing is sent when no wallet is connected, when the form does not parse, or when the
    /// sale end is not strictly after the current time.
    pub async fn submit(
        &self,
        form: &InitEventForm,
        cancel: &CancellationToken,
    ) -> Result<(), FlowError> {
        let submission = self.status.begin()?;

        let Some(organizer) = self.client.account() else {
            log::debug!("init event refused: no wallet connected");
            submission.reject(Notice::InitWalletRequired);
            return Err(FlowError::WalletRequired);
        };

        let config = match form.parse(organizer, self.client.local_offset()) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("init event refused: {e}");
                submission.reject(Notice::InvalidEventDetails(e.to_string()));
                return Err(e);
            }
        };

        let now = self.client.current_time();
        let in_future = u64::try_from(now).map_or(true, |now| config.sale_end > now);
        if !in_future {
            log::debug!("init event refused: sale end {} <= {now}", config.sale_end);
            submission.reject(Notice::SaleEndInPast);
            return Err(FlowError::SaleEndNotInFuture {
                sale_end: config.sale_end,
                now,
            });
        }

        log::debug!("initializing event {:?}", config.event_name);
        let result = self
            .client
            .submit(cancel, async {
                let envelope = self.client.tickets.init(&config.organizer, &config).await?;
                envelope.sign_and_submit(&self.client.wallet).await
            })
            .await;

        match result {
            Ok(()) => {
                log::info!(
                    "event {:?} initialized with {} tickets",
                    config.event_name,
                    config.ticket_count
                );
                submission.settle((), Some(Notice::EventInitialized));
                *self.form_open.lock() = false;
                Ok(())
            }
            Err(TransactionError::Cancelled) => {
                log::info!("init event cancelled");
                submission.abandon();
                Err(TransactionError::Cancelled.into())
            }
            Err(e) => {
                log::error!("init event failed: {e:?}");
                submission.fail(match &e {
                    TransactionError::TimedOut(_) => Notice::TimedOut,
                    _ => Notice::InitFailed,
                });
                Err(e.into())
            }
        }
    }
}
