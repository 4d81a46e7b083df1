use parking_lot::Mutex;
use thiserror::Error;

use live_ticket_ledger_client::TransactionError;

use crate::notice::Notice;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("no wallet connected")]
    WalletRequired,

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("sale end {sale_end} is not after the current time {now}")]
    SaleEndNotInFuture { sale_end: u64, now: i64 },

    #[error("a submission is already in progress")]
    Busy,

    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl FlowError {
    /// Whether the flow stopped before any remote call was made
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Transaction(_))
    }
}

/// Progress of a single flow instance.
///
/// `Settled` and `Failed` are kept until the next trigger, which moves the flow back through
/// `Submitting`. Only `Submitting` blocks a new trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState<T> {
    Idle,
    Submitting,
    Settled(T),
    Failed(Notice),
}

impl<T> FlowState<T> {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

struct StatusInner<T> {
    state: FlowState<T>,
    notice: Option<Notice>,
}

/// Interior state shared between a flow's trigger and its observers
pub(crate) struct FlowStatus<T> {
    inner: Mutex<StatusInner<T>>,
}

impl<T: Clone> FlowStatus<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                state: FlowState::Idle,
                notice: None,
            }),
        }
    }

    pub fn state(&self) -> FlowState<T> {
        self.inner.lock().state.clone()
    }

    /// The most recent message for the user, if there is one to show
    pub fn notice(&self) -> Option<Notice> {
        self.inner.lock().notice.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.lock().state.is_submitting()
    }

    /// Move into `Submitting`, or fail with `Busy` if a submission is outstanding.
    ///
    /// Any previous result or notice is discarded.
    pub fn begin(&self) -> Result<Submission<'_, T>, FlowError> {
        let mut inner = self.inner.lock();

        if inner.state.is_submitting() {
            return Err(FlowError::Busy);
        }

        inner.state = FlowState::Submitting;
        inner.notice = None;

        Ok(Submission {
            status: self,
            finished: false,
        })
    }

    fn finish(&self, state: FlowState<T>, notice: Option<Notice>) {
        let mut inner = self.inner.lock();
        inner.state = state;
        inner.notice = notice;
    }
}

/// An outstanding submission. If dropped before being resolved, the flow returns to `Idle`.
pub(crate) struct Submission<'a, T: Clone> {
    status: &'a FlowStatus<T>,
    finished: bool,
}

impl<'a, T: Clone> Submission<'a, T> {
    /// A local check failed, nothing was sent
    pub fn reject(mut self, notice: Notice) {
        self.finished = true;
        self.status.finish(FlowState::Idle, Some(notice));
    }

    pub fn settle(mut self, value: T, notice: Option<Notice>) {
        self.finished = true;
        self.status.finish(FlowState::Settled(value), notice);
    }

    pub fn fail(mut self, notice: Notice) {
        self.finished = true;
        self.status
            .finish(FlowState::Failed(notice.clone()), Some(notice));
    }

    /// The user walked away from the submission
    pub fn abandon(mut self) {
        self.finished = true;
        self.status.finish(FlowState::Idle, None);
    }
}

impl<'a, T: Clone> Drop for Submission<'a, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.status.finish(FlowState::Idle, None);
        }
    }
}
