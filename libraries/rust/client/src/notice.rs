use std::fmt;

use serde::Serialize;

/// A message shown to the user after a flow is triggered
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum Notice {
    InitWalletRequired,
    SaleEndInPast,
    InvalidEventDetails(String),
    EventInitialized,
    InitFailed,
    PurchaseWalletRequired,
    PurchaseFailed,
    TimedOut,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::EventInitialized)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitWalletRequired => f.write_str("Requires connected wallet"),
            Self::SaleEndInPast => f.write_str("Sale end must be a future time"),
            Self::InvalidEventDetails(detail) => write!(f, "Invalid event details: {detail}"),
            Self::EventInitialized => f.write_str("Event initialized!"),
            Self::InitFailed => f.write_str("Init failed"),
            Self::PurchaseWalletRequired => f.write_str("You must connect your wallet first."),
            Self::PurchaseFailed => f.write_str(
                "An error occurred while buying the ticket. Check the console for details.",
            ),
            Self::TimedOut => f.write_str(
                "The transaction did not settle in time. It may still complete, check your wallet before trying again.",
            ),
        }
    }
}
