use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};

/// Settings for connecting the app to a deployed ticket manager contract
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveTicketAppConfig {
    /// Address of the ticket manager contract
    pub contract_id: String,
    pub network_passphrase: String,
    pub rpc_url: String,

    /// How long a submission may take, from building the transaction until it settles
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(default, rename = "submitTimeoutSecs")]
    pub submit_timeout: Option<Duration>,
}

impl LiveTicketAppConfig {
    pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout.unwrap_or(Self::DEFAULT_SUBMIT_TIMEOUT)
    }
}
