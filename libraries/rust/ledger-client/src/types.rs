use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::TransactionError;

/// An opaque identifier for a wallet account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Account {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for Account {
    fn from(address: &str) -> Self {
        Self(address.to_owned())
    }
}

/// A contract function call, with its arguments given as named fields
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub contract_id: String,
    pub function: String,
    pub args: Map<String, Value>,
}

impl Invocation {
    /// Build an invocation, where `args` must serialize to an object of named fields
    pub fn new(
        contract_id: &str,
        function: &str,
        args: &impl Serialize,
    ) -> Result<Self, TransactionError> {
        let args = match serde_json::to_value(args) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(TransactionError::Encode(format!(
                    "arguments to {function} must be named fields, got {other}"
                )))
            }
            Err(e) => {
                return Err(TransactionError::Encode(format!(
                    "arguments to {function}: {e}"
                )))
            }
        };

        Ok(Self {
            contract_id: contract_id.to_owned(),
            function: function.to_owned(),
            args,
        })
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// A transaction that has been assembled by the contract client, but not yet signed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// The account paying for, and authorizing, the transaction
    pub source: Account,
    pub invocation: Invocation,
    pub sequence: u64,

    /// Encoded form of the transaction, as produced by the network. The wallet signs this.
    pub payload: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    pub transaction: UnsignedTransaction,
    pub signer: Account,
    pub signature: String,
}

/// The observed outcome of a submitted transaction
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub hash: String,
    pub status: SettlementStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SettlementStatus {
    /// The transaction executed, producing the contract function's return value
    Success { value: Value },

    /// The transaction was included, but the contract rejected it
    Failed { reason: String },
}
