use std::fmt;

use thiserror::Error;

use crate::domain::{RequestError, UserId};
use crate::remote::RemoteError;

/// Pipeline step, used to tell the user where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    Configure,
    Authenticate,
    SubmitTransaction,
    FetchBalance,
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeStep::Configure => "configure",
            ProbeStep::Authenticate => "authenticate",
            ProbeStep::SubmitTransaction => "submit transaction",
            ProbeStep::FetchBalance => "fetch balance",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid transaction request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Authentication failed: {0}")]
    Auth(#[source] RemoteError),

    #[error("Transaction submission failed: {0}")]
    Transaction(#[source] RemoteError),

    #[error("User id must be a positive integer (got {0})")]
    InvalidUserId(UserId),

    #[error("Balance lookup for user {user_id} failed: {source}")]
    Balance {
        user_id: UserId,
        #[source]
        source: RemoteError,
    },
}

impl ProbeError {
    pub fn step(&self) -> ProbeStep {
        match self {
            ProbeError::InvalidConfig(_) => ProbeStep::Configure,
            ProbeError::InvalidRequest(_) | ProbeError::Transaction(_) => {
                ProbeStep::SubmitTransaction
            }
            ProbeError::Auth(_) => ProbeStep::Authenticate,
            ProbeError::InvalidUserId(_) | ProbeError::Balance { .. } => ProbeStep::FetchBalance,
        }
    }
}
