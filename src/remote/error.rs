use std::time::Duration;

use thiserror::Error;

use crate::domain::ParseCentsError;

/// Failure talking to the ledger service or understanding its answer.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("service responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("service rejected the request: {0}")]
    Rejected(String),

    #[error("response body is not valid JSON: {0}")]
    Malformed(String),

    #[error("response is missing field '{0}'")]
    MissingField(String),

    #[error("response field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

impl RemoteError {
    pub(crate) fn invalid_amount(field: &str, err: ParseCentsError) -> Self {
        RemoteError::InvalidField {
            field: field.to_string(),
            reason: err.to_string(),
        }
    }
}
