use std::fmt;
use std::time::Duration;

use super::ProbeError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Login credentials for the ledger service.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the ledger service lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub base_url: String,
    pub credentials: Credentials,
    /// Upper bound for each HTTP call
    pub timeout: Duration,
}

impl ProbeConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ProbeError::InvalidConfig(format!(
                "base URL must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        if self.credentials.username.trim().is_empty() {
            return Err(ProbeError::InvalidConfig("username must not be empty".into()));
        }
        if self.credentials.password.is_empty() {
            return Err(ProbeError::InvalidConfig("password must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidConfig("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}
