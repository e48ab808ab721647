use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::{Value, json};
use tracing::debug;

use super::{RemoteError, envelope};
use crate::domain::{Session, TransactionRequest, UserId};

/// Thin HTTP client for the ledger service's JSON API.
/// Every call returns the validated `data` object of the response envelope.
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl LedgerClient {
    /// Build a client rooted at `base_url` (e.g. `http://localhost:8000/api`).
    /// `timeout` bounds each request from connect to the last body byte.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::ClientSetup)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/login`
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, RemoteError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }));
        self.send("login", request).await
    }

    /// `POST /transactions/create`
    pub async fn create_transaction(
        &self,
        session: &Session,
        transaction: &TransactionRequest,
    ) -> Result<Value, RemoteError> {
        let request = self
            .http
            .post(self.url("/transactions/create"))
            .bearer_auth(session.token())
            .json(transaction);
        self.send("create_transaction", request).await
    }

    /// `GET /balances/user/{id}`
    pub async fn user_balance(
        &self,
        session: &Session,
        user_id: UserId,
    ) -> Result<Value, RemoteError> {
        let request = self
            .http
            .get(self.url(&format!("/balances/user/{}", user_id)))
            .bearer_auth(session.token());
        self.send("user_balance", request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, call: &str, request: RequestBuilder) -> Result<Value, RemoteError> {
        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        debug!(call, status = %status, body_len = body.len(), "Ledger API response");

        envelope::unwrap_data(status.as_u16(), &body)
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(err)
        }
    }
}
