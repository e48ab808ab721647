use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::domain::{
    BalanceSnapshot, Session, TransactionRequest, TransactionResult, UserId, review_deltas,
    review_transaction, verify_invariant,
};
use crate::remote::{LedgerClient, RemoteError, envelope};

use super::{Credentials, ParticipantBalance, ProbeConfig, ProbeError, ProbeReport, Role};

/// Knobs for a full probe run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Sample both balances before submitting so the report carries deltas
    pub baseline: bool,
    /// Pause between submission and the balance reads
    pub settle_delay: Duration,
}

/// Client-side probe of the ledger service.
/// Runs the linear pipeline: authenticate, submit, fetch farmer, fetch buyer, verify.
/// Nothing is retried; the first failing step ends the run.
pub struct LedgerProbe {
    client: LedgerClient,
    config: ProbeConfig,
}

impl LedgerProbe {
    /// Validate the configuration and build the HTTP client. No request is sent.
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        config.validate()?;
        let client = LedgerClient::new(config.base_url.trim(), config.timeout)
            .map_err(|e| ProbeError::InvalidConfig(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Log in with the configured credentials.
    pub async fn login(&self) -> Result<Session, ProbeError> {
        self.authenticate(&self.config.credentials).await
    }

    /// Log in and return the bearer session.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, ProbeError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(ProbeError::InvalidConfig(
                "username and password must not be empty".into(),
            ));
        }

        info!(username = %credentials.username, url = %self.client.base_url(), "Logging in");
        let data = self
            .client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(ProbeError::Auth)?;

        let token = envelope::require_str(&data, "token").map_err(ProbeError::Auth)?;
        let session = Session::new(token).ok_or_else(|| {
            ProbeError::Auth(RemoteError::InvalidField {
                field: "data.token".into(),
                reason: "empty token".into(),
            })
        })?;

        debug!(token = %session.preview(), "Session established");
        Ok(session)
    }

    /// Create one transaction. The request is validated before it is sent.
    /// Not idempotent: each call records a new sale.
    pub async fn submit_transaction(
        &self,
        session: &Session,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, ProbeError> {
        request.validate()?;

        info!(
            farmer_id = request.farmer_id,
            buyer_id = request.buyer_id,
            quantity = request.quantity,
            unit_price_cents = request.unit_price_cents,
            "Creating transaction"
        );
        let data = self
            .client
            .create_transaction(session, request)
            .await
            .map_err(ProbeError::Transaction)?;

        let result = TransactionResult {
            id: envelope::require_id(&data, "id").map_err(ProbeError::Transaction)?,
            total_amount_cents: envelope::require_cents(&data, "total_amount")
                .map_err(ProbeError::Transaction)?,
            farmer_earning_cents: envelope::require_cents(&data, "farmer_earning")
                .map_err(ProbeError::Transaction)?,
        };

        info!(
            id = %result.id,
            total_amount_cents = result.total_amount_cents,
            farmer_earning_cents = result.farmer_earning_cents,
            "Transaction created"
        );
        Ok(result)
    }

    /// Read a user's current balance.
    pub async fn fetch_balance(
        &self,
        session: &Session,
        user_id: UserId,
    ) -> Result<BalanceSnapshot, ProbeError> {
        if user_id == 0 {
            return Err(ProbeError::InvalidUserId(user_id));
        }

        let balance_error = |source| ProbeError::Balance { user_id, source };
        let data = self
            .client
            .user_balance(session, user_id)
            .await
            .map_err(balance_error)?;
        let current = envelope::require_cents(&data, "current_balance").map_err(balance_error)?;

        info!(user_id, current_balance_cents = current, "Balance fetched");
        Ok(BalanceSnapshot::new(user_id, current))
    }

    /// Run the whole pipeline and report what was observed.
    /// A FAIL verdict is a successful run; only step failures are errors.
    pub async fn run(
        &self,
        request: &TransactionRequest,
        options: &RunOptions,
    ) -> Result<ProbeReport, ProbeError> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("probe_run", %run_id);
        self.run_steps(run_id, request, options)
            .instrument(span)
            .await
    }

    async fn run_steps(
        &self,
        run_id: Uuid,
        request: &TransactionRequest,
        options: &RunOptions,
    ) -> Result<ProbeReport, ProbeError> {
        let started_at = Utc::now();
        let session = self.login().await?;

        let baseline = if options.baseline {
            let farmer = self.fetch_balance(&session, request.farmer_id).await?;
            let buyer = self.fetch_balance(&session, request.buyer_id).await?;
            Some((farmer, buyer))
        } else {
            None
        };

        let transaction = self.submit_transaction(&session, request).await?;

        if !options.settle_delay.is_zero() {
            debug!(
                delay_ms = options.settle_delay.as_millis() as u64,
                "Waiting for ledger to settle"
            );
            tokio::time::sleep(options.settle_delay).await;
        }

        let farmer_now = self.fetch_balance(&session, request.farmer_id).await?;
        let buyer_now = self.fetch_balance(&session, request.buyer_id).await?;

        let farmer = ParticipantBalance::new(Role::Farmer, farmer_now, baseline.map(|b| b.0));
        let buyer = ParticipantBalance::new(Role::Buyer, buyer_now, baseline.map(|b| b.1));

        let verification = verify_invariant(farmer.current_cents, buyer.current_cents);

        let mut observations = review_transaction(request, &transaction);
        observations.extend(review_deltas(
            &transaction,
            farmer.delta_cents,
            buyer.delta_cents,
        ));
        for observation in &observations {
            warn!(%observation, "Ledger observation");
        }

        info!(verdict = %verification.verdict, "Verification complete");

        Ok(ProbeReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            transaction,
            farmer,
            buyer,
            verification,
            observations,
        })
    }
}
