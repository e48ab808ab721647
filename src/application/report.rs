use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    BalanceSnapshot, Cents, Observation, TransactionResult, UserId, VerificationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Farmer,
    Buyer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Buyer => "buyer",
        }
    }
}

/// One side of the sale: where the balance started (if sampled) and where it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantBalance {
    pub role: Role,
    pub user_id: UserId,
    pub baseline_cents: Option<Cents>,
    pub current_cents: Cents,
    pub delta_cents: Option<Cents>,
}

impl ParticipantBalance {
    pub fn new(role: Role, current: BalanceSnapshot, baseline: Option<BalanceSnapshot>) -> Self {
        Self {
            role,
            user_id: current.user_id,
            baseline_cents: baseline.map(|b| b.current_balance_cents),
            current_cents: current.current_balance_cents,
            delta_cents: baseline.and_then(|b| current.delta_since(&b)),
        }
    }
}

/// Everything one probe run observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub transaction: TransactionResult,
    pub farmer: ParticipantBalance,
    pub buyer: ParticipantBalance,
    pub verification: VerificationResult,
    pub observations: Vec<Observation>,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        self.verification.passed()
    }

    pub fn participants(&self) -> [&ParticipantBalance; 2] {
        [&self.farmer, &self.buyer]
    }
}
