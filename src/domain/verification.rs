use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Cents, TransactionRequest, TransactionResult, format_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
        }
    }
}

/// Outcome of the balance sign check, carrying the observed values for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verdict: Verdict,
    pub farmer_balance_cents: Cents,
    pub buyer_balance_cents: Cents,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// After a farmer sells to a buyer, the farmer must be owed money and the buyer
/// must owe money. Only signs are compared.
pub fn verify_invariant(
    farmer_balance_cents: Cents,
    buyer_balance_cents: Cents,
) -> VerificationResult {
    let verdict = if farmer_balance_cents > 0 && buyer_balance_cents < 0 {
        Verdict::Pass
    } else {
        Verdict::Fail
    };
    VerificationResult {
        verdict,
        farmer_balance_cents,
        buyer_balance_cents,
    }
}

/// Something worth reporting about a run that does not affect the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    TotalMismatch { expected: Cents, reported: Cents },
    EarningExceedsTotal { total: Cents, earning: Cents },
    NegativeEarning { earning: Cents },
    FarmerDeltaMismatch { expected: Cents, observed: Cents },
    BuyerDeltaMismatch { expected: Cents, observed: Cents },
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::TotalMismatch { expected, reported } => write!(
                f,
                "Reported total {} differs from quantity × unit price {}",
                format_cents(*reported),
                format_cents(*expected)
            ),
            Observation::EarningExceedsTotal { total, earning } => write!(
                f,
                "Farmer earning {} exceeds transaction total {}",
                format_cents(*earning),
                format_cents(*total)
            ),
            Observation::NegativeEarning { earning } => {
                write!(f, "Farmer earning is negative: {}", format_cents(*earning))
            }
            Observation::FarmerDeltaMismatch { expected, observed } => write!(
                f,
                "Farmer balance moved by {}, reported earning was {}",
                format_cents(*observed),
                format_cents(*expected)
            ),
            Observation::BuyerDeltaMismatch { expected, observed } => write!(
                f,
                "Buyer balance moved by {}, expected {}",
                format_cents(*observed),
                format_cents(*expected)
            ),
        }
    }
}

/// Compare the service's transaction figures against the request.
pub fn review_transaction(
    request: &TransactionRequest,
    result: &TransactionResult,
) -> Vec<Observation> {
    let mut observations = Vec::new();

    if let Some(expected) = request.expected_total() {
        if expected != result.total_amount_cents {
            observations.push(Observation::TotalMismatch {
                expected,
                reported: result.total_amount_cents,
            });
        }
    }

    if result.farmer_earning_cents < 0 {
        observations.push(Observation::NegativeEarning {
            earning: result.farmer_earning_cents,
        });
    } else if result.farmer_earning_cents > result.total_amount_cents {
        observations.push(Observation::EarningExceedsTotal {
            total: result.total_amount_cents,
            earning: result.farmer_earning_cents,
        });
    }

    observations
}

/// Compare balance movements against the transaction. Concurrent activity on the
/// same accounts also shows up here, so these are notes, not failures.
pub fn review_deltas(
    result: &TransactionResult,
    farmer_delta: Option<Cents>,
    buyer_delta: Option<Cents>,
) -> Vec<Observation> {
    let mut observations = Vec::new();

    if let Some(observed) = farmer_delta {
        if observed != result.farmer_earning_cents {
            observations.push(Observation::FarmerDeltaMismatch {
                expected: result.farmer_earning_cents,
                observed,
            });
        }
    }

    if let Some(observed) = buyer_delta {
        let expected = -result.total_amount_cents;
        if observed != expected {
            observations.push(Observation::BuyerDeltaMismatch { expected, observed });
        }
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: Cents, earning: Cents) -> TransactionResult {
        TransactionResult {
            id: "1".into(),
            total_amount_cents: total,
            farmer_earning_cents: earning,
        }
    }

    #[test]
    fn test_verify_invariant_pass() {
        let outcome = verify_invariant(95000, -100000);
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.passed());
        assert_eq!(outcome.farmer_balance_cents, 95000);
        assert_eq!(outcome.buyer_balance_cents, -100000);
    }

    #[test]
    fn test_verify_invariant_boundaries_fail() {
        assert_eq!(verify_invariant(0, -100).verdict, Verdict::Fail);
        assert_eq!(verify_invariant(100, 0).verdict, Verdict::Fail);
        assert_eq!(verify_invariant(0, 0).verdict, Verdict::Fail);
        assert_eq!(verify_invariant(-100, 100).verdict, Verdict::Fail);
    }

    #[test]
    fn test_magnitude_is_not_checked() {
        // A large fee still passes: only signs matter
        assert!(verify_invariant(1, -100000).passed());
    }

    #[test]
    fn test_review_transaction_clean() {
        let request = TransactionRequest::new(1, 61, 62, "TestProduct")
            .with_quantity(5)
            .with_unit_price(20000);
        assert!(review_transaction(&request, &result(100000, 95000)).is_empty());
    }

    #[test]
    fn test_review_transaction_flags_amounts() {
        let request = TransactionRequest::new(1, 61, 62, "TestProduct")
            .with_quantity(5)
            .with_unit_price(20000);

        let observations = review_transaction(&request, &result(3000000, 3100000));
        assert_eq!(
            observations,
            vec![
                Observation::TotalMismatch {
                    expected: 100000,
                    reported: 3000000
                },
                Observation::EarningExceedsTotal {
                    total: 3000000,
                    earning: 3100000
                },
            ]
        );

        let negative = review_transaction(&request, &result(100000, -1));
        assert_eq!(negative, vec![Observation::NegativeEarning { earning: -1 }]);
    }

    #[test]
    fn test_review_deltas() {
        let txn = result(100000, 95000);
        assert!(review_deltas(&txn, Some(95000), Some(-100000)).is_empty());
        assert!(review_deltas(&txn, None, None).is_empty());

        let observations = review_deltas(&txn, Some(190000), Some(-100000));
        assert_eq!(
            observations,
            vec![Observation::FarmerDeltaMismatch {
                expected: 95000,
                observed: 190000
            }]
        );
    }

    #[test]
    fn test_observation_display() {
        let note = Observation::TotalMismatch {
            expected: 100000,
            reported: 3000000,
        };
        assert_eq!(
            note.to_string(),
            "Reported total 30000.00 differs from quantity × unit price 1000.00"
        );
    }
}
