use serde::{Deserialize, Serialize};

use super::{Cents, UserId};

/// A user's balance as reported by `GET /balances/user/{id}`.
/// Sign convention follows the service: positive means the shop owes the farmer,
/// negative means the buyer owes the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub user_id: UserId,
    pub current_balance_cents: Cents,
}

impl BalanceSnapshot {
    pub fn new(user_id: UserId, current_balance_cents: Cents) -> Self {
        Self {
            user_id,
            current_balance_cents,
        }
    }

    /// Change relative to an earlier snapshot of the same user.
    pub fn delta_since(&self, earlier: &BalanceSnapshot) -> Option<Cents> {
        if earlier.user_id != self.user_id {
            return None;
        }
        self.current_balance_cents
            .checked_sub(earlier.current_balance_cents)
    }
}
