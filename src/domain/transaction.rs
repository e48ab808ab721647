use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, serialize_units};

pub type UserId = u64;

/// Identifier assigned by the ledger service. Kept as text because the service
/// may report it as a number or a string.
pub type TransactionId = String;

/// A sale from a farmer to a buyer, as submitted to `POST /transactions/create`.
/// Immutable once submitted; submitting the same request twice records two sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub shop_id: u64,
    pub farmer_id: UserId,
    pub buyer_id: UserId,
    pub product_name: String,
    pub category_id: u64,
    pub quantity: u32,
    /// Price per unit in cents; sent on the wire in whole units
    #[serde(rename = "unit_price", serialize_with = "serialize_units")]
    pub unit_price_cents: Cents,
}

impl TransactionRequest {
    /// Create a request for a single unit. Quantity and price default to 1 unit
    /// at 1.00 and are set with the builder methods.
    pub fn new(
        shop_id: u64,
        farmer_id: UserId,
        buyer_id: UserId,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            shop_id,
            farmer_id,
            buyer_id,
            product_name: product_name.into(),
            category_id: 1,
            quantity: 1,
            unit_price_cents: 100,
        }
    }

    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit_price(mut self, unit_price_cents: Cents) -> Self {
        self.unit_price_cents = unit_price_cents;
        self
    }

    /// quantity × unit price, or `None` on overflow
    pub fn expected_total(&self) -> Option<Cents> {
        self.unit_price_cents.checked_mul(Cents::from(self.quantity))
    }

    /// Check the request locally before anything goes over the wire.
    pub fn validate(&self) -> Result<(), RequestError> {
        for (field, value) in [
            ("shop_id", self.shop_id),
            ("farmer_id", self.farmer_id),
            ("buyer_id", self.buyer_id),
            ("category_id", self.category_id),
        ] {
            if value == 0 {
                return Err(RequestError::NonPositiveId(field));
            }
        }
        if self.farmer_id == self.buyer_id {
            return Err(RequestError::SameParticipant(self.farmer_id));
        }
        if self.product_name.trim().is_empty() {
            return Err(RequestError::EmptyProductName);
        }
        if self.quantity == 0 {
            return Err(RequestError::NonPositiveQuantity);
        }
        if self.unit_price_cents <= 0 {
            return Err(RequestError::NonPositiveUnitPrice(self.unit_price_cents));
        }
        if self.expected_total().is_none() {
            return Err(RequestError::TotalOverflow);
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("{0} must be a positive integer")]
    NonPositiveId(&'static str),

    #[error("farmer and buyer must be different users (both are {0})")]
    SameParticipant(UserId),

    #[error("product name must not be empty")]
    EmptyProductName,

    #[error("quantity must be positive")]
    NonPositiveQuantity,

    #[error("unit price must be positive (got {0} cents)")]
    NonPositiveUnitPrice(Cents),

    #[error("quantity × unit price is out of range")]
    TotalOverflow,
}

/// What the ledger service reports back for a created transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub id: TransactionId,
    pub total_amount_cents: Cents,
    pub farmer_earning_cents: Cents,
}

impl TransactionResult {
    /// Portion of the total not credited to the farmer (commission, fees, ...)
    pub fn retained_cents(&self) -> Cents {
        self.total_amount_cents - self.farmer_earning_cents
    }
}
