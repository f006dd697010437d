use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Minor;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

/// Outcome of a charge attempt, recorded on the booking. A failed attempt is
/// terminal for that attempt only; the booking stays eligible for retry or
/// cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}

/// The payment provider is a black box to the engine: it either charges the
/// amount and returns a transaction id, or it fails.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        booking_id: Uuid,
        amount_minor: Minor,
    ) -> Result<PaymentRecord, Box<dyn std::error::Error + Send + Sync>>;
}

/// Gateway stand-in for tests and local runs: every charge succeeds.
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        booking_id: Uuid,
        _amount_minor: Minor,
    ) -> Result<PaymentRecord, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PaymentRecord {
            status: PaymentStatus::Succeeded,
            transaction_id: Some(format!("mock_txn_{}", booking_id.simple())),
            processed_at: Utc::now(),
        })
    }
}

/// Gateway stand-in whose charges always fail, for exercising the
/// stays-awaiting-payment path.
pub struct FailingPaymentGateway;

#[async_trait]
impl PaymentGateway for FailingPaymentGateway {
    async fn charge(
        &self,
        _booking_id: Uuid,
        _amount_minor: Minor,
    ) -> Result<PaymentRecord, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PaymentRecord {
            status: PaymentStatus::Failed,
            transaction_id: None,
            processed_at: Utc::now(),
        })
    }
}
