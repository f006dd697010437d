use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Minor;
use crate::payment::PaymentRecord;

/// Pricing tier selected by the holder at booking time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingTier {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

/// Billing unit a quote was computed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

/// Half-open reservation window `[starts_at, ends_at)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        Self { starts_at, ends_at }
    }

    pub fn is_well_formed(&self) -> bool {
        self.starts_at < self.ends_at
    }

    /// Half-open overlap: touching endpoints do not conflict.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.starts_at < other.ends_at && other.starts_at < self.ends_at
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.ends_at - self.starts_at).num_seconds()
    }
}

/// Normalized vehicle identity (trimmed, upper-cased). Two bookings conflict
/// when their identities are equal and their windows overlap, regardless of
/// which resource they sit on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VehicleIdentity(String);

impl VehicleIdentity {
    /// Returns `None` for blank input so an empty form field reads as
    /// "no vehicle supplied".
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully itemized quote. All amounts are minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub base_minor: Minor,
    pub tax_minor: Minor,
    pub service_fee_minor: Minor,
    pub discount_minor: Minor,
    pub total_minor: Minor,
    pub duration_value: i64,
    pub duration_unit: DurationUnit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    AwaitingPayment,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
    Expired,
}

impl BookingStatus {
    /// Statuses that count against capacity and vehicle uniqueness.
    pub fn is_active_or_pending(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending
                | BookingStatus::AwaitingPayment
                | BookingStatus::Confirmed
                | BookingStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed
                | BookingStatus::Cancelled
                | BookingStatus::Rejected
                | BookingStatus::Expired
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::AwaitingPayment => "AWAITING_PAYMENT",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Recorded when a booking is cancelled; bookings are soft-retained so the
/// refund history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub refund_minor: Minor,
}

/// The single source of truth for one reservation. Mutated only through
/// lifecycle transitions after creation, never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub resource_id: Uuid,
    pub holder_id: String,
    pub window: TimeWindow,
    pub tier: PricingTier,
    pub vehicle: Option<VehicleIdentity>,
    pub discount_code: Option<String>,
    pub price: PriceBreakdown,
    pub status: BookingStatus,
    pub payment: Option<PaymentRecord>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub cancellation: Option<CancellationRecord>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        resource_id: Uuid,
        holder_id: String,
        window: TimeWindow,
        tier: PricingTier,
        vehicle: Option<VehicleIdentity>,
        discount_code: Option<String>,
        price: PriceBreakdown,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference: reference_code(now),
            resource_id,
            holder_id,
            window,
            tier,
            vehicle,
            discount_code,
            price,
            status: BookingStatus::Pending,
            payment: None,
            checked_in_at: None,
            checked_out_at: None,
            cancellation: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// True once the payment gateway reported success for this booking.
    pub fn payment_completed(&self) -> bool {
        self.payment
            .as_ref()
            .map(|p| p.is_completed())
            .unwrap_or(false)
    }
}

/// Opaque, human-shareable reference: date prefix plus a random suffix.
/// Global uniqueness is enforced by the store on insert.
pub fn reference_code(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "PW-{}-{}",
        now.format("%Y%m%d"),
        suffix[..6].to_uppercase()
    )
}
