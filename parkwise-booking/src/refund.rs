use serde::{Deserialize, Serialize};

use parkwise_core::money::{bps_of, Minor};

/// Time-tiered cancellation refund bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundSchedule {
    /// Cancelling strictly more than this many hours before start refunds
    /// the full amount.
    pub full_refund_hours: i64,
    /// At or below this many hours before start (including already-started
    /// bookings) nothing is refunded.
    pub cutoff_hours: i64,
    /// Refund share between the two boundaries, in basis points.
    pub partial_refund_bps: i64,
}

impl Default for RefundSchedule {
    fn default() -> Self {
        Self {
            full_refund_hours: 24,
            cutoff_hours: 2,
            partial_refund_bps: 5_000,
        }
    }
}

pub struct RefundPolicy {
    schedule: RefundSchedule,
}

impl RefundPolicy {
    pub fn new(schedule: RefundSchedule) -> Self {
        Self { schedule }
    }

    /// Refund for a cancellation `hours_until_start` hours before the window
    /// opens. Without a completed payment there is nothing to refund;
    /// negative hours (booking already started) fall in the no-refund band.
    pub fn compute_refund(
        &self,
        total_minor: Minor,
        payment_completed: bool,
        hours_until_start: f64,
    ) -> Minor {
        if !payment_completed {
            return 0;
        }
        if hours_until_start > self.schedule.full_refund_hours as f64 {
            total_minor
        } else if hours_until_start > self.schedule.cutoff_hours as f64 {
            bps_of(total_minor, self.schedule.partial_refund_bps)
        } else {
            0
        }
    }
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self::new(RefundSchedule::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_tiers() {
        let policy = RefundPolicy::default();

        assert_eq!(policy.compute_refund(12_300, true, 25.0), 12_300);
        assert_eq!(policy.compute_refund(12_300, true, 10.0), 6_150);
        assert_eq!(policy.compute_refund(12_300, true, 1.0), 0);
        assert_eq!(policy.compute_refund(12_300, false, 25.0), 0);
    }

    #[test]
    fn boundaries_are_exclusive_above() {
        let policy = RefundPolicy::default();

        // exactly 24h is the partial band, exactly 2h is the cutoff band
        assert_eq!(policy.compute_refund(10_000, true, 24.0), 5_000);
        assert_eq!(policy.compute_refund(10_000, true, 2.0), 0);
    }

    #[test]
    fn overdue_booking_gets_nothing() {
        let policy = RefundPolicy::default();
        assert_eq!(policy.compute_refund(10_000, true, -3.5), 0);
    }

    #[test]
    fn partial_refund_rounds_half_up() {
        let policy = RefundPolicy::default();
        assert_eq!(policy.compute_refund(12_301, true, 10.0), 6_151);
    }
}
