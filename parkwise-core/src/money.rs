/// Monetary amounts are integer minor units (cents). Percentages are basis
/// points so arithmetic stays exact; rounding is half-up to the cent.
pub type Minor = i64;

/// `bps` basis points of `amount`, rounded half-up.
pub fn bps_of(amount: Minor, bps: i64) -> Minor {
    (amount * bps + 5_000) / 10_000
}

/// Ceiling division for billing units: any partial unit bills as a full one.
pub fn div_ceil(value: i64, unit: i64) -> i64 {
    (value + unit - 1) / unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bps_rounds_half_up() {
        assert_eq!(bps_of(20_000, 1_800), 3_600); // 18% of 200.00
        assert_eq!(bps_of(20_000, 500), 1_000); // 5% of 200.00
        assert_eq!(bps_of(1, 5_000), 1); // 0.5 cents rounds up
        assert_eq!(bps_of(3, 3_333), 1); // 0.9999 rounds to 1
    }

    #[test]
    fn div_ceil_bills_partial_units() {
        assert_eq!(div_ceil(3600, 3600), 1);
        assert_eq!(div_ceil(3601, 3600), 2);
        assert_eq!(div_ceil(1, 3600), 1);
    }
}
