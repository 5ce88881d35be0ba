//! Gas price unit conversions.
//!
//! The guard compares gas prices in base units (the chain's smallest
//! denomination), while user-facing surfaces quote gwei. All inputs are
//! normalized through these helpers before a ceiling is stored or checked.

pub const BASE_UNITS_PER_GWEI: u64 = 1_000_000_000;

/// Converts a gwei quote to base units, saturating on overflow.
pub fn gwei_to_base(gwei: u64) -> u64 {
    gwei.saturating_mul(BASE_UNITS_PER_GWEI)
}

/// Converts base units back to whole gwei, truncating.
pub fn base_to_gwei(base: u64) -> u64 {
    base / BASE_UNITS_PER_GWEI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gwei_round_trip() {
        assert_eq!(gwei_to_base(30), 30_000_000_000);
        assert_eq!(base_to_gwei(30_000_000_000), 30);
    }

    #[test]
    fn test_gwei_overflow_saturates() {
        assert_eq!(gwei_to_base(u64::MAX), u64::MAX);
    }
}
