use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Hard ceiling for a configurable slippage tolerance.
pub const MAX_SLIPPAGE_BPS: u16 = 5_000;

/// Slippage tolerance expressed in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slippage(u16);

impl Slippage {
    /// Builds a tolerance from basis points, bounded to (0, 5000].
    pub fn from_bps(bps: u16) -> Result<Self, ValidationError> {
        if bps == 0 {
            return Err(ValidationError::NonPositiveSlippage);
        }
        if bps > MAX_SLIPPAGE_BPS {
            return Err(ValidationError::SlippageAboveCeiling(bps, MAX_SLIPPAGE_BPS));
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u16 {
        self.0
    }

    /// Tolerance as a fraction, e.g. 50 bps -> 0.005.
    pub fn as_fraction(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_slippage_fraction() {
        let slippage = Slippage::from_bps(50).unwrap();
        assert_eq!(slippage.as_fraction(), dec!(0.005));
    }

    #[test]
    fn test_slippage_bounds() {
        assert!(Slippage::from_bps(0).is_err());
        assert!(Slippage::from_bps(MAX_SLIPPAGE_BPS).is_ok());
        assert!(Slippage::from_bps(MAX_SLIPPAGE_BPS + 1).is_err());
    }
}
