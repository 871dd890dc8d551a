use crate::domain::entities::trade::TradeDirection;
use crate::domain::errors::ValidationError;

/// Profit and loss value object
///
/// Unlike prices, PnL can be negative to represent losses. The value is
/// guaranteed finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PnL(f64);

impl PnL {
    /// Create a PnL from a raw amount.
    ///
    /// # Errors
    /// Returns ValidationError::MustBeFinite if the value is NaN or infinite.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        Ok(PnL(value))
    }

    /// Gross PnL realized by a filled trade.
    ///
    /// Long trades profit when the exit is above the entry; shorts profit
    /// when it is below.
    pub fn from_fill(
        direction: TradeDirection,
        entry_price: f64,
        exit_price: f64,
        position_size: f64,
    ) -> Result<Self, ValidationError> {
        if !entry_price.is_finite() || !exit_price.is_finite() || !position_size.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        let per_unit = match direction {
            TradeDirection::Long => exit_price - entry_price,
            TradeDirection::Short => entry_price - exit_price,
        };
        PnL::new(per_unit * position_size)
    }

    /// Net PnL after subtracting fees.
    pub fn net_of_fees(&self, fees: f64) -> PnL {
        // Fees are validated non-negative upstream; subtraction of finite
        // numbers stays finite.
        PnL(self.0 - fees)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_profit(&self) -> bool {
        self.0 > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.0 < 0.0
    }

    pub fn zero() -> Self {
        PnL(0.0)
    }
}

impl std::fmt::Display for PnL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 0.0 {
            write!(f, "+${:.2}", self.0)
        } else {
            write!(f, "-${:.2}", self.0.abs())
        }
    }
}

impl std::ops::Add for PnL {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        PnL(self.0 + other.0)
    }
}

impl std::ops::Sub for PnL {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        PnL(self.0 - other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_fill_profits_on_rise() {
        let pnl = PnL::from_fill(TradeDirection::Long, 150.0, 155.0, 10.0).unwrap();
        assert_eq!(pnl.value(), 50.0);
        assert!(pnl.is_profit());
    }

    #[test]
    fn test_short_fill_profits_on_fall() {
        let pnl = PnL::from_fill(TradeDirection::Short, 150.0, 145.0, 10.0).unwrap();
        assert_eq!(pnl.value(), 50.0);

        let loss = PnL::from_fill(TradeDirection::Short, 150.0, 160.0, 10.0).unwrap();
        assert_eq!(loss.value(), -100.0);
        assert!(loss.is_loss());
    }

    #[test]
    fn test_net_of_fees() {
        let pnl = PnL::from_fill(TradeDirection::Long, 100.0, 110.0, 5.0).unwrap();
        assert_eq!(pnl.net_of_fees(7.5).value(), 42.5);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(PnL::new(f64::NAN).is_err());
        assert!(PnL::new(f64::INFINITY).is_err());
        assert!(PnL::from_fill(TradeDirection::Long, f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PnL::new(1234.56).unwrap()), "+$1234.56");
        assert_eq!(format!("{}", PnL::new(-789.12).unwrap()), "-$789.12");
    }

    #[test]
    fn test_arithmetic() {
        let total = PnL::new(1000.0).unwrap() + PnL::new(-300.0).unwrap();
        assert_eq!(total.value(), 700.0);
        let diff = PnL::new(100.0).unwrap() - PnL::new(40.0).unwrap();
        assert_eq!(diff.value(), 60.0);
    }
}
