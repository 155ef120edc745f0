//! Fibonacci position sizing
//!
//! Entry sits at the 0.618 retracement of a high/low swing, the stop at one of
//! a small menu of shallower retracements. The position is then sized like any
//! other risk-budgeted trade and a table of extension levels shows what each
//! target would pay.
//!
//! # Formula
//! ```text
//! long:  fib(r) = low  + (high - low) * r
//! short: fib(r) = high - (high - low) * r
//! ```

use serde::{Deserialize, Serialize};

use super::sizing::{size_position, PositionSize, RiskBudget};
use super::Side;
use crate::error::SetupError;

/// Ratio the entry is placed at.
pub const FIB_ENTRY_LEVEL: f64 = 0.618;

/// Stop-loss menu, selected by index.
pub const FIB_STOP_LEVELS: [f64; 4] = [0.236, 0.382, 0.441, 0.5];

pub const DEFAULT_STOP_LEVEL: usize = 3;

/// Target levels listed in the table.
pub const FIB_LEVELS: [f64; 7] = [0.786, 1.0, 1.272, 1.618, 2.0, 2.272, 2.618];

/// A high/low swing, normalized so `high >= low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibRange {
    pub high: f64,
    pub low: f64,
    pub side: Side,
}

impl FibRange {
    /// Accepts the two extremes in either order.
    pub fn new(a: f64, b: f64, side: Side) -> Self {
        Self {
            high: a.max(b),
            low: a.min(b),
            side,
        }
    }

    pub fn diff(&self) -> f64 {
        self.high - self.low
    }

    /// Price at ratio `r` of the swing, measured from the side's origin.
    pub fn price(&self, r: f64) -> f64 {
        match self.side {
            Side::Long => self.low + self.diff() * r,
            Side::Short => self.high - self.diff() * r,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibInputs {
    pub high: f64,
    pub low: f64,
    pub side: Side,
    /// Index into `FIB_STOP_LEVELS`.
    pub stop_level: usize,
    pub capital: f64,
    pub risk: RiskBudget,
    pub max_leverage: f64,
}

/// One row of the extension table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
    pub profit: f64,
    pub risk_reward: f64,
    /// Zero profit rows are kept in the data but not shown.
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibReport {
    pub range: FibRange,
    pub entry: f64,
    pub stop_loss: f64,
    pub stop_ratio: f64,
    pub position: PositionSize,
    pub levels: Vec<FibLevel>,
}

impl FibInputs {
    pub fn evaluate(&self) -> Result<FibReport, SetupError> {
        let high = SetupError::finite("high", self.high)?;
        let low = SetupError::finite("low", self.low)?;
        let stop_ratio = *FIB_STOP_LEVELS
            .get(self.stop_level)
            .ok_or(SetupError::StopLevelOutOfRange {
                index: self.stop_level,
                len: FIB_STOP_LEVELS.len(),
            })?;

        let range = FibRange::new(high, low, self.side);
        let entry = range.price(FIB_ENTRY_LEVEL);
        let stop_loss = range.price(stop_ratio);

        let position = size_position(entry, stop_loss, self.capital, self.risk, self.max_leverage, false)?;

        let levels = FIB_LEVELS
            .iter()
            .map(|&ratio| {
                let price = range.price(ratio);
                let profit = position.position_size * (price - entry).abs();
                let risk_reward = if position.actual_risk > 0.0 {
                    profit / position.actual_risk
                } else {
                    0.0
                };
                FibLevel {
                    ratio,
                    price,
                    profit,
                    risk_reward,
                    hidden: profit == 0.0,
                }
            })
            .collect();

        Ok(FibReport {
            range,
            entry,
            stop_loss,
            stop_ratio,
            position,
            levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_inputs() -> FibInputs {
        FibInputs {
            high: 198.38,
            low: 194.46,
            side: Side::Long,
            stop_level: DEFAULT_STOP_LEVEL,
            capital: 1000.0,
            risk: RiskBudget::Amount(50.0),
            max_leverage: 25.0,
        }
    }

    #[test]
    fn long_levels_count_up_from_low() {
        let range = FibRange::new(198.38, 194.46, Side::Long);
        assert_eq!(range.price(1.618), 194.46 + (198.38 - 194.46) * 1.618);
        assert_eq!(range.price(0.0), 194.46);
    }

    #[test]
    fn short_levels_count_down_from_high() {
        let range = FibRange::new(194.46, 198.38, Side::Short);
        assert_eq!(range.high, 198.38);
        assert_eq!(range.price(1.0), 194.46);
    }

    #[test]
    fn entry_and_stop_come_from_the_swing() {
        let r = default_inputs().evaluate().unwrap();
        let diff = 198.38 - 194.46;
        assert_eq!(r.entry, 194.46 + diff * 0.618);
        assert_eq!(r.stop_loss, 194.46 + diff * 0.5);
        assert_eq!(r.position.side, Side::Long);
        assert_eq!(r.levels.len(), FIB_LEVELS.len());
    }

    #[test]
    fn sizing_hits_leverage_cap() {
        // Risk unit is about 0.46, so 50 of risk wants ~108 units (~21k notional),
        // below 25x of 1000.
        let r = default_inputs().evaluate().unwrap();
        assert!(!r.position.leverage_limited);

        let capped = FibInputs {
            max_leverage: 5.0,
            ..default_inputs()
        }
        .evaluate()
        .unwrap();
        assert!(capped.position.leverage_limited);
        assert!((capped.position.position_value - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn level_reward_is_profit_over_actual_risk() {
        let r = default_inputs().evaluate().unwrap();
        for level in &r.levels {
            assert!((level.risk_reward * r.position.actual_risk - level.profit).abs() < 1e-9);
            assert!(!level.hidden);
        }
    }

    #[test]
    fn zero_risk_hides_every_row() {
        let r = FibInputs {
            risk: RiskBudget::Amount(0.0),
            ..default_inputs()
        }
        .evaluate()
        .unwrap();
        assert!(r.levels.iter().all(|l| l.hidden && l.risk_reward == 0.0));
    }

    #[test]
    fn bad_stop_index_and_flat_range_are_invalid() {
        let bad = FibInputs {
            stop_level: 4,
            ..default_inputs()
        };
        assert_eq!(bad.evaluate().unwrap_err(), SetupError::StopLevelOutOfRange { index: 4, len: 4 });

        let flat = FibInputs {
            high: 100.0,
            low: 100.0,
            ..default_inputs()
        };
        assert_eq!(flat.evaluate().unwrap_err(), SetupError::ZeroRiskUnit);
    }
}
