//! Dip-buy averaging
//!
//! A main order is sized from a percent-of-capital risk budget. Extra orders
//! wait at dip levels past entry (below for longs, above for shorts). Each dip
//! is sized so that recovering from it back to the previous level earns the
//! same profit the main order earns at its take profit.
//!
//! # Formula
//! ```text
//! reference_profit = main_qty * |take_profit - entry|
//! gap_i            = favourable distance from dip_i back to the previous level
//! quantity_i       = reference_profit / gap_i
//! ```
//!
//! A dip gets quantity 0 when its gap is not positive or when it sits at or
//! past the stop loss. The gap is always measured from the previous dip
//! price, whether or not that dip was sized.

use serde::{Deserialize, Serialize};

use super::sizing::{brackets_entry, size_position, PositionSize, RiskBudget};
use super::Side;
use crate::error::SetupError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DipBuyInputs {
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub capital: f64,
    /// Percent of capital lost if the main order is stopped.
    pub risk_percent: f64,
    pub leverage: f64,
    /// Dip prices in fill order.
    pub dips: Vec<f64>,
}

/// One averaging order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DipOrder {
    pub price: f64,
    /// Distance back to the previous level, positive when there is room.
    pub gap: f64,
    pub quantity: f64,
    /// Loss on this order alone if the stop is hit after it fills.
    pub expected_loss: f64,
    /// Profit on this order alone if take profit is reached after it fills.
    pub profit_at_take_profit: f64,
}

/// Outcome when the main order and the first `fills` dips have filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DipScenario {
    pub fills: usize,
    pub profit_at_take_profit: f64,
    pub loss_at_stop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DipBuyReport {
    pub main: PositionSize,
    /// Main order's profit at take profit; every dip is sized to earn this.
    pub reference_profit: f64,
    pub main_expected_loss: f64,
    pub dips: Vec<DipOrder>,
    pub scenarios: Vec<DipScenario>,
}

impl DipBuyInputs {
    pub fn evaluate(&self) -> Result<DipBuyReport, SetupError> {
        let take_profit = SetupError::finite("take_profit", self.take_profit)?;
        let main = size_position(
            self.entry,
            self.stop_loss,
            self.capital,
            RiskBudget::Percent(self.risk_percent),
            self.leverage,
            false,
        )?;
        if !brackets_entry(self.entry, self.stop_loss, take_profit) {
            return Err(SetupError::StopsOnSameSide);
        }

        let sign = main.side.sign();
        let reference_profit = main.position_size * (take_profit - self.entry) * sign;

        let mut previous = self.entry;
        let mut dips = Vec::with_capacity(self.dips.len());
        for &price in &self.dips {
            let price = SetupError::finite("dip", price)?;
            dips.push(self.dip_order(main.side, previous, price, reference_profit));
            previous = price;
        }

        let main_expected_loss = main.position_size * main.risk_unit;
        let mut scenarios = Vec::with_capacity(dips.len() + 1);
        let mut profit = reference_profit;
        let mut loss = main_expected_loss;
        scenarios.push(DipScenario {
            fills: 0,
            profit_at_take_profit: profit,
            loss_at_stop: loss,
        });
        for (i, dip) in dips.iter().enumerate() {
            profit += dip.profit_at_take_profit;
            loss += dip.expected_loss;
            scenarios.push(DipScenario {
                fills: i + 1,
                profit_at_take_profit: profit,
                loss_at_stop: loss,
            });
        }

        Ok(DipBuyReport {
            main,
            reference_profit,
            main_expected_loss,
            dips,
            scenarios,
        })
    }

    fn dip_order(&self, side: Side, previous: f64, price: f64, reference_profit: f64) -> DipOrder {
        let sign = side.sign();
        let gap = (previous - price) * sign;
        let room_to_stop = (price - self.stop_loss) * sign;

        // No room back to the previous level, or the dip is already stopped out.
        let quantity = if gap > 0.0 && room_to_stop > 0.0 {
            reference_profit / gap
        } else {
            0.0
        };

        let (expected_loss, profit_at_take_profit) = if quantity > 0.0 {
            (
                quantity * room_to_stop,
                quantity * (self.take_profit - price) * sign,
            )
        } else {
            (0.0, 0.0)
        };

        DipOrder {
            price,
            gap,
            quantity,
            expected_loss,
            profit_at_take_profit,
        }
    }
}

impl DipBuyReport {
    pub fn side(&self) -> Side {
        self.main.side
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_long() -> DipBuyInputs {
        DipBuyInputs {
            entry: 100.0,
            take_profit: 120.0,
            stop_loss: 90.0,
            capital: 1000.0,
            risk_percent: 5.0,
            leverage: 10.0,
            dips: vec![95.0, 85.0],
        }
    }

    #[test]
    fn main_order_is_percent_risk_sized() {
        let r = default_long().evaluate().unwrap();
        assert_eq!(r.side(), Side::Long);
        assert_eq!(r.main.risk_amount, 50.0);
        assert_eq!(r.main.position_size, 5.0);
        assert_eq!(r.reference_profit, 100.0);
        assert_eq!(r.main_expected_loss, 50.0);
    }

    #[test]
    fn first_dip_recovers_reference_profit() {
        let r = default_long().evaluate().unwrap();
        let dip = r.dips[0];
        assert_eq!(dip.gap, 5.0);
        assert_eq!(dip.quantity, 20.0);
        assert_eq!(dip.expected_loss, 100.0);
        assert_eq!(dip.profit_at_take_profit, 500.0);
    }

    #[test]
    fn dip_below_stop_gets_nothing() {
        let r = default_long().evaluate().unwrap();
        let dip = r.dips[1];
        assert_eq!(dip.gap, 10.0);
        assert_eq!(dip.quantity, 0.0);
        assert_eq!(dip.expected_loss, 0.0);
    }

    #[test]
    fn dip_at_stop_gets_nothing() {
        let inputs = DipBuyInputs {
            dips: vec![90.0],
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.dips[0].gap, 10.0);
        assert_eq!(r.dips[0].quantity, 0.0);
    }

    #[test]
    fn out_of_order_dip_gets_nothing() {
        let inputs = DipBuyInputs {
            dips: vec![92.0, 96.0],
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.dips[0].quantity, 100.0 / 8.0);
        assert_eq!(r.dips[1].quantity, 0.0);
        assert!(r.dips[1].gap < 0.0);
    }

    #[test]
    fn short_dips_sit_above_entry() {
        let inputs = DipBuyInputs {
            entry: 100.0,
            take_profit: 80.0,
            stop_loss: 110.0,
            dips: vec![104.0, 108.0],
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.side(), Side::Short);
        assert_eq!(r.reference_profit, 100.0);
        assert_eq!(r.dips[0].quantity, 25.0);
        assert_eq!(r.dips[0].expected_loss, 150.0);
        assert_eq!(r.dips[1].quantity, 25.0);
        assert_eq!(r.dips[1].expected_loss, 50.0);
    }

    #[test]
    fn scenarios_accumulate_fills() {
        let inputs = DipBuyInputs {
            dips: vec![95.0, 92.0],
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.scenarios.len(), 3);
        assert_eq!(r.scenarios[0].profit_at_take_profit, 100.0);
        assert_eq!(r.scenarios[1].profit_at_take_profit, 100.0 + 20.0 * 25.0);
        let q2 = 100.0 / 3.0;
        let expected = 100.0 + 500.0 + q2 * 28.0;
        assert!((r.scenarios[2].profit_at_take_profit - expected).abs() < 1e-9);
        assert!((r.scenarios[2].loss_at_stop - (50.0 + 100.0 + q2 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn leverage_caps_main_order() {
        let inputs = DipBuyInputs {
            leverage: 0.2,
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert!(r.main.leverage_limited);
        assert_eq!(r.main.position_size, 2.0);
        assert_eq!(r.reference_profit, 40.0);
    }

    #[test]
    fn no_dips_is_fine() {
        let inputs = DipBuyInputs {
            dips: vec![],
            ..default_long()
        };
        let r = inputs.evaluate().unwrap();
        assert!(r.dips.is_empty());
        assert_eq!(r.scenarios.len(), 1);
    }

    #[test]
    fn same_side_targets_are_invalid() {
        let inputs = DipBuyInputs {
            take_profit: 95.0,
            ..default_long()
        };
        assert_eq!(inputs.evaluate().unwrap_err(), SetupError::StopsOnSameSide);
    }
}
