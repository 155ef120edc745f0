//! Risk-reward summary
//!
//! Given a buy price, a sell target and the reward ratio the trader wants,
//! derive the stop that delivers that ratio and how many whole shares the
//! buying power covers after fees.
//!
//! # Formula
//! ```text
//! stop_loss = buy - (sell - buy) / ratio
//! shares    = largest n with n * buy * (1 + fee / 100) <= buying_power
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Largest share count an `f64` still counts in steps of one (2^53).
pub const MAX_EXACT_SHARES: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskRewardInputs {
    pub buying_power: f64,
    /// Trading fee in percent of the order value.
    pub fee_percent: f64,
    pub ratio: f64,
    pub buy: f64,
    pub sell: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskRewardReport {
    pub stop_loss_price: f64,
    pub shares: u64,
    pub total_price: f64,
    pub total_fee: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    /// Move from buy to sell, percent of buy.
    pub max_gain_percent: f64,
    /// Move from buy to stop, percent of buy.
    pub max_loss_percent: f64,
}

impl RiskRewardInputs {
    pub fn evaluate(&self) -> Result<RiskRewardReport, SetupError> {
        let buy = SetupError::positive("buy", self.buy)?;
        let sell = SetupError::finite("sell", self.sell)?;
        let ratio = SetupError::positive("ratio", self.ratio)?;
        let buying_power = SetupError::non_negative("buying_power", self.buying_power)?;
        let fee_percent = SetupError::non_negative("fee", self.fee_percent)?;

        let stop_loss_price = buy - (sell - buy) / ratio;

        let cost = |n: f64| {
            let price = n * buy;
            (price, price * fee_percent / 100.0)
        };
        let fits = |n: f64| {
            let (price, fee) = cost(n);
            price + fee <= buying_power
        };

        let mut shares = (buying_power / (buy * (1.0 + fee_percent / 100.0))).floor();
        if shares > MAX_EXACT_SHARES {
            return Err(SetupError::TooLarge {
                field: "shares",
                value: shares,
            });
        }
        // The quotient can be off by one either way after rounding.
        if fits(shares + 1.0) {
            shares += 1.0;
        } else if shares > 0.0 && !fits(shares) {
            shares -= 1.0;
        }
        let (total_price, total_fee) = cost(shares);

        Ok(RiskRewardReport {
            stop_loss_price,
            shares: shares as u64,
            total_price,
            total_fee,
            max_profit: shares * sell - total_price,
            max_loss: total_price - shares * stop_loss_price,
            max_gain_percent: 100.0 * (sell / buy - 1.0),
            max_loss_percent: 100.0 * (1.0 - stop_loss_price / buy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RiskRewardInputs {
        RiskRewardInputs {
            buying_power: 4500.0,
            fee_percent: 0.1,
            ratio: 3.0,
            buy: 24.91,
            sell: 26.97,
        }
    }

    #[test]
    fn default_trade() {
        let r = defaults().evaluate().unwrap();
        assert!((r.stop_loss_price - 24.223_333).abs() < 1e-6);
        assert_eq!(r.shares, 180);
        assert!(180.0 * 24.91 * 1.001 <= 4500.0);
        assert!(181.0 * 24.91 * 1.001 > 4500.0);
        assert!((r.max_profit - 180.0 * (26.97 - 24.91)).abs() < 1e-9);
        assert!((r.max_loss * 3.0 - r.max_profit).abs() < 1e-6);
    }

    #[test]
    fn fee_can_cost_a_share() {
        let inputs = RiskRewardInputs {
            buying_power: 1000.0,
            fee_percent: 1.0,
            buy: 10.0,
            ..defaults()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.shares, 99);
        assert!((r.total_fee - 9.9).abs() < 1e-9);
    }

    #[test]
    fn tiny_budget_buys_nothing() {
        let inputs = RiskRewardInputs {
            buying_power: 10.0,
            ..defaults()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.shares, 0);
        assert_eq!(r.total_price, 0.0);
        assert_eq!(r.max_profit, 0.0);
        assert_eq!(r.max_loss, 0.0);
    }

    #[test]
    fn percent_summaries() {
        let inputs = RiskRewardInputs {
            buy: 100.0,
            sell: 130.0,
            ratio: 3.0,
            ..defaults()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.stop_loss_price, 90.0);
        assert!((r.max_gain_percent - 30.0).abs() < 1e-9);
        assert!((r.max_loss_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn huge_budget_is_rejected_not_looped() {
        let inputs = RiskRewardInputs {
            buying_power: 1e17,
            buy: 1.0,
            sell: 2.0,
            ..defaults()
        };
        assert!(matches!(
            inputs.evaluate(),
            Err(SetupError::TooLarge { field: "shares", .. })
        ));

        let inputs = RiskRewardInputs {
            buying_power: 1e300,
            buy: 1.0,
            ..defaults()
        };
        assert!(inputs.evaluate().is_err());
    }

    #[test]
    fn largest_exact_budget_still_counts() {
        let inputs = RiskRewardInputs {
            buying_power: 1e15,
            fee_percent: 0.0,
            buy: 1.0,
            sell: 2.0,
            ..defaults()
        };
        assert_eq!(inputs.evaluate().unwrap().shares, 1_000_000_000_000_000);
    }

    #[test]
    fn zero_ratio_is_invalid() {
        let inputs = RiskRewardInputs {
            ratio: 0.0,
            ..defaults()
        };
        assert_eq!(
            inputs.evaluate(),
            Err(SetupError::NonPositive { field: "ratio", value: 0.0 })
        );
    }
}
