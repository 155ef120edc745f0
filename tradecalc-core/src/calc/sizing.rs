//! Position sizing
//!
//! Size a position so that hitting the stop loses a fixed risk budget, capped
//! by the leverage the account allows.
//!
//! # Formula
//! ```text
//! risk_unit          = |entry - stop_loss|
//! computed_size      = risk_amount / risk_unit
//! max_allowed_size   = capital * max_leverage / entry
//! position_size      = min(computed_size, max_allowed_size)   (floored when discrete)
//! actual_risk        = position_size * risk_unit
//! ```
//!
//! # Example
//! - Entry $100, stop $90, take profit $120
//! - Capital $1,000, risk $50, max leverage 100x
//! - Risk unit $10, size 5, potential win $100, reward ratio 2R

use serde::{Deserialize, Serialize};

use super::trailing::TrailingLadder;
use super::Side;
use crate::error::SetupError;

/// How much of the account a trade may lose at its stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum RiskBudget {
    /// Absolute currency amount.
    Amount(f64),
    /// Percent of capital (10 = 10%).
    Percent(f64),
}

impl RiskBudget {
    pub fn from_flag(value: f64, is_percent: bool) -> Self {
        if is_percent {
            RiskBudget::Percent(value)
        } else {
            RiskBudget::Amount(value)
        }
    }

    /// The number as entered, in its own unit.
    pub fn value(self) -> f64 {
        match self {
            RiskBudget::Amount(v) | RiskBudget::Percent(v) => v,
        }
    }

    pub fn is_percent(self) -> bool {
        matches!(self, RiskBudget::Percent(_))
    }

    /// Risk in currency for a given capital.
    pub fn amount(self, capital: f64) -> f64 {
        match self {
            RiskBudget::Amount(v) => v,
            RiskBudget::Percent(p) => capital * p / 100.0,
        }
    }

    /// Same risk expressed in the other unit.
    ///
    /// A zero capital cannot express an amount as a percent; the percent then
    /// reads as zero rather than infinity.
    pub fn toggled(self, capital: f64) -> Self {
        match self {
            RiskBudget::Amount(v) => {
                let pct = if capital > 0.0 { v / capital * 100.0 } else { 0.0 };
                RiskBudget::Percent(pct)
            }
            RiskBudget::Percent(p) => RiskBudget::Amount(capital * p / 100.0),
        }
    }
}

/// Inputs shared by every risk-budgeted sizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingInputs {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub capital: f64,
    pub risk: RiskBudget,
    pub max_leverage: f64,
    pub discrete: bool,
}

/// The sized position, before any take-profit math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSize {
    pub side: Side,
    pub risk_unit: f64,
    pub risk_amount: f64,
    pub risk_percent: f64,
    pub computed_position_size: f64,
    pub max_allowed_position_size: f64,
    pub position_size: f64,
    /// The leverage cap bound: `actual_risk` is below `risk_amount`.
    pub leverage_limited: bool,
    pub actual_risk: f64,
    pub position_value: f64,
    /// Notional over capital. Not capped.
    pub required_leverage: f64,
    /// Whole-number leverage to set on the exchange order.
    pub order_leverage: f64,
}

/// Full position-sizing result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizingReport {
    #[serde(flatten)]
    pub position: PositionSize,
    pub potential_win: f64,
    pub risk_reward_ratio: f64,
    /// Distance from entry to take profit, percent of entry.
    pub take_profit_change_percent: f64,
    /// Size without leverage: never more than capital buys outright.
    pub unleveraged_position_size: f64,
    pub unleveraged_position_value: f64,
}

/// Risk budget to size, without any take-profit.
///
/// Shared with the fib and dip-buy engines.
pub fn size_position(
    entry: f64,
    stop_loss: f64,
    capital: f64,
    risk: RiskBudget,
    max_leverage: f64,
    discrete: bool,
) -> Result<PositionSize, SetupError> {
    let entry = SetupError::positive("entry", entry)?;
    let stop_loss = SetupError::finite("stop_loss", stop_loss)?;
    let capital = SetupError::positive("capital", capital)?;
    let max_leverage = SetupError::positive("max_leverage", max_leverage)?;
    SetupError::non_negative("risk", risk.value())?;

    let risk_unit = (entry - stop_loss).abs();
    if risk_unit == 0.0 {
        return Err(SetupError::ZeroRiskUnit);
    }

    let risk_amount = risk.amount(capital);
    let risk_percent = risk_amount / capital * 100.0;

    let computed = risk_amount / risk_unit;
    let max_allowed = capital * max_leverage / entry;
    let leverage_limited = computed > max_allowed;

    let mut position_size = computed.min(max_allowed);
    if discrete {
        position_size = position_size.floor();
    }

    let position_value = entry * position_size;
    let required_leverage = position_value / capital;

    Ok(PositionSize {
        side: Side::from_stop(entry, stop_loss),
        risk_unit,
        risk_amount,
        risk_percent,
        computed_position_size: computed,
        max_allowed_position_size: max_allowed,
        position_size,
        leverage_limited,
        actual_risk: position_size * risk_unit,
        position_value,
        required_leverage,
        order_leverage: order_leverage(required_leverage, max_leverage),
    })
}

/// `clamp(ceil(required), 1, max(1, max_leverage))`.
pub fn order_leverage(required_leverage: f64, max_leverage: f64) -> f64 {
    required_leverage.ceil().clamp(1.0, max_leverage.max(1.0))
}

/// `true` when stop and take profit sit on opposite sides of entry.
pub fn brackets_entry(entry: f64, stop_loss: f64, take_profit: f64) -> bool {
    (stop_loss < entry && entry < take_profit) || (stop_loss > entry && entry > take_profit)
}

impl SizingInputs {
    pub fn side(&self) -> Side {
        Side::from_stop(self.entry, self.stop_loss)
    }

    pub fn evaluate(&self) -> Result<SizingReport, SetupError> {
        let take_profit = SetupError::finite("take_profit", self.take_profit)?;
        let position = size_position(
            self.entry,
            self.stop_loss,
            self.capital,
            self.risk,
            self.max_leverage,
            self.discrete,
        )?;
        if !brackets_entry(self.entry, self.stop_loss, take_profit) {
            return Err(SetupError::StopsOnSameSide);
        }

        let reward_distance = (take_profit - self.entry).abs();
        let unleveraged = position
            .computed_position_size
            .min(self.capital / self.entry);

        Ok(SizingReport {
            position,
            potential_win: position.position_size * reward_distance,
            risk_reward_ratio: reward_distance / position.risk_unit,
            take_profit_change_percent: reward_distance * 100.0 / self.entry,
            unleveraged_position_size: unleveraged,
            unleveraged_position_value: unleveraged * self.entry,
        })
    }
}

impl SizingReport {
    /// Highest R the trailing lock may reach, one decimal, rounded down.
    pub fn lock_ceiling(&self) -> f64 {
        TrailingLadder::lock_ceiling(self.risk_reward_ratio)
    }

    pub fn grade(&self) -> RewardGrade {
        RewardGrade::of(self.risk_reward_ratio)
    }
}

/// Coarse quality bucket for a reward ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardGrade {
    Bad,
    Poor,
    Marginal,
    Fair,
    Good,
    Great,
    Excellent,
}

impl RewardGrade {
    pub fn of(ratio: f64) -> Self {
        match ratio {
            r if r > 10.0 => RewardGrade::Excellent,
            r if r > 7.0 => RewardGrade::Great,
            r if r > 4.0 => RewardGrade::Good,
            r if r > 3.0 => RewardGrade::Fair,
            r if r > 2.5 => RewardGrade::Marginal,
            r if r > 2.0 => RewardGrade::Poor,
            _ => RewardGrade::Bad,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RewardGrade::Excellent => "excellent",
            RewardGrade::Great => "great",
            RewardGrade::Good => "good",
            RewardGrade::Fair => "fair",
            RewardGrade::Marginal => "marginal",
            RewardGrade::Poor => "poor",
            RewardGrade::Bad => "bad",
        }
    }
}

/// What a line of the orders summary asks the trader to place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderKind {
    Entry { side: Side },
    StopLoss,
    TakeProfit,
    TrailingStop { rung: usize },
}

/// One order to place on the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub kind: OrderKind,
    /// Entry price, stop price, take-profit price or trailing trigger.
    pub price: f64,
    /// Limit price for trailing stops.
    pub limit: Option<f64>,
    pub size: Option<f64>,
    pub leverage: Option<f64>,
}

/// Orders to place for a sized setup: entry, stop, take profit, then one
/// trailing stop per ladder rung.
pub fn orders_summary(inputs: &SizingInputs, report: &SizingReport, ladder: &TrailingLadder) -> Vec<OrderLine> {
    let mut orders = vec![
        OrderLine {
            kind: OrderKind::Entry {
                side: report.position.side,
            },
            price: inputs.entry,
            limit: None,
            size: Some(report.position.position_size),
            leverage: Some(report.position.order_leverage),
        },
        OrderLine {
            kind: OrderKind::StopLoss,
            price: inputs.stop_loss,
            limit: None,
            size: None,
            leverage: None,
        },
        OrderLine {
            kind: OrderKind::TakeProfit,
            price: inputs.take_profit,
            limit: None,
            size: None,
            leverage: None,
        },
    ];

    let rungs = ladder.evaluate(inputs.entry, inputs.stop_loss, report.position.position_size);
    orders.extend(rungs.iter().enumerate().map(|(i, rung)| OrderLine {
        kind: OrderKind::TrailingStop { rung: i },
        price: rung.trigger_price,
        limit: Some(rung.limit_price),
        size: None,
        leverage: None,
    }));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> SizingInputs {
        SizingInputs {
            entry: 100.0,
            stop_loss: 90.0,
            take_profit: 120.0,
            capital: 1000.0,
            risk: RiskBudget::Amount(50.0),
            max_leverage: 100.0,
            discrete: false,
        }
    }

    #[test]
    fn long_setup_sizes_by_risk() {
        let r = scenario_a().evaluate().unwrap();
        assert_eq!(r.position.side, Side::Long);
        assert_eq!(r.position.risk_unit, 10.0);
        assert_eq!(r.position.computed_position_size, 5.0);
        assert_eq!(r.position.max_allowed_position_size, 1000.0);
        assert!(!r.position.leverage_limited);
        assert_eq!(r.position.position_size, 5.0);
        assert_eq!(r.position.actual_risk, 50.0);
        assert_eq!(r.potential_win, 100.0);
        assert_eq!(r.risk_reward_ratio, 2.0);
        assert_eq!(r.take_profit_change_percent, 20.0);
        assert_eq!(r.position.position_value, 500.0);
        assert_eq!(r.position.required_leverage, 0.5);
        assert_eq!(r.position.order_leverage, 1.0);
    }

    #[test]
    fn short_setup_mirrors_long() {
        let inputs = SizingInputs {
            entry: 100.0,
            stop_loss: 110.0,
            take_profit: 70.0,
            ..scenario_a()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.position.side, Side::Short);
        assert_eq!(r.position.position_size, 5.0);
        assert_eq!(r.potential_win, 150.0);
        assert_eq!(r.risk_reward_ratio, 3.0);
    }

    #[test]
    fn leverage_cap_binds_below_half() {
        let inputs = SizingInputs {
            max_leverage: 0.25,
            ..scenario_a()
        };
        let r = inputs.evaluate().unwrap();
        assert!(r.position.leverage_limited);
        assert_eq!(r.position.position_size, 2.5);
        assert_eq!(r.position.actual_risk, 25.0);
        assert!(r.position.actual_risk < r.position.risk_amount);
        assert_eq!(r.position.order_leverage, 1.0);
    }

    #[test]
    fn percent_budget_converts_through_capital() {
        let inputs = SizingInputs {
            risk: RiskBudget::Percent(5.0),
            ..scenario_a()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.position.risk_amount, 50.0);
        assert_eq!(r.position.risk_percent, 5.0);
    }

    #[test]
    fn discrete_floors_and_ratio_survives_empty_position() {
        let inputs = SizingInputs {
            risk: RiskBudget::Amount(5.0),
            discrete: true,
            ..scenario_a()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.position.position_size, 0.0);
        assert_eq!(r.position.actual_risk, 0.0);
        assert_eq!(r.risk_reward_ratio, 2.0);
        assert!(r.risk_reward_ratio.is_finite());
    }

    #[test]
    fn order_leverage_rounds_up_and_respects_cap() {
        assert_eq!(order_leverage(0.2, 100.0), 1.0);
        assert_eq!(order_leverage(3.01, 100.0), 4.0);
        assert_eq!(order_leverage(12.5, 10.0), 10.0);
        assert_eq!(order_leverage(0.1, 0.5), 1.0);
    }

    #[test]
    fn unleveraged_size_is_capped_by_capital() {
        let inputs = SizingInputs {
            risk: RiskBudget::Amount(500.0),
            ..scenario_a()
        };
        let r = inputs.evaluate().unwrap();
        assert_eq!(r.position.position_size, 50.0);
        assert_eq!(r.unleveraged_position_size, 10.0);
        assert_eq!(r.unleveraged_position_value, 1000.0);
        assert_eq!(r.position.order_leverage, 5.0);
    }

    #[test]
    fn invalid_setups_are_errors() {
        let same = SizingInputs {
            stop_loss: 100.0,
            ..scenario_a()
        };
        assert_eq!(same.evaluate(), Err(SetupError::ZeroRiskUnit));

        let wrong_side = SizingInputs {
            take_profit: 95.0,
            ..scenario_a()
        };
        assert_eq!(wrong_side.evaluate(), Err(SetupError::StopsOnSameSide));

        let broke = SizingInputs {
            capital: 0.0,
            ..scenario_a()
        };
        assert!(matches!(broke.evaluate(), Err(SetupError::NonPositive { field: "capital", .. })));

        let nan = SizingInputs {
            entry: f64::NAN,
            ..scenario_a()
        };
        assert_eq!(nan.evaluate(), Err(SetupError::NonFinite { field: "entry" }));
    }

    #[test]
    fn risk_toggle_converts_value() {
        assert_eq!(RiskBudget::Amount(50.0).toggled(1000.0), RiskBudget::Percent(5.0));
        assert_eq!(RiskBudget::Percent(10.0).toggled(1000.0), RiskBudget::Amount(100.0));
        assert_eq!(RiskBudget::Amount(50.0).toggled(0.0), RiskBudget::Percent(0.0));
    }

    #[test]
    fn grades_follow_thresholds() {
        assert_eq!(RewardGrade::of(2.0), RewardGrade::Bad);
        assert_eq!(RewardGrade::of(2.2), RewardGrade::Poor);
        assert_eq!(RewardGrade::of(3.5), RewardGrade::Fair);
        assert_eq!(RewardGrade::of(11.0), RewardGrade::Excellent);
    }

    #[test]
    fn orders_summary_lists_trailing_rungs() {
        let inputs = scenario_a();
        let report = inputs.evaluate().unwrap();
        let ladder = TrailingLadder::default();
        let orders = orders_summary(&inputs, &report, &ladder);

        assert_eq!(orders.len(), 5);
        assert_eq!(orders[0].kind, OrderKind::Entry { side: Side::Long });
        assert_eq!(orders[0].size, Some(5.0));
        assert_eq!(orders[1].price, 90.0);
        assert_eq!(orders[2].price, 120.0);
        assert_eq!(orders[3].kind, OrderKind::TrailingStop { rung: 0 });
        assert_eq!(orders[3].price, 120.0);
        assert_eq!(orders[3].limit, Some(100.0));
        assert_eq!(orders[4].price, 140.0);
        assert_eq!(orders[4].limit, Some(110.0));
    }
}
