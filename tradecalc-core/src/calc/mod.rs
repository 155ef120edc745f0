//! Calculation engines.
//!
//! Every engine is a pure function from an inputs struct to a report struct.
//! Invalid setups come back as `Err(SetupError)`; no engine ever hands NaN or
//! infinity to the presentation layer.
//!
//! - `sizing`: risk-budgeted position size with a leverage cap
//! - `trailing`: trailing-stop ladder in R multiples
//! - `fib`: Fibonacci level table and fib-anchored sizing
//! - `dip_buy`: averaging orders below/above the main entry
//! - `risk_reward`: share count and stop from a target reward ratio

pub mod dip_buy;
pub mod fib;
pub mod risk_reward;
pub mod sizing;
pub mod trailing;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use dip_buy::{DipBuyInputs, DipBuyReport, DipOrder, DipScenario};
pub use fib::{FibInputs, FibLevel, FibRange, FibReport, FIB_ENTRY_LEVEL, FIB_LEVELS, FIB_STOP_LEVELS};
pub use risk_reward::{RiskRewardInputs, RiskRewardReport, MAX_EXACT_SHARES};
pub use sizing::{
    orders_summary, size_position, OrderKind, OrderLine, PositionSize, RewardGrade, RiskBudget, SizingInputs, SizingReport,
};
pub use trailing::{LockOutcome, Rung, RungReport, TrailingLadder};

/// Trade direction, derived from where the stop sits relative to entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Short when the stop is above entry, long otherwise.
    pub fn from_stop(entry: f64, stop_loss: f64) -> Self {
        if entry < stop_loss {
            Side::Short
        } else {
            Side::Long
        }
    }

    pub fn is_short(self) -> bool {
        self == Side::Short
    }

    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}
