//! Risk/reward form: `p`, `f`, `r`, `b`, `s`.
//!
//! Unlike the other forms these cells carry their defaults directly, so the
//! inputs always show a number.

use serde::{Deserialize, Serialize};

use super::{Edit, FieldId, FieldView, Tool, ToolForm, ToolReport};
use crate::calc::RiskRewardInputs;
use crate::error::SetupError;
use crate::input::NumericConstraints;
use crate::params::{NumberCodec, ParamCell, ParamStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRewardDefaults {
    pub buying_power: f64,
    pub fee_percent: f64,
    pub ratio: f64,
    pub buy: f64,
    pub sell: f64,
}

impl Default for RiskRewardDefaults {
    fn default() -> Self {
        Self {
            buying_power: 4500.0,
            fee_percent: 0.1,
            ratio: 3.0,
            buy: 24.91,
            sell: 26.97,
        }
    }
}

#[derive(Debug)]
pub struct RiskRewardForm {
    buying_power: ParamCell<NumberCodec>,
    fee_percent: ParamCell<NumberCodec>,
    ratio: ParamCell<NumberCodec>,
    buy: ParamCell<NumberCodec>,
    sell: ParamCell<NumberCodec>,
}

impl RiskRewardForm {
    pub fn new(store: &dyn ParamStore, defaults: RiskRewardDefaults) -> Self {
        Self {
            buying_power: ParamCell::mount(store, "p", defaults.buying_power, NumberCodec),
            fee_percent: ParamCell::mount(store, "f", defaults.fee_percent, NumberCodec),
            ratio: ParamCell::mount(store, "r", defaults.ratio, NumberCodec),
            buy: ParamCell::mount(store, "b", defaults.buy, NumberCodec),
            sell: ParamCell::mount(store, "s", defaults.sell, NumberCodec),
        }
    }

    pub fn inputs(&self) -> RiskRewardInputs {
        RiskRewardInputs {
            buying_power: *self.buying_power.value(),
            fee_percent: *self.fee_percent.value(),
            ratio: *self.ratio.value(),
            buy: *self.buy.value(),
            sell: *self.sell.value(),
        }
    }

    fn cell_mut(&mut self, key: &str) -> Option<&mut ParamCell<NumberCodec>> {
        match key {
            "p" => Some(&mut self.buying_power),
            "f" => Some(&mut self.fee_percent),
            "r" => Some(&mut self.ratio),
            "b" => Some(&mut self.buy),
            "s" => Some(&mut self.sell),
            _ => None,
        }
    }
}

fn view(cell: &ParamCell<NumberCodec>, label: &str, constraints: NumericConstraints) -> FieldView {
    FieldView::number(
        FieldId::Param(cell.key()),
        label,
        Some(*cell.value()),
        *cell.default_value(),
        constraints,
    )
}

impl ToolForm for RiskRewardForm {
    fn tool(&self) -> Tool {
        Tool::RiskReward
    }

    fn fields(&self) -> Vec<FieldView> {
        let non_negative = NumericConstraints::NONE.min(0.0);
        vec![
            view(&self.buy, "Buy price", non_negative),
            view(&self.sell, "Sell price", non_negative),
            view(&self.ratio, "Risk ratio", non_negative),
            view(&self.buying_power, "Buying power", non_negative),
            view(&self.fee_percent, "Trading fee (%)", non_negative.max(100.0)),
        ]
    }

    fn apply(&mut self, store: &mut dyn ParamStore, field: FieldId, edit: Edit) -> bool {
        let (FieldId::Param(key), Edit::Number(value)) = (field, edit) else {
            tracing::debug!(?field, ?edit, "edit ignored by risk/reward form");
            return false;
        };
        let Some(cell) = self.cell_mut(key) else {
            return false;
        };
        match value {
            Some(v) => cell.set(store, v),
            None => {
                let explicit = cell.is_explicit(store);
                cell.reset(store);
                explicit
            }
        }
    }

    fn sync(&mut self, store: &dyn ParamStore) -> bool {
        [
            self.buying_power.sync(store),
            self.fee_percent.sync(store),
            self.ratio.sync(store),
            self.buy.sync(store),
            self.sell.sync(store),
        ]
        .contains(&true)
    }

    fn report(&self) -> Result<ToolReport, SetupError> {
        self.inputs().evaluate().map(ToolReport::RiskReward)
    }
}
