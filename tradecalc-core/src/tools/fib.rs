//! Fib sizing form: `capital`, `risk`, `rp`, `leverage`, `hi`, `lo`, `sl`,
//! `short`.

use serde::{Deserialize, Serialize};

use super::{price_constraints, risk_constraints, Edit, FieldId, FieldValue, FieldView, Tool, ToolForm, ToolReport};
use crate::calc::fib::{DEFAULT_STOP_LEVEL, FIB_STOP_LEVELS};
use crate::calc::{FibInputs, RiskBudget, Side};
use crate::error::SetupError;
use crate::input::NumericConstraints;
use crate::params::{BoolCodec, NumberCodec, OptionalCodec, ParamCell, ParamStore};

type NumberCell = ParamCell<OptionalCodec<NumberCodec>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FibDefaults {
    pub capital: f64,
    pub risk: f64,
    pub risk_percent: f64,
    pub max_leverage: f64,
    pub high: f64,
    pub low: f64,
    pub stop_level: usize,
}

impl Default for FibDefaults {
    fn default() -> Self {
        Self {
            capital: 1000.0,
            risk: 50.0,
            risk_percent: 5.0,
            max_leverage: 25.0,
            high: 198.38,
            low: 194.46,
            stop_level: DEFAULT_STOP_LEVEL,
        }
    }
}

#[derive(Debug)]
pub struct FibForm {
    defaults: FibDefaults,
    capital: NumberCell,
    risk: NumberCell,
    risk_is_percent: ParamCell<BoolCodec>,
    max_leverage: NumberCell,
    high: NumberCell,
    low: NumberCell,
    /// Stop menu index, absent when it is the default level.
    stop_level: NumberCell,
    short: ParamCell<BoolCodec>,
}

/// Whole, non-negative numbers only; anything else maps past the menu.
fn menu_index(raw: f64) -> usize {
    if raw >= 0.0 && raw.fract() == 0.0 && raw < usize::MAX as f64 {
        raw as usize
    } else {
        usize::MAX
    }
}

impl FibForm {
    pub fn new(store: &dyn ParamStore, defaults: FibDefaults) -> Self {
        let number = |key| ParamCell::mount(store, key, None, OptionalCodec(NumberCodec));
        Self {
            defaults,
            capital: number("capital"),
            risk: number("risk"),
            risk_is_percent: ParamCell::mount(store, "rp", false, BoolCodec),
            max_leverage: number("leverage"),
            high: number("hi"),
            low: number("lo"),
            stop_level: number("sl"),
            short: ParamCell::mount(store, "short", false, BoolCodec),
        }
    }

    fn capital(&self) -> f64 {
        self.capital.value().unwrap_or(self.defaults.capital)
    }

    fn risk_budget(&self) -> RiskBudget {
        let percent = *self.risk_is_percent.value();
        let fallback = if percent {
            self.defaults.risk_percent
        } else {
            self.defaults.risk
        };
        RiskBudget::from_flag(self.risk.value().unwrap_or(fallback), percent)
    }

    pub fn stop_level(&self) -> usize {
        self.stop_level
            .value()
            .map_or(self.defaults.stop_level, menu_index)
    }

    pub fn inputs(&self) -> FibInputs {
        let d = &self.defaults;
        FibInputs {
            high: self.high.value().unwrap_or(d.high),
            low: self.low.value().unwrap_or(d.low),
            side: if *self.short.value() { Side::Short } else { Side::Long },
            stop_level: self.stop_level(),
            capital: self.capital(),
            risk: self.risk_budget(),
            max_leverage: self.max_leverage.value().unwrap_or(d.max_leverage),
        }
    }

    fn toggle_risk_unit(&mut self, store: &mut dyn ParamStore) -> bool {
        let converted = self.risk_budget().toggled(self.capital());
        let wrote_flag = self.risk_is_percent.set_or_clear(store, converted.is_percent());
        let wrote_value = self.risk.set(store, Some(converted.value()));
        wrote_flag || wrote_value
    }

    fn choose_stop(&mut self, store: &mut dyn ParamStore, index: usize) -> bool {
        if index >= FIB_STOP_LEVELS.len() {
            return false;
        }
        // The default level is written as an absent key.
        let next = (index != self.defaults.stop_level).then_some(index as f64);
        self.stop_level.set_or_clear(store, next)
    }
}

impl ToolForm for FibForm {
    fn tool(&self) -> Tool {
        Tool::FibSizing
    }

    fn fields(&self) -> Vec<FieldView> {
        let d = &self.defaults;
        let percent = *self.risk_is_percent.value();
        vec![
            FieldView::number(FieldId::Param("capital"), "Capital", *self.capital.value(), d.capital, price_constraints()),
            FieldView::number(
                FieldId::Param("risk"),
                if percent { "Risk (%)" } else { "Risk ($)" },
                *self.risk.value(),
                if percent { d.risk_percent } else { d.risk },
                risk_constraints(percent, self.capital()),
            ),
            FieldView::toggle(FieldId::Param("rp"), "Risk as percent", percent),
            FieldView::number(
                FieldId::Param("leverage"),
                "Max leverage",
                *self.max_leverage.value(),
                d.max_leverage,
                NumericConstraints::NONE.min(0.0).max(super::PRICE_MAX),
            ),
            FieldView {
                id: FieldId::Param("sl"),
                label: "Stop loss".to_string(),
                value: FieldValue::Choice {
                    selected: self.stop_level(),
                    options: FIB_STOP_LEVELS.iter().map(|l| l.to_string()).collect(),
                },
            },
            FieldView::number(FieldId::Param("lo"), "Low", *self.low.value(), d.low, price_constraints()),
            FieldView::number(FieldId::Param("hi"), "High", *self.high.value(), d.high, price_constraints()),
            FieldView::toggle(FieldId::Param("short"), "Short", *self.short.value()),
        ]
    }

    fn apply(&mut self, store: &mut dyn ParamStore, field: FieldId, edit: Edit) -> bool {
        match (field, edit) {
            (FieldId::Param("capital"), Edit::Number(v)) => self.capital.set(store, v),
            (FieldId::Param("risk"), Edit::Number(v)) => self.risk.set(store, v),
            (FieldId::Param("leverage"), Edit::Number(v)) => self.max_leverage.set(store, v),
            (FieldId::Param("hi"), Edit::Number(v)) => self.high.set(store, v),
            (FieldId::Param("lo"), Edit::Number(v)) => self.low.set(store, v),
            (FieldId::Param("rp"), Edit::Toggle) => self.toggle_risk_unit(store),
            (FieldId::Param("short"), Edit::Toggle) => {
                let next = !*self.short.value();
                self.short.set_or_clear(store, next)
            }
            (FieldId::Param("sl"), Edit::Choose(i)) => self.choose_stop(store, i),
            (FieldId::Param("sl"), Edit::Toggle) => {
                let next = (self.stop_level() + 1) % FIB_STOP_LEVELS.len();
                self.choose_stop(store, next)
            }
            (field, edit) => {
                tracing::debug!(?field, ?edit, "edit ignored by fib form");
                false
            }
        }
    }

    fn sync(&mut self, store: &dyn ParamStore) -> bool {
        [
            self.capital.sync(store),
            self.risk.sync(store),
            self.risk_is_percent.sync(store),
            self.max_leverage.sync(store),
            self.high.sync(store),
            self.low.sync(store),
            self.stop_level.sync(store),
            self.short.sync(store),
        ]
        .contains(&true)
    }

    fn report(&self) -> Result<ToolReport, SetupError> {
        self.inputs().evaluate().map(ToolReport::FibSizing)
    }
}
