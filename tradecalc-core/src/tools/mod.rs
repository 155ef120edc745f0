//! Calculator forms.
//!
//! A form owns the `ParamCell`s of one tool, turns their values (or the
//! configured defaults for absent keys) into engine inputs and evaluates the
//! engine. Forms never hold derived numbers: every read goes through
//! `report()`, which recomputes from the cells.
//!
//! Presentation layers drive forms through `ToolForm`: `fields()` describes
//! what to draw, `apply()` commits one edit to cells and store.

pub mod dip_buy;
pub mod fib;
pub mod position_sizing;
pub mod risk_reward;
pub mod summary;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::calc::{DipBuyReport, FibReport, RiskRewardReport, RungReport, SizingReport};
use crate::error::{FieldError, SetupError};
use crate::input::{NumericConstraints, NumericField};
use crate::params::ParamStore;

pub use dip_buy::{DipBuyDefaults, DipBuyForm};
pub use fib::{FibDefaults, FibForm};
pub use position_sizing::{PositionSizingDefaults, PositionSizingForm};
pub use risk_reward::{RiskRewardDefaults, RiskRewardForm};
pub use summary::Section;

/// Upper bound on price and capital inputs.
pub const PRICE_MAX: f64 = 100e6;

/// The calculators in the toolbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    PositionSizing,
    FibSizing,
    DipBuy,
    RiskReward,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::PositionSizing, Tool::FibSizing, Tool::DipBuy, Tool::RiskReward];

    /// URL fragment route, e.g. `#/position-sizing`.
    pub fn route(self) -> &'static str {
        match self {
            Tool::PositionSizing => "/position-sizing",
            Tool::FibSizing => "/fib-sizing",
            Tool::DipBuy => "/dip-buy",
            Tool::RiskReward => "/risk-reward",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tool::PositionSizing => "Position sizing",
            Tool::FibSizing => "Fib position sizing",
            Tool::DipBuy => "Dip buy",
            Tool::RiskReward => "Risk / reward",
        }
    }

    /// Resolve a fragment such as `/dip-buy` (leading `#` optional).
    pub fn from_route(fragment: &str) -> Option<Tool> {
        let fragment = fragment.trim_start_matches('#');
        Tool::ALL.into_iter().find(|t| t.route() == fragment)
    }

    pub fn next(self) -> Tool {
        let i = Tool::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Tool::ALL[(i + 1) % Tool::ALL.len()]
    }

    pub fn prev(self) -> Tool {
        let i = Tool::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Tool::ALL[(i + Tool::ALL.len() - 1) % Tool::ALL.len()]
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route().trim_start_matches('/'))
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Tool::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .or_else(|| Tool::from_route(&s))
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}

/// Which input a view or an edit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// A scalar parameter, by query key.
    Param(&'static str),
    RungTrigger(usize),
    RungLock(usize),
    Dip(usize),
}

/// Current state of one input, for drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `value` is `None` when the key is absent and `placeholder` applies.
    Number {
        value: Option<f64>,
        placeholder: f64,
        constraints: NumericConstraints,
    },
    Toggle(bool),
    Choice {
        selected: usize,
        options: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub id: FieldId,
    pub label: String,
    pub value: FieldValue,
}

impl FieldView {
    pub fn number(id: FieldId, label: impl Into<String>, value: Option<f64>, placeholder: f64, constraints: NumericConstraints) -> Self {
        Self {
            id,
            label: label.into(),
            value: FieldValue::Number {
                value,
                placeholder,
                constraints,
            },
        }
    }

    pub fn toggle(id: FieldId, label: impl Into<String>, on: bool) -> Self {
        Self {
            id,
            label: label.into(),
            value: FieldValue::Toggle(on),
        }
    }
}

/// One committed edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    /// `None` clears the field back to its placeholder.
    Number(Option<f64>),
    Toggle,
    Choose(usize),
}

/// Structural edits on list-shaped parameters (ladder rungs, dip levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEdit {
    Append,
    Remove(usize),
}

/// Evaluated output of whichever tool is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolReport {
    PositionSizing {
        #[serde(flatten)]
        report: SizingReport,
        trailing: Vec<RungReport>,
        orders: Vec<crate::calc::OrderLine>,
    },
    FibSizing(FibReport),
    DipBuy(DipBuyReport),
    RiskReward(RiskRewardReport),
}

/// Common surface of every calculator form.
pub trait ToolForm {
    fn tool(&self) -> Tool;

    /// Inputs in display order.
    fn fields(&self) -> Vec<FieldView>;

    /// Commit one edit. Returns whether the store changed.
    fn apply(&mut self, store: &mut dyn ParamStore, field: FieldId, edit: Edit) -> bool;

    /// Append or remove list entries. Tools without lists ignore it.
    fn apply_list(&mut self, _store: &mut dyn ParamStore, _edit: ListEdit) -> bool {
        false
    }

    /// Re-decode every cell after navigation. Returns whether anything changed.
    fn sync(&mut self, store: &dyn ParamStore) -> bool;

    fn report(&self) -> Result<ToolReport, SetupError>;
}

/// Fallback values for every tool, one section each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    pub position_sizing: PositionSizingDefaults,
    pub fib: FibDefaults,
    pub dip_buy: DipBuyDefaults,
    pub risk_reward: RiskRewardDefaults,
}

/// Build the form for `tool`, decoding its cells from `store`.
pub fn mount_form(tool: Tool, store: &dyn ParamStore, defaults: &ToolDefaults) -> Box<dyn ToolForm> {
    match tool {
        Tool::PositionSizing => Box::new(PositionSizingForm::new(store, defaults.position_sizing.clone())),
        Tool::FibSizing => Box::new(FibForm::new(store, defaults.fib.clone())),
        Tool::DipBuy => Box::new(DipBuyForm::new(store, defaults.dip_buy.clone())),
        Tool::RiskReward => Box::new(RiskRewardForm::new(store, defaults.risk_reward.clone())),
    }
}

/// Apply a textual edit to the scalar parameter `key`, as if typed into the
/// field and blurred. An empty number clears the field. Returns whether the
/// store changed.
pub fn apply_text(form: &mut dyn ToolForm, store: &mut dyn ParamStore, key: &str, raw: &str) -> Result<bool, FieldError> {
    let fields = form.fields();
    let Some(view) = fields.iter().find(|f| matches!(f.id, FieldId::Param(k) if k == key)) else {
        let known = fields
            .iter()
            .filter_map(|f| match f.id {
                FieldId::Param(k) => Some(k),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", ");
        return Err(FieldError::UnknownKey {
            key: key.to_string(),
            known,
        });
    };

    let raw = raw.trim();
    let edit = match &view.value {
        FieldValue::Number { value, constraints, .. } => {
            let mut field = NumericField::new(*value, *constraints);
            field.on_raw_change(raw);
            let committed = field.on_blur();
            if committed.is_none() && !raw.is_empty() {
                return Err(FieldError::InvalidNumber {
                    key: key.to_string(),
                    raw: raw.to_string(),
                });
            }
            Edit::Number(committed)
        }
        FieldValue::Toggle(on) => {
            let wanted = match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(FieldError::InvalidToggle {
                        key: key.to_string(),
                        raw: raw.to_string(),
                    })
                }
            };
            if wanted == *on {
                return Ok(false);
            }
            Edit::Toggle
        }
        FieldValue::Choice { options, .. } => match raw.parse::<usize>() {
            Ok(i) if i < options.len() => Edit::Choose(i),
            _ => {
                return Err(FieldError::InvalidChoice {
                    key: key.to_string(),
                    raw: raw.to_string(),
                    len: options.len(),
                })
            }
        },
    };
    let id = view.id;
    Ok(form.apply(store, id, edit))
}

/// `min 0, max PRICE_MAX`, shared by prices and capital.
pub(crate) fn price_constraints() -> NumericConstraints {
    NumericConstraints::NONE.min(0.0).max(PRICE_MAX)
}

/// Risk input bounds: amounts up to capital, percents up to 100.
pub(crate) fn risk_constraints(is_percent: bool, capital: f64) -> NumericConstraints {
    let max = if is_percent { 100.0 } else { capital.max(0.0) };
    NumericConstraints::NONE.min(0.0).max(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_route(tool.route()), Some(tool));
            assert_eq!(format!("#{}", tool.route()).parse::<Tool>(), Ok(tool));
            assert_eq!(tool.to_string().parse::<Tool>(), Ok(tool));
        }
        assert_eq!(Tool::from_route("/nope"), None);
    }

    #[test]
    fn next_and_prev_cycle() {
        assert_eq!(Tool::RiskReward.next(), Tool::PositionSizing);
        assert_eq!(Tool::PositionSizing.prev(), Tool::RiskReward);
        assert_eq!(Tool::FibSizing.next().prev(), Tool::FibSizing);
    }

    #[test]
    fn mounted_forms_match_their_tool() {
        let store = crate::params::LocationStore::default();
        let defaults = ToolDefaults::default();
        for tool in Tool::ALL {
            let form = mount_form(tool, &store, &defaults);
            assert_eq!(form.tool(), tool);
            assert!(form.report().is_ok(), "{tool} defaults should evaluate");
            assert!(!form.fields().is_empty());
        }
    }

    #[test]
    fn text_edits_commit_like_a_blur() {
        let mut store = crate::params::LocationStore::default();
        let mut form = mount_form(Tool::PositionSizing, &store, &ToolDefaults::default());

        assert_eq!(apply_text(form.as_mut(), &mut store, "entry", "101.5"), Ok(true));
        assert_eq!(store.get("entry").as_deref(), Some("101.5"));

        // Max leverage snaps to its 0.1 grid from 1.
        assert_eq!(apply_text(form.as_mut(), &mut store, "ml", "12.34"), Ok(true));
        assert_eq!(store.get("ml").as_deref(), Some("12.3"));

        assert_eq!(apply_text(form.as_mut(), &mut store, "discrete", "yes"), Ok(true));
        assert_eq!(apply_text(form.as_mut(), &mut store, "discrete", "true"), Ok(false));

        assert_eq!(apply_text(form.as_mut(), &mut store, "entry", ""), Ok(true));
        assert_eq!(store.get("entry"), None);
    }

    #[test]
    fn text_edits_report_bad_input() {
        let mut store = crate::params::LocationStore::default();
        let mut form = mount_form(Tool::FibSizing, &store, &ToolDefaults::default());

        assert!(matches!(
            apply_text(form.as_mut(), &mut store, "nope", "1"),
            Err(FieldError::UnknownKey { .. })
        ));
        assert!(matches!(
            apply_text(form.as_mut(), &mut store, "hi", "abc"),
            Err(FieldError::InvalidNumber { .. })
        ));
        assert!(matches!(
            apply_text(form.as_mut(), &mut store, "sl", "7"),
            Err(FieldError::InvalidChoice { len: 4, .. })
        ));
        assert_eq!(apply_text(form.as_mut(), &mut store, "sl", "1"), Ok(true));
        assert_eq!(store.query(), Some("sl=1"));
    }

    #[test]
    fn risk_bounds_follow_unit() {
        assert_eq!(risk_constraints(false, 1000.0).max, Some(1000.0));
        assert_eq!(risk_constraints(true, 1000.0).max, Some(100.0));
    }
}
