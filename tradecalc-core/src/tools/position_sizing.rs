//! Position-sizing form: `entry`, `tp`, `sl`, `capital`, `discrete`, `ra`,
//! `rp`, `ml`, `ts`.

use serde::{Deserialize, Serialize};

use super::{price_constraints, risk_constraints, Edit, FieldId, FieldView, ListEdit, Tool, ToolForm, ToolReport};
use crate::calc::{orders_summary, RiskBudget, SizingInputs, TrailingLadder};
use crate::error::SetupError;
use crate::input::NumericConstraints;
use crate::params::{BoolCodec, JsonCodec, NumberCodec, OptionalCodec, ParamCell, ParamStore};

type NumberCell = ParamCell<OptionalCodec<NumberCodec>>;

/// Values used when a key is absent from the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizingDefaults {
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub capital: f64,
    pub risk: f64,
    pub risk_percent: f64,
    pub max_leverage: f64,
}

impl Default for PositionSizingDefaults {
    fn default() -> Self {
        Self {
            entry: 2.8249,
            take_profit: 2.6643,
            stop_loss: 2.8494,
            capital: 1000.0,
            risk: 100.0,
            risk_percent: 10.0,
            max_leverage: 100.0,
        }
    }
}

#[derive(Debug)]
pub struct PositionSizingForm {
    defaults: PositionSizingDefaults,
    entry: NumberCell,
    take_profit: NumberCell,
    stop_loss: NumberCell,
    capital: NumberCell,
    discrete: ParamCell<BoolCodec>,
    risk: NumberCell,
    risk_is_percent: ParamCell<BoolCodec>,
    max_leverage: NumberCell,
    ladder: ParamCell<JsonCodec<TrailingLadder>>,
}

fn number(store: &dyn ParamStore, key: &'static str) -> NumberCell {
    ParamCell::mount(store, key, None, OptionalCodec(NumberCodec))
}

impl PositionSizingForm {
    pub fn new(store: &dyn ParamStore, defaults: PositionSizingDefaults) -> Self {
        Self {
            defaults,
            entry: number(store, "entry"),
            take_profit: number(store, "tp"),
            stop_loss: number(store, "sl"),
            capital: number(store, "capital"),
            discrete: ParamCell::mount(store, "discrete", false, BoolCodec),
            risk: number(store, "ra"),
            risk_is_percent: ParamCell::mount(store, "rp", false, BoolCodec),
            max_leverage: number(store, "ml"),
            ladder: ParamCell::mount(store, "ts", TrailingLadder::default(), JsonCodec::new()),
        }
    }

    pub fn risk_is_percent(&self) -> bool {
        *self.risk_is_percent.value()
    }

    fn capital(&self) -> f64 {
        self.capital.value().unwrap_or(self.defaults.capital)
    }

    fn risk_budget(&self) -> RiskBudget {
        let percent = self.risk_is_percent();
        let fallback = if percent {
            self.defaults.risk_percent
        } else {
            self.defaults.risk
        };
        RiskBudget::from_flag(self.risk.value().unwrap_or(fallback), percent)
    }

    pub fn inputs(&self) -> SizingInputs {
        let d = &self.defaults;
        SizingInputs {
            entry: self.entry.value().unwrap_or(d.entry),
            stop_loss: self.stop_loss.value().unwrap_or(d.stop_loss),
            take_profit: self.take_profit.value().unwrap_or(d.take_profit),
            capital: self.capital(),
            risk: self.risk_budget(),
            max_leverage: self.max_leverage.value().unwrap_or(d.max_leverage),
            discrete: *self.discrete.value(),
        }
    }

    pub fn ladder(&self) -> &TrailingLadder {
        self.ladder.value()
    }

    /// Reward ratio of the current inputs, or 0 when the setup is invalid.
    fn risk_reward_ratio(&self) -> f64 {
        self.inputs()
            .evaluate()
            .map(|r| r.risk_reward_ratio)
            .unwrap_or(0.0)
    }

    /// Switch the risk unit, converting the shown value so the risk in
    /// currency stays the same. Switching back to amounts drops `rp`.
    fn toggle_risk_unit(&mut self, store: &mut dyn ParamStore) -> bool {
        let converted = self.risk_budget().toggled(self.capital());
        let wrote_flag = self.risk_is_percent.set_or_clear(store, converted.is_percent());
        let wrote_value = self.risk.set(store, Some(converted.value()));
        wrote_flag || wrote_value
    }

    fn edit_ladder(&mut self, store: &mut dyn ParamStore, f: impl FnOnce(&mut TrailingLadder)) -> bool {
        let mut ladder = self.ladder.value().clone();
        f(&mut ladder);
        self.ladder.set(store, ladder)
    }
}

impl ToolForm for PositionSizingForm {
    fn tool(&self) -> Tool {
        Tool::PositionSizing
    }

    fn fields(&self) -> Vec<FieldView> {
        let d = &self.defaults;
        let percent = self.risk_is_percent();
        let risk_label = if percent { "Risk (%)" } else { "Risk ($)" };
        let risk_placeholder = if percent { d.risk_percent } else { d.risk };

        let mut fields = vec![
            FieldView::number(FieldId::Param("capital"), "Capital", *self.capital.value(), d.capital, price_constraints()),
            FieldView::number(
                FieldId::Param("ra"),
                risk_label,
                *self.risk.value(),
                risk_placeholder,
                risk_constraints(percent, self.capital()),
            ),
            FieldView::toggle(FieldId::Param("rp"), "Risk as percent", percent),
            FieldView::number(FieldId::Param("entry"), "Entry price", *self.entry.value(), d.entry, price_constraints()),
            FieldView::number(FieldId::Param("sl"), "Stop-loss", *self.stop_loss.value(), d.stop_loss, price_constraints()),
            FieldView::number(FieldId::Param("tp"), "Take profit", *self.take_profit.value(), d.take_profit, price_constraints()),
            FieldView::number(
                FieldId::Param("ml"),
                "Max leverage",
                *self.max_leverage.value(),
                d.max_leverage,
                NumericConstraints::NONE.min(1.0).step(0.1),
            ),
            FieldView::toggle(FieldId::Param("discrete"), "Discrete units", *self.discrete.value()),
        ];

        let ratio = self.risk_reward_ratio();
        for (i, rung) in self.ladder.value().rungs().iter().enumerate() {
            fields.push(FieldView::number(
                FieldId::RungTrigger(i),
                format!("Trailing #{} trigger (R)", i + 1),
                Some(rung.trigger_r),
                rung.trigger_r,
                TrailingLadder::trigger_constraints(),
            ));
            fields.push(FieldView::number(
                FieldId::RungLock(i),
                format!("Trailing #{} lock (R)", i + 1),
                Some(rung.lock_r),
                rung.lock_r,
                TrailingLadder::lock_constraints(ratio),
            ));
        }
        fields
    }

    fn apply(&mut self, store: &mut dyn ParamStore, field: FieldId, edit: Edit) -> bool {
        match (field, edit) {
            (FieldId::Param("entry"), Edit::Number(v)) => self.entry.set(store, v),
            (FieldId::Param("tp"), Edit::Number(v)) => self.take_profit.set(store, v),
            (FieldId::Param("sl"), Edit::Number(v)) => self.stop_loss.set(store, v),
            (FieldId::Param("capital"), Edit::Number(v)) => self.capital.set(store, v),
            (FieldId::Param("ra"), Edit::Number(v)) => self.risk.set(store, v),
            (FieldId::Param("ml"), Edit::Number(v)) => self.max_leverage.set(store, v),
            (FieldId::Param("discrete"), Edit::Toggle) => {
                let next = !*self.discrete.value();
                self.discrete.set(store, next)
            }
            (FieldId::Param("rp"), Edit::Toggle) => self.toggle_risk_unit(store),
            (FieldId::RungTrigger(i), Edit::Number(Some(v))) => self.edit_ladder(store, |l| l.set_trigger(i, v)),
            (FieldId::RungLock(i), Edit::Number(Some(v))) => self.edit_ladder(store, |l| l.set_lock(i, v)),
            (field, edit) => {
                tracing::debug!(?field, ?edit, "edit ignored by position sizing form");
                false
            }
        }
    }

    fn apply_list(&mut self, store: &mut dyn ParamStore, edit: ListEdit) -> bool {
        match edit {
            ListEdit::Append => {
                let ratio = self.risk_reward_ratio();
                self.edit_ladder(store, |l| {
                    l.append(ratio);
                })
            }
            ListEdit::Remove(i) => self.edit_ladder(store, |l| {
                l.remove(i);
            }),
        }
    }

    fn sync(&mut self, store: &dyn ParamStore) -> bool {
        // Every cell must re-read, so no short-circuiting.
        [
            self.entry.sync(store),
            self.take_profit.sync(store),
            self.stop_loss.sync(store),
            self.capital.sync(store),
            self.discrete.sync(store),
            self.risk.sync(store),
            self.risk_is_percent.sync(store),
            self.max_leverage.sync(store),
            self.ladder.sync(store),
        ]
        .contains(&true)
    }

    fn report(&self) -> Result<ToolReport, SetupError> {
        let inputs = self.inputs();
        let report = inputs.evaluate()?;
        let ladder = self.ladder.value();
        Ok(ToolReport::PositionSizing {
            trailing: ladder.evaluate(inputs.entry, inputs.stop_loss, report.position.position_size),
            orders: orders_summary(&inputs, &report, ladder),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{Rung, Side};
    use crate::params::LocationStore;

    #[test]
    fn empty_url_uses_defaults() {
        let store = LocationStore::default();
        let form = PositionSizingForm::new(&store, PositionSizingDefaults::default());
        let inputs = form.inputs();
        assert_eq!(inputs.entry, 2.8249);
        assert_eq!(inputs.risk, RiskBudget::Amount(100.0));
        assert_eq!(inputs.side(), Side::Short);
        assert!(form.report().is_ok());
        assert_eq!(form.ladder(), &TrailingLadder::default());
    }

    #[test]
    fn url_values_override_defaults() {
        let store = LocationStore::from_query("entry=100&sl=90&tp=120&capital=1000&ra=50&ml=100");
        let form = PositionSizingForm::new(&store, PositionSizingDefaults::default());
        let Ok(ToolReport::PositionSizing { report, trailing, orders }) = form.report() else {
            panic!("expected a sizing report");
        };
        assert_eq!(report.position.position_size, 5.0);
        assert_eq!(report.risk_reward_ratio, 2.0);
        assert_eq!(trailing.len(), 2);
        assert_eq!(orders.len(), 5);
    }

    #[test]
    fn toggling_risk_unit_converts_value() {
        let mut store = LocationStore::from_query("capital=1000&ra=50");
        let mut form = PositionSizingForm::new(&store, PositionSizingDefaults::default());

        assert!(form.apply(&mut store, FieldId::Param("rp"), Edit::Toggle));
        assert_eq!(store.get("rp").as_deref(), Some("true"));
        assert_eq!(store.get("ra").as_deref(), Some("5"));
        assert_eq!(form.inputs().risk, RiskBudget::Percent(5.0));

        assert!(form.apply(&mut store, FieldId::Param("rp"), Edit::Toggle));
        assert_eq!(store.get("rp"), None);
        assert_eq!(store.get("ra").as_deref(), Some("50"));
    }

    #[test]
    fn ladder_edits_go_through_the_url() {
        let mut store = LocationStore::from_query("entry=100&sl=90&tp=120");
        let mut form = PositionSizingForm::new(&store, PositionSizingDefaults::default());

        form.apply(&mut store, FieldId::RungTrigger(1), Edit::Number(Some(0.5)));
        assert_eq!(form.ladder().rungs()[1], Rung::new(0.5, 0.5));
        assert_eq!(store.get("ts").as_deref(), Some("[[2.0,0.0],[0.5,0.5]]"));

        form.apply_list(&mut store, ListEdit::Remove(0));
        form.apply_list(&mut store, ListEdit::Append);
        assert_eq!(form.ladder().rungs(), &[Rung::new(0.5, 0.5), Rung::new(1.5, 0.5)]);
    }

    #[test]
    fn clearing_a_field_restores_placeholder() {
        let mut store = LocationStore::from_query("entry=3");
        let mut form = PositionSizingForm::new(&store, PositionSizingDefaults::default());
        form.apply(&mut store, FieldId::Param("entry"), Edit::Number(None));
        assert_eq!(store.get("entry"), None);
        assert_eq!(form.inputs().entry, 2.8249);
    }

    #[test]
    fn sync_follows_back_navigation() {
        let mut store = LocationStore::from_query("entry=100");
        let mut form = PositionSizingForm::new(&store, PositionSizingDefaults::default());
        store.navigate(url::Url::parse("http://localhost/?entry=200").unwrap());
        assert!(form.sync(&store));
        assert_eq!(form.inputs().entry, 200.0);
        store.back();
        assert!(form.sync(&store));
        assert_eq!(form.inputs().entry, 100.0);
        assert!(!form.sync(&store));
    }

    #[test]
    fn unknown_edits_are_ignored() {
        let mut store = LocationStore::default();
        let mut form = PositionSizingForm::new(&store, PositionSizingDefaults::default());
        assert!(!form.apply(&mut store, FieldId::Param("lev"), Edit::Number(Some(3.0))));
        assert!(!form.apply(&mut store, FieldId::Dip(0), Edit::Number(Some(3.0))));
        assert_eq!(store.writes(), 0);
    }
}
