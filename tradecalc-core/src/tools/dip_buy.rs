//! Dip-buy form: `entry`, `tp`, `sl`, `capital`, `risk`, `lev`, `dips`.
//!
//! `dips` is a comma list with holes: `dips=,80` keeps the first default dip
//! and overrides the second.

use serde::{Deserialize, Serialize};

use super::{price_constraints, Edit, FieldId, FieldView, ListEdit, Tool, ToolForm, ToolReport, PRICE_MAX};
use crate::calc::DipBuyInputs;
use crate::error::SetupError;
use crate::input::NumericConstraints;
use crate::params::{ListCodec, NumberCodec, OptionalCodec, ParamCell, ParamStore};

type NumberCell = ParamCell<OptionalCodec<NumberCodec>>;
type DipsCell = ParamCell<ListCodec<OptionalCodec<NumberCodec>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DipBuyDefaults {
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub capital: f64,
    pub risk_percent: f64,
    pub leverage: f64,
    pub dips: Vec<f64>,
}

impl Default for DipBuyDefaults {
    fn default() -> Self {
        Self {
            entry: 100.0,
            take_profit: 120.0,
            stop_loss: 90.0,
            capital: 1000.0,
            risk_percent: 5.0,
            leverage: 10.0,
            dips: vec![95.0, 85.0],
        }
    }
}

#[derive(Debug)]
pub struct DipBuyForm {
    defaults: DipBuyDefaults,
    entry: NumberCell,
    take_profit: NumberCell,
    stop_loss: NumberCell,
    capital: NumberCell,
    risk_percent: NumberCell,
    leverage: NumberCell,
    dips: DipsCell,
}

impl DipBuyForm {
    pub fn new(store: &dyn ParamStore, defaults: DipBuyDefaults) -> Self {
        let number = |key| ParamCell::mount(store, key, None, OptionalCodec(NumberCodec));
        let dips = ParamCell::mount(
            store,
            "dips",
            vec![None; defaults.dips.len()],
            ListCodec(OptionalCodec(NumberCodec)),
        );
        Self {
            entry: number("entry"),
            take_profit: number("tp"),
            stop_loss: number("sl"),
            capital: number("capital"),
            risk_percent: number("risk"),
            leverage: number("lev"),
            dips,
            defaults,
        }
    }

    /// Dip prices after filling holes from the defaults. Holes with no
    /// default are skipped; an explicit empty list means no dips.
    pub fn dip_prices(&self) -> Vec<f64> {
        self.resolved_slots().into_iter().flatten().collect()
    }

    fn resolved_slots(&self) -> Vec<Option<f64>> {
        self.dips
            .value()
            .iter()
            .enumerate()
            .map(|(i, price)| price.or_else(|| self.defaults.dips.get(i).copied()))
            .collect()
    }

    pub fn inputs(&self) -> DipBuyInputs {
        let d = &self.defaults;
        DipBuyInputs {
            entry: self.entry.value().unwrap_or(d.entry),
            take_profit: self.take_profit.value().unwrap_or(d.take_profit),
            stop_loss: self.stop_loss.value().unwrap_or(d.stop_loss),
            capital: self.capital.value().unwrap_or(d.capital),
            risk_percent: self.risk_percent.value().unwrap_or(d.risk_percent),
            leverage: self.leverage.value().unwrap_or(d.leverage),
            dips: self.dip_prices(),
        }
    }

    fn set_dip(&mut self, store: &mut dyn ParamStore, index: usize, value: Option<f64>) -> bool {
        let mut next = self.dips.value().clone();
        if next.len() <= index {
            next.resize(index + 1, None);
        }
        next[index] = value;
        // Trailing holes past the defaults carry nothing.
        while next.len() > self.defaults.dips.len() && next.last() == Some(&None) {
            next.pop();
        }
        self.dips.set_or_clear(store, next)
    }

    /// Next dip one gap further than the last, or halfway to the stop when
    /// there is none yet.
    fn next_dip(&self) -> f64 {
        let inputs = self.inputs();
        let half_way = (inputs.stop_loss - inputs.entry) / 2.0;
        match inputs.dips.as_slice() {
            [] => inputs.entry + half_way,
            [only] => {
                let step = only - inputs.entry;
                only + if step != 0.0 { step } else { half_way }
            }
            [.., prev, last] => {
                let step = last - prev;
                last + if step != 0.0 { step } else { half_way }
            }
        }
    }
}

impl ToolForm for DipBuyForm {
    fn tool(&self) -> Tool {
        Tool::DipBuy
    }

    fn fields(&self) -> Vec<FieldView> {
        let d = &self.defaults;
        let mut fields = vec![
            FieldView::number(FieldId::Param("entry"), "Entry price", *self.entry.value(), d.entry, price_constraints()),
            FieldView::number(FieldId::Param("tp"), "Take profit", *self.take_profit.value(), d.take_profit, price_constraints()),
            FieldView::number(FieldId::Param("sl"), "Stop loss", *self.stop_loss.value(), d.stop_loss, price_constraints()),
            FieldView::number(FieldId::Param("capital"), "Capital", *self.capital.value(), d.capital, price_constraints()),
            FieldView::number(
                FieldId::Param("risk"),
                "Risk (%)",
                *self.risk_percent.value(),
                d.risk_percent,
                NumericConstraints::NONE.min(0.0).max(100.0),
            ),
            FieldView::number(
                FieldId::Param("lev"),
                "Leverage",
                *self.leverage.value(),
                d.leverage,
                NumericConstraints::NONE.min(0.0).max(PRICE_MAX),
            ),
        ];

        for (i, slot) in self.dips.value().iter().enumerate() {
            let Some(placeholder) = d.dips.get(i).copied().or(*slot) else {
                continue;
            };
            fields.push(FieldView::number(
                FieldId::Dip(i),
                format!("Dip #{}", i + 1),
                *slot,
                placeholder,
                price_constraints(),
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
            (FieldId::Param("risk"), Edit::Number(v)) => self.risk_percent.set(store, v),
            (FieldId::Param("lev"), Edit::Number(v)) => self.leverage.set(store, v),
            (FieldId::Dip(i), Edit::Number(v)) => self.set_dip(store, i, v),
            (field, edit) => {
                tracing::debug!(?field, ?edit, "edit ignored by dip-buy form");
                false
            }
        }
    }

    fn apply_list(&mut self, store: &mut dyn ParamStore, edit: ListEdit) -> bool {
        match edit {
            ListEdit::Append => {
                let index = self.dip_prices().len();
                let price = self.next_dip();
                let mut next: Vec<Option<f64>> = self.dip_prices().into_iter().map(Some).collect();
                next.push(Some(price));
                tracing::debug!(index, price, "dip level appended");
                self.dips.set(store, next)
            }
            ListEdit::Remove(index) => {
                // Indices address stored slots, like `FieldId::Dip`.
                let mut slots = self.resolved_slots();
                if index >= slots.len() {
                    return false;
                }
                slots.remove(index);
                self.dips.set(store, slots.into_iter().filter(Option::is_some).collect())
            }
        }
    }

    fn sync(&mut self, store: &dyn ParamStore) -> bool {
        [
            self.entry.sync(store),
            self.take_profit.sync(store),
            self.stop_loss.sync(store),
            self.capital.sync(store),
            self.risk_percent.sync(store),
            self.leverage.sync(store),
            self.dips.sync(store),
        ]
        .contains(&true)
    }

    fn report(&self) -> Result<ToolReport, SetupError> {
        self.inputs().evaluate().map(ToolReport::DipBuy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LocationStore;

    fn form(query: &str) -> (LocationStore, DipBuyForm) {
        let store = LocationStore::from_query(query);
        let form = DipBuyForm::new(&store, DipBuyDefaults::default());
        (store, form)
    }

    #[test]
    fn holes_fall_back_to_defaults() {
        let (_, f) = form("dips=,80");
        assert_eq!(f.dip_prices(), vec![95.0, 80.0]);

        let (_, f) = form("dips=96,88,70");
        assert_eq!(f.dip_prices(), vec![96.0, 88.0, 70.0]);

        let (_, f) = form("");
        assert_eq!(f.dip_prices(), vec![95.0, 85.0]);
    }

    #[test]
    fn editing_a_dip_writes_a_list_with_holes() {
        let (mut store, mut f) = form("");
        assert!(f.apply(&mut store, FieldId::Dip(1), Edit::Number(Some(87.5))));
        assert_eq!(store.get("dips").as_deref(), Some(",87.5"));

        assert!(f.apply(&mut store, FieldId::Dip(1), Edit::Number(None)));
        assert_eq!(store.get("dips"), None);
    }

    #[test]
    fn append_continues_the_spacing() {
        let (mut store, mut f) = form("entry=100&sl=80&dips=95,90");
        assert!(f.apply_list(&mut store, ListEdit::Append));
        assert_eq!(f.dip_prices(), vec![95.0, 90.0, 85.0]);
        assert_eq!(store.get("dips").as_deref(), Some("95,90,85"));
    }

    #[test]
    fn append_to_empty_goes_half_way_to_stop() {
        let (mut store, mut f) = form("dips=");
        assert!(f.dip_prices().is_empty());
        f.apply_list(&mut store, ListEdit::Append);
        assert_eq!(f.dip_prices(), vec![95.0]);
    }

    #[test]
    fn remove_drops_one_level() {
        let (mut store, mut f) = form("");
        assert!(f.apply_list(&mut store, ListEdit::Remove(0)));
        assert_eq!(f.dip_prices(), vec![85.0]);
        assert!(!f.apply_list(&mut store, ListEdit::Remove(7)));
    }

    #[test]
    fn report_uses_effective_dips() {
        let (_, f) = form("dips=,92");
        let Ok(ToolReport::DipBuy(report)) = f.report() else {
            panic!("expected dip-buy report");
        };
        assert_eq!(report.dips.len(), 2);
        assert_eq!(report.dips[1].price, 92.0);
        assert!(report.dips[1].quantity > 0.0);
    }
}
