//! Trailing-stop ladder
//!
//! Each rung says: once price has moved `trigger_r` risk units in our favour,
//! move the stop so that `lock_r` risk units are kept. Rungs are stored in R
//! multiples so the ladder survives edits to entry and stop.
//!
//! # Invariant
//! Edits keep `lock_r <= trigger_r`: editing the trigger pulls the lock down,
//! editing the lock pushes the trigger up.

use serde::{Deserialize, Serialize};

use crate::input::NumericConstraints;

/// One `(trigger_r, lock_r)` pair. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Rung {
    pub trigger_r: f64,
    pub lock_r: f64,
}

impl Rung {
    pub fn new(trigger_r: f64, lock_r: f64) -> Self {
        Self { trigger_r, lock_r }
    }
}

impl From<(f64, f64)> for Rung {
    fn from((trigger_r, lock_r): (f64, f64)) -> Self {
        Self { trigger_r, lock_r }
    }
}

impl From<Rung> for (f64, f64) {
    fn from(rung: Rung) -> Self {
        (rung.trigger_r, rung.lock_r)
    }
}

/// What the stop guarantees once a rung has fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum LockOutcome {
    /// `lock_r > 0`: profit is locked in.
    MinProfit(f64),
    /// `lock_r <= 0`: the stop still sits at or behind entry.
    MaxLoss(f64),
}

/// A rung resolved against concrete prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RungReport {
    pub trigger_r: f64,
    pub lock_r: f64,
    pub trigger_price: f64,
    pub limit_price: f64,
    /// Distance from entry to the limit, percent of entry.
    pub change_percent: f64,
    pub outcome: LockOutcome,
}

/// Ordered list of rungs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrailingLadder(Vec<Rung>);

impl Default for TrailingLadder {
    /// Breakeven at 2R, lock 1R at 4R.
    fn default() -> Self {
        Self(vec![Rung::new(2.0, 0.0), Rung::new(4.0, 1.0)])
    }
}

impl From<Vec<Rung>> for TrailingLadder {
    fn from(rungs: Vec<Rung>) -> Self {
        Self(rungs)
    }
}

impl TrailingLadder {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn rungs(&self) -> &[Rung] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `floor(ratio * 10) / 10`: the highest lock the take profit allows.
    pub fn lock_ceiling(risk_reward_ratio: f64) -> f64 {
        (risk_reward_ratio * 10.0).floor() / 10.0
    }

    /// Input constraints for a trigger field.
    pub fn trigger_constraints() -> NumericConstraints {
        NumericConstraints::NONE.min(-1.0).step(0.1)
    }

    /// Input constraints for a lock field.
    pub fn lock_constraints(risk_reward_ratio: f64) -> NumericConstraints {
        NumericConstraints::NONE
            .min(-1.0)
            .max(Self::lock_ceiling(risk_reward_ratio))
            .step(0.1)
    }

    /// Change a trigger; the lock follows it down if needed.
    /// Out-of-range indices are ignored.
    pub fn set_trigger(&mut self, index: usize, trigger_r: f64) {
        if let Some(rung) = self.0.get_mut(index) {
            rung.trigger_r = trigger_r;
            rung.lock_r = rung.lock_r.min(trigger_r);
        }
    }

    /// Change a lock; the trigger follows it up if needed.
    /// Out-of-range indices are ignored.
    pub fn set_lock(&mut self, index: usize, lock_r: f64) {
        if let Some(rung) = self.0.get_mut(index) {
            rung.lock_r = lock_r;
            rung.trigger_r = rung.trigger_r.max(lock_r);
        }
    }

    /// Add a rung one R past the highest existing one, capped by the ceiling.
    pub fn append(&mut self, risk_reward_ratio: f64) -> Rung {
        let ceiling = Self::lock_ceiling(risk_reward_ratio);
        let top_trigger = self.0.iter().map(|r| r.trigger_r).fold(0.0, f64::max);
        let top_lock = self.0.iter().map(|r| r.lock_r).fold(0.0, f64::max);

        let trigger_r = ceiling.min(top_trigger + 1.0);
        let lock_r = (trigger_r - 1.0).min(top_lock + 1.0);
        let rung = Rung::new(trigger_r, lock_r);
        self.0.push(rung);
        rung
    }

    /// Remove one rung. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Rung> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    /// Resolve every rung into prices and guaranteed outcomes.
    pub fn evaluate(&self, entry: f64, stop_loss: f64, position_size: f64) -> Vec<RungReport> {
        let r = entry - stop_loss;
        let risk_unit = r.abs();
        self.0
            .iter()
            .map(|rung| {
                let trigger_price = entry + rung.trigger_r * r;
                let limit_price = entry + rung.lock_r * r;
                let change_percent = if entry != 0.0 {
                    100.0 * (limit_price / entry - 1.0).abs()
                } else {
                    0.0
                };
                let locked = position_size * risk_unit * rung.lock_r;
                let outcome = if rung.lock_r > 0.0 {
                    LockOutcome::MinProfit(locked)
                } else {
                    LockOutcome::MaxLoss(locked.abs())
                };
                RungReport {
                    trigger_r: rung.trigger_r,
                    lock_r: rung.lock_r,
                    trigger_price,
                    limit_price,
                    change_percent,
                    outcome,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rung_prices_long() {
        let ladder = TrailingLadder::from(vec![Rung::new(2.0, 1.0)]);
        let reports = ladder.evaluate(100.0, 90.0, 5.0);
        assert_eq!(reports[0].trigger_price, 120.0);
        assert_eq!(reports[0].limit_price, 110.0);
        assert!((reports[0].change_percent - 10.0).abs() < 1e-9);
        assert_eq!(reports[0].outcome, LockOutcome::MinProfit(50.0));
    }

    #[test]
    fn rung_prices_short() {
        let ladder = TrailingLadder::from(vec![Rung::new(2.0, -0.5)]);
        let reports = ladder.evaluate(100.0, 110.0, 4.0);
        assert_eq!(reports[0].trigger_price, 80.0);
        assert_eq!(reports[0].limit_price, 105.0);
        assert_eq!(reports[0].outcome, LockOutcome::MaxLoss(20.0));
    }

    #[test]
    fn breakeven_lock_is_zero_loss() {
        let reports = TrailingLadder::default().evaluate(100.0, 90.0, 5.0);
        assert_eq!(reports[0].outcome, LockOutcome::MaxLoss(0.0));
        assert_eq!(reports[0].change_percent, 0.0);
    }

    #[test]
    fn editing_trigger_pulls_lock_down() {
        let mut ladder = TrailingLadder::from(vec![Rung::new(3.0, 2.0)]);
        ladder.set_trigger(0, 1.5);
        assert_eq!(ladder.rungs()[0], Rung::new(1.5, 1.5));
        ladder.set_trigger(0, 4.0);
        assert_eq!(ladder.rungs()[0], Rung::new(4.0, 1.5));
    }

    #[test]
    fn editing_lock_pushes_trigger_up() {
        let mut ladder = TrailingLadder::from(vec![Rung::new(2.0, 0.0)]);
        ladder.set_lock(0, 2.5);
        assert_eq!(ladder.rungs()[0], Rung::new(2.5, 2.5));
        ladder.set_lock(0, -1.0);
        assert_eq!(ladder.rungs()[0], Rung::new(2.5, -1.0));
    }

    #[test]
    fn append_steps_one_r_and_respects_ceiling() {
        let mut ladder = TrailingLadder::default();
        assert_eq!(ladder.append(10.0), Rung::new(5.0, 2.0));

        let mut ladder = TrailingLadder::default();
        assert_eq!(ladder.append(3.27), Rung::new(3.2, 2.0));

        let mut ladder = TrailingLadder::empty();
        assert_eq!(ladder.append(2.0), Rung::new(1.0, 0.0));
    }

    #[test]
    fn remove_ignores_bad_index() {
        let mut ladder = TrailingLadder::default();
        assert_eq!(ladder.remove(5), None);
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder.remove(0), Some(Rung::new(2.0, 0.0)));
        assert_eq!(ladder.rungs(), &[Rung::new(4.0, 1.0)]);

        ladder.set_trigger(3, 9.0);
        assert_eq!(ladder.rungs(), &[Rung::new(4.0, 1.0)]);
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let json = serde_json::to_string(&TrailingLadder::default()).unwrap();
        assert_eq!(json, "[[2.0,0.0],[4.0,1.0]]");
        let back: TrailingLadder = serde_json::from_str("[[2,0],[4,1]]").unwrap();
        assert_eq!(back, TrailingLadder::default());
    }

    #[test]
    fn lock_input_is_bounded_by_ratio() {
        let c = TrailingLadder::lock_constraints(2.57);
        assert_eq!(c.max, Some(2.5));
        assert_eq!(c.min, Some(-1.0));
        assert_eq!(c.commit(3.0), 2.5);
    }
}
