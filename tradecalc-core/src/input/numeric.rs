//! Numeric input commit model.
//!
//! A numeric field accepts partial text while the user types (`""`, `"-"`,
//! `"3."`) and only hands a number to its owner when the text is a complete
//! number whose committed form reads exactly like what was typed. Leaving
//! the field (blur) forces the issue: the text is either committed and
//! rewritten to its canonical form, or cleared.
//!
//! Commit rules:
//! ```text
//! v = clamp(n, min, max)
//! v = min + round((v - min) / step) * step     (step present and nonzero)
//! v = round(v, precision(step))                 (drop float residue)
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text the field accepts while typing: optional sign, digits, one dot.
static ACCEPTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]*\.?[0-9]*$").expect("accept pattern"));

/// Text that forms a complete number.
static COMPLETE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("complete pattern"));

/// Slack for float residue when locating the last grid point inside a bound.
const GRID_EPSILON: f64 = 1e-9;

/// `-0` followed by another digit before any decimal point (`-01`).
static NEGATIVE_LEADING_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-0[0-9]").expect("leading zero pattern"));

/// Optional bounds and step for a numeric field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl NumericConstraints {
    pub const NONE: NumericConstraints = NumericConstraints {
        min: None,
        max: None,
        step: None,
    };

    pub fn new(min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        Self { min, max, step }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Clamp, snap to the step grid anchored at `min` (or 0) and trim the
    /// float residue to the precision the step implies.
    ///
    /// A snap that lands past a bound moves to the nearest grid point inside
    /// it, so the result always stays within bounds.
    pub fn commit(&self, n: f64) -> f64 {
        let mut value = n;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }

        let step = match self.step {
            Some(step) if step != 0.0 && step.is_finite() => step.abs(),
            _ => return value,
        };

        let base = self.min.unwrap_or(0.0);
        // Anchoring at a min with more decimals than the step must not round
        // the grid away from that min.
        let precision = step_precision(step).max(self.min.map_or(0, step_precision));

        let at = |k: f64| round_to(base + k * step, precision);
        let mut snapped = at(((value - base) / step).round());
        if let Some(max) = self.max {
            if snapped > max {
                let mut k = ((max - base) / step + GRID_EPSILON).floor();
                if at(k) > max {
                    k -= 1.0;
                }
                snapped = at(k);
            }
        }
        if let Some(min) = self.min {
            if snapped < min {
                let mut k = ((min - base) / step - GRID_EPSILON).ceil();
                if at(k) < min {
                    k += 1.0;
                }
                snapped = at(k);
            }
        }
        snapped
    }
}

/// Outcome of a keystroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keystroke {
    /// The text did not pass the acceptance filter; the field is unchanged.
    Rejected,
    /// The text was accepted. `Some` carries a committed value, `None` means
    /// there is no valid committed value while typing continues.
    Reported(Option<f64>),
}

impl Keystroke {
    pub fn value(self) -> Option<f64> {
        match self {
            Keystroke::Reported(value) => value,
            Keystroke::Rejected => None,
        }
    }
}

/// A text-editable numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericField {
    raw: String,
    committed: Option<f64>,
    constraints: NumericConstraints,
}

impl NumericField {
    /// Mount the field with the owner's current value.
    pub fn new(initial: Option<f64>, constraints: NumericConstraints) -> Self {
        Self {
            raw: initial.map(canonical).unwrap_or_default(),
            committed: initial,
            constraints,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn committed(&self) -> Option<f64> {
        self.committed
    }

    pub fn constraints(&self) -> NumericConstraints {
        self.constraints
    }

    /// Constraints may depend on other inputs (e.g. a lock ceiling derived
    /// from the reward ratio); they apply from the next commit on.
    pub fn set_constraints(&mut self, constraints: NumericConstraints) {
        self.constraints = constraints;
    }

    /// Replace the whole text, as an input element's change event does.
    pub fn on_raw_change(&mut self, text: &str) -> Keystroke {
        if !ACCEPTED.is_match(text) {
            return Keystroke::Rejected;
        }
        self.raw = text.to_string();

        let reported = if is_complete(text) {
            parse(text).and_then(|n| {
                let value = self.constraints.commit(n);
                // Only report when the committed value reads exactly as typed,
                // otherwise the owner would rewrite the text mid-edit.
                (canonical(value) == text).then_some(value)
            })
        } else {
            None
        };
        self.committed = reported;
        Keystroke::Reported(reported)
    }

    pub fn push_char(&mut self, c: char) -> Keystroke {
        let mut text = self.raw.clone();
        text.push(c);
        self.on_raw_change(&text)
    }

    pub fn backspace(&mut self) -> Keystroke {
        let mut text = self.raw.clone();
        text.pop();
        self.on_raw_change(&text)
    }

    /// Focus left the field: commit whatever complete number is present, or
    /// clear the text.
    pub fn on_blur(&mut self) -> Option<f64> {
        let committed = if is_complete(&self.raw) {
            parse(&self.raw).map(|n| self.constraints.commit(n))
        } else {
            None
        };
        self.raw = committed.map(canonical).unwrap_or_default();
        self.committed = committed;
        committed
    }

    /// The owner changed the value from outside (navigation, unit switch).
    ///
    /// An in-progress edit that already represents the same value is kept.
    pub fn sync_external(&mut self, value: Option<f64>) {
        if self.committed == value && value.is_some() {
            return;
        }
        if value.is_none() && self.committed.is_none() && !self.raw.is_empty() {
            // Still typing an incomplete number; nothing committed either way.
            return;
        }
        self.raw = value.map(canonical).unwrap_or_default();
        self.committed = value;
    }
}

/// Whether `text` is a complete number that may be committed.
pub fn is_complete(text: &str) -> bool {
    COMPLETE.is_match(text) && text != "-0" && !NEGATIVE_LEADING_ZERO.is_match(text)
}

fn parse(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Shortest decimal text that reads back to `value`; negative zero prints as `0`.
pub fn canonical(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Decimal places implied by a step value.
pub fn step_precision(step: f64) -> u32 {
    decimal_places(&format!("{step}"))
}

/// Count the decimal places a number's text spells out, including the
/// exponent of `e-` notation (`"1e-7"` -> 7, `"2.5e-3"` -> 4).
pub fn decimal_places(text: &str) -> u32 {
    let text = text.trim();
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(idx) => (&text[..idx], text[idx + 1..].parse::<i32>().unwrap_or(0)),
        None => (text, 0),
    };
    let fraction = mantissa
        .split_once('.')
        .map_or(0, |(_, frac)| frac.len() as i32);
    (fraction - exponent).max(0) as u32
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Normalize -0.0 so canonical text never shows a sign on zero.
    rounded + 0.0
}
