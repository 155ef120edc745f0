//! Text-editable inputs.
//!
//! - `numeric`: keystroke-by-keystroke numeric field with min/max/step commit rules

pub mod numeric;

pub use numeric::{canonical, decimal_places, step_precision, Keystroke, NumericConstraints, NumericField};
