//! TradeCalc TUI: the calculators as terminal forms.
//!
//! Every input lives in the URL. Edits replace the current URL in place,
//! switching tools opens a new page, and back/forward re-sync the form, so
//! the link printed on exit reproduces the session.

pub mod app;
pub mod input;
pub mod persistence;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::Theme;
