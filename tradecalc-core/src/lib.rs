//! TradeCalc Core: trading calculators with URL-backed form state.
//!
//! This crate contains everything below the presentation layer:
//! - Numeric input commit model (keystrokes -> committed numbers)
//! - URL-parameter state cells over an injected `ParamStore`
//! - Pure calculation engines: position sizing, trailing-stop ladder,
//!   Fibonacci sizing, dip-buy averaging, risk/reward summary
//! - Per-tool forms tying cells to engines, and display formatting
//! - `tradecalc.toml` configuration

pub mod calc;
pub mod config;
pub mod error;
pub mod format;
pub mod input;
pub mod params;
pub mod tools;

pub use config::AppConfig;
pub use error::{ConfigError, FieldError, SetupError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine inputs and reports are Send + Sync, so an
    /// outer surface can evaluate on a worker thread without retrofitting.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<calc::SizingInputs>();
        require_sync::<calc::SizingReport>();
        require_send::<calc::FibReport>();
        require_sync::<calc::FibReport>();
        require_send::<calc::DipBuyReport>();
        require_sync::<calc::DipBuyReport>();
        require_send::<calc::RiskRewardReport>();
        require_sync::<calc::TrailingLadder>();
        require_send::<tools::ToolReport>();
        require_sync::<tools::ToolReport>();
        require_send::<SetupError>();
        require_sync::<ConfigError>();
        require_send::<AppConfig>();
    }
}
