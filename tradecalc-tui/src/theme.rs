//! Neon-on-charcoal theme tokens for the TradeCalc TUI.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (focus, selected field, panel titles)
//! - **Positive**: Neon green (good reward ratios)
//! - **Negative**: Hot pink (bad reward ratios, setup errors)
//! - **Warning**: Neon orange (changed results, marginal ratios, status warnings)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (placeholders, hints)

use ratatui::style::{Color, Modifier, Style};
use tradecalc_core::calc::RewardGrade;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon()
    }
}

impl Theme {
    pub fn neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Reward/risk grade, from pink (bad) through orange to green (great).
    pub fn grade_color(&self, grade: RewardGrade) -> Color {
        match grade {
            RewardGrade::Bad | RewardGrade::Poor => self.negative,
            RewardGrade::Marginal => self.warning,
            RewardGrade::Fair => self.neutral,
            RewardGrade::Good => self.accent,
            RewardGrade::Great | RewardGrade::Excellent => self.positive,
        }
    }
}

fn theme() -> Theme {
    Theme::default()
}

pub fn accent() -> Style {
    Style::default().fg(theme().accent)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(theme().muted)
}

pub fn text() -> Style {
    Style::default().fg(theme().text_primary)
}

pub fn secondary() -> Style {
    Style::default().fg(theme().text_secondary)
}

pub fn neutral() -> Style {
    Style::default().fg(theme().neutral)
}

pub fn warning() -> Style {
    Style::default().fg(theme().warning)
}

pub fn negative() -> Style {
    Style::default().fg(theme().negative)
}

/// Results flash while they are freshly changed.
pub fn highlight() -> Style {
    Style::default()
        .fg(theme().background)
        .bg(theme().warning)
        .add_modifier(Modifier::BOLD)
}

pub fn panel_border(focused: bool) -> Style {
    if focused {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(focused: bool) -> Style {
    if focused {
        accent_bold()
    } else {
        secondary()
    }
}
