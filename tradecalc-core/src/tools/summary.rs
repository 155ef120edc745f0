//! Presentation-neutral tables for a `ToolReport`.
//!
//! Every outer surface renders the same sections: the CLI prints them as text
//! or CSV, the TUI draws them as tables. Cells are already formatted.

use crate::calc::{
    DipBuyReport, FibReport, LockOutcome, OrderKind, OrderLine, PositionSize, RiskRewardReport, RungReport,
    SizingReport,
};
use crate::format::{money, multiple, number, percent, r_multiple};

use super::ToolReport;

/// One titled table. Fact sections have two columns: label and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn facts(title: &'static str, rows: Vec<(&str, String)>) -> Self {
        Self {
            title,
            columns: vec!["item", "value"],
            rows: rows.into_iter().map(|(k, v)| vec![k.to_string(), v]).collect(),
        }
    }

    fn table(title: &'static str, columns: Vec<&'static str>, rows: Vec<Vec<String>>) -> Self {
        Self { title, columns, rows }
    }
}

impl ToolReport {
    /// Headline figure shown in status lines.
    pub fn headline(&self) -> String {
        match self {
            ToolReport::PositionSizing { report, .. } => format!(
                "size {} @ {} | reward {} ({})",
                number(report.position.position_size, None),
                multiple(report.position.order_leverage),
                multiple(report.risk_reward_ratio),
                report.grade().label()
            ),
            ToolReport::FibSizing(r) => format!(
                "entry {} stop {} size {}",
                number(r.entry, None),
                number(r.stop_loss, None),
                number(r.position.position_size, None)
            ),
            ToolReport::DipBuy(r) => format!(
                "main size {} | {} dip orders",
                number(r.main.position_size, None),
                r.dips.len()
            ),
            ToolReport::RiskReward(r) => format!(
                "{} shares, stop {}",
                r.shares,
                number(r.stop_loss_price, Some(3))
            ),
        }
    }

    pub fn sections(&self) -> Vec<Section> {
        match self {
            ToolReport::PositionSizing {
                report,
                trailing,
                orders,
            } => vec![
                sizing_section(report),
                trailing_section(trailing),
                orders_section(orders),
            ],
            ToolReport::FibSizing(r) => fib_sections(r),
            ToolReport::DipBuy(r) => dip_sections(r),
            ToolReport::RiskReward(r) => vec![risk_reward_section(r)],
        }
    }
}

fn position_rows(p: &PositionSize) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Side", p.side.to_string()),
        ("Risk unit", number(p.risk_unit, None)),
        ("Risk", format!("{} ({})", money(p.risk_amount), percent(p.risk_percent))),
        ("Position size", number(p.position_size, None)),
        ("Position value", money(p.position_value)),
        ("Actual risk", money(p.actual_risk)),
        ("Required leverage", multiple(p.required_leverage)),
        ("Order leverage", multiple(p.order_leverage)),
    ];
    if p.leverage_limited {
        rows.push((
            "Leverage cap",
            format!(
                "wanted {}, capped at {}",
                number(p.computed_position_size, None),
                number(p.max_allowed_position_size, None)
            ),
        ));
    }
    rows
}

fn sizing_section(r: &SizingReport) -> Section {
    let mut rows = position_rows(&r.position);
    rows.extend([
        ("Potential win", money(r.potential_win)),
        (
            "Reward / risk",
            format!("{} ({})", multiple(r.risk_reward_ratio), r.grade().label()),
        ),
        ("Take profit move", percent(r.take_profit_change_percent)),
        (
            "Without leverage",
            format!(
                "{} ({})",
                number(r.unleveraged_position_size, None),
                money(r.unleveraged_position_value)
            ),
        ),
    ]);
    Section::facts("Position", rows)
}

fn trailing_section(rungs: &[RungReport]) -> Section {
    let rows = rungs
        .iter()
        .enumerate()
        .map(|(i, rung)| {
            let outcome = match rung.outcome {
                LockOutcome::MinProfit(v) => format!("min profit {}", money(v)),
                LockOutcome::MaxLoss(v) => format!("max loss {}", money(v)),
            };
            vec![
                (i + 1).to_string(),
                r_multiple(rung.trigger_r),
                number(rung.trigger_price, None),
                r_multiple(rung.lock_r),
                number(rung.limit_price, None),
                percent(rung.change_percent),
                outcome,
            ]
        })
        .collect();
    Section::table(
        "Trailing stops",
        vec!["#", "trigger", "trigger price", "lock", "limit price", "change", "outcome"],
        rows,
    )
}

fn orders_section(orders: &[OrderLine]) -> Section {
    let opt = |v: Option<f64>, f: fn(f64) -> String| v.map(f).unwrap_or_default();
    let rows = orders
        .iter()
        .map(|o| {
            let kind = match o.kind {
                OrderKind::Entry { side } => format!("entry ({side})"),
                OrderKind::StopLoss => "stop loss".to_string(),
                OrderKind::TakeProfit => "take profit".to_string(),
                OrderKind::TrailingStop { rung } => format!("trailing #{}", rung + 1),
            };
            vec![
                kind,
                number(o.price, None),
                opt(o.limit, |v| number(v, None)),
                opt(o.size, |v| number(v, None)),
                opt(o.leverage, multiple),
            ]
        })
        .collect();
    Section::table("Orders", vec!["order", "price", "limit", "size", "leverage"], rows)
}

fn fib_sections(r: &FibReport) -> Vec<Section> {
    let mut setup = vec![
        ("Swing", format!("{} - {}", number(r.range.low, None), number(r.range.high, None))),
        ("Entry (0.618)", number(r.entry, None)),
        (
            "Stop loss",
            format!("{} ({})", number(r.stop_loss, None), number(r.stop_ratio, Some(3))),
        ),
    ];
    setup.extend(position_rows(&r.position));

    let levels = r
        .levels
        .iter()
        .filter(|l| !l.hidden)
        .map(|l| {
            vec![
                number(l.ratio, Some(3)),
                number(l.price, None),
                money(l.profit),
                multiple(l.risk_reward),
            ]
        })
        .collect();

    vec![
        Section::facts("Setup", setup),
        Section::table("Targets", vec!["level", "price", "profit", "reward / risk"], levels),
    ]
}

fn dip_sections(r: &DipBuyReport) -> Vec<Section> {
    let mut main = position_rows(&r.main);
    main.extend([
        ("Profit at take profit", money(r.reference_profit)),
        ("Loss at stop", money(r.main_expected_loss)),
    ]);

    let dips = r
        .dips
        .iter()
        .enumerate()
        .map(|(i, d)| {
            vec![
                (i + 1).to_string(),
                number(d.price, None),
                number(d.gap, None),
                number(d.quantity, None),
                money(d.expected_loss),
                money(d.profit_at_take_profit),
            ]
        })
        .collect();

    let scenarios = r
        .scenarios
        .iter()
        .map(|s| {
            vec![
                s.fills.to_string(),
                money(s.profit_at_take_profit),
                money(s.loss_at_stop),
            ]
        })
        .collect();

    vec![
        Section::facts("Main order", main),
        Section::table(
            "Dip orders",
            vec!["#", "price", "gap", "quantity", "loss at stop", "profit at tp"],
            dips,
        ),
        Section::table(
            "Scenarios",
            vec!["dips filled", "profit at tp", "loss at stop"],
            scenarios,
        ),
    ]
}

fn risk_reward_section(r: &RiskRewardReport) -> Section {
    Section::facts(
        "Summary",
        vec![
            ("Stop loss", number(r.stop_loss_price, Some(3))),
            ("Shares", r.shares.to_string()),
            ("Total price", money(r.total_price)),
            ("Total fee", money(r.total_fee)),
            ("Max profit", format!("{} ({})", money(r.max_profit), percent(r.max_gain_percent))),
            ("Max loss", format!("{} ({})", money(r.max_loss), percent(r.max_loss_percent))),
        ],
    )
}
