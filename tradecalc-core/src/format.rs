//! Display formatting for engine outputs.
//!
//! Numbers are rounded by magnitude (more decimals for small prices, none
//! above 100), never show more than three decimals, drop trailing zeros and
//! group thousands with a space: `12 345.6`.
//!
//! Formatting is one-way. Nothing here feeds back into cells or engines.

/// Most decimals ever shown.
const MAX_DECIMALS: usize = 3;

/// Decimals shown for a value of this magnitude.
pub fn auto_decimals(value: f64) -> usize {
    let magnitude = value.abs();
    let decimals = if magnitude < 10.0 {
        4
    } else if magnitude < 20.0 {
        3
    } else if magnitude < 50.0 {
        2
    } else if magnitude < 100.0 {
        1
    } else {
        0
    };
    decimals.min(MAX_DECIMALS)
}

/// Format with magnitude-based rounding, or with `decimals` when given.
pub fn number(value: f64, decimals: Option<usize>) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let decimals = decimals.unwrap_or_else(|| auto_decimals(value)).min(MAX_DECIMALS);
    let fixed = format!("{:.*}", decimals, value);

    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (unsigned, ""),
    };

    let grouped = group_thousands(int_part);
    // "-0" after rounding a tiny negative reads as plain zero.
    let sign = if frac_part.is_empty() && grouped == "0" { "" } else { sign };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub fn percent(value: f64) -> String {
    format!("{}%", number(value, Some(2)))
}

pub fn money(value: f64) -> String {
    format!("${}", number(value, Some(2)))
}

/// Leverage or reward ratio, e.g. `2.5x`.
pub fn multiple(value: f64) -> String {
    format!("{}x", number(value, Some(2)))
}

/// R multiple with one decimal, e.g. `1.5R`.
pub fn r_multiple(value: f64) -> String {
    format!("{}R", number(value, Some(1)))
}
