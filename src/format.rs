//! Currency, date and percentage formatting, using the pt-BR conventions the app displays:
//! `R$ 1.234,56` for money and `dd/mm/yyyy` for dates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const CURRENCY_SYMBOL: &str = "R$";

/// Formats `value` as Brazilian reais, e.g. `R$ 1.234,56` or `-R$ 5,00`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let en = format_num::format_num!(",.2f", rounded.abs().to_f64().unwrap_or_default());
    format!("{sign}{CURRENCY_SYMBOL} {}", swap_separators(&en))
}

/// Formats the calendar date of `date` as `dd/mm/yyyy`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    format_naive_date(&date.date_naive())
}

pub fn format_naive_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Formats a share in `[0, 1]` as a percentage with one decimal, e.g. `0.1234` -> `12,3%`.
pub fn format_percent(share: Decimal) -> String {
    let pct = (share * Decimal::ONE_HUNDRED).round_dp(1);
    format!("{}%", swap_separators(&format!("{pct:.1}")))
}

/// Turns `1,234.56` into `1.234,56`.
fn swap_separators(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}
