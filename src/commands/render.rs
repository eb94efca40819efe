//! Terminal tables, drawn with comfy-table.

use crate::controller::{DashboardView, ListView};
use crate::format::{format_currency, format_date, format_percent};
use crate::model::{Amount, Category, TransactionType};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write;

const BAR_WIDTH: usize = 24;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(headers.iter().map(|h| Cell::new(*h)));
    table
}

/// A right-aligned cell, for money and percentages.
fn right(content: impl ToString) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

fn type_label(t: TransactionType) -> &'static str {
    match t {
        TransactionType::Income => "Receita",
        TransactionType::Expense => "Despesa",
    }
}

/// A row of `█` proportional to `value / max`.
fn bar(value: Amount, max: Decimal) -> String {
    if max <= Decimal::ZERO || !value.is_positive() {
        return String::new();
    }
    let cells = (value.value() / max * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or_default()
        .clamp(1, BAR_WIDTH);
    "█".repeat(cells)
}

pub(crate) fn transactions(view: &ListView) -> String {
    let mut out = String::new();
    if let Some(period) = view.period {
        let _ = writeln!(out, "Transações de {} {}", period.month_name(), period.year());
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "{error} (use 'retry' to try again)");
    }
    if !view.search.is_empty() {
        let _ = writeln!(
            out,
            "Filtro: \"{}\" ({} de {})",
            view.search,
            view.visible.len(),
            view.total
        );
    }
    if view.visible.is_empty() {
        let _ = writeln!(out, "Nenhuma transação encontrada.");
        return out;
    }
    let mut table = new_table(&["ID", "Data", "Descrição", "Categoria", "Tipo", "Valor"]);
    for t in &view.visible {
        let mut id = t.id().to_string();
        if view.pending_delete.as_deref() == Some(t.id()) {
            id.push_str(" (excluindo)");
        }
        table.add_row(vec![
            Cell::new(id),
            Cell::new(format_date(t.date())),
            Cell::new(t.description()),
            Cell::new(t.category().map(|c| c.name()).unwrap_or_default()),
            Cell::new(type_label(t.transaction_type())),
            right(t.amount()),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

pub(crate) fn categories(categories: &[&Category]) -> String {
    let mut table = new_table(&["ID", "Nome", "Tipo", "Cor"]);
    for c in categories {
        table.add_row(vec![
            c.id(),
            c.name(),
            type_label(c.category_type()),
            c.color(),
        ]);
    }
    table.to_string()
}

pub(crate) fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let summary = &view.summary;
    if let Some(period) = view.period {
        let _ = writeln!(out, "Resumo de {} {}", period.month_name(), period.year());
    }
    if let Some(error) = &view.summary_error {
        let _ = writeln!(out, "{error}");
    }
    let mut totals = new_table(&["", "Valor"]);
    totals.add_row(vec![Cell::new("Receitas"), right(summary.total_incomes())]);
    totals.add_row(vec![Cell::new("Despesas"), right(summary.total_expenses())]);
    totals.add_row(vec![Cell::new("Saldo"), right(summary.balance())]);
    let _ = writeln!(out, "{totals}");

    let shares = summary.category_shares();
    if !shares.is_empty() {
        let _ = writeln!(out, "\nDespesas por categoria");
        let mut table = new_table(&["Categoria", "Valor", "%"]);
        for (category, share) in shares {
            table.add_row(vec![
                Cell::new(category.category_name()),
                right(format_currency(category.amount().value())),
                right(format_percent(share)),
            ]);
        }
        let _ = writeln!(out, "{table}");
    }

    let _ = writeln!(out, "\nHistórico");
    if let Some(error) = &view.history_error {
        let _ = writeln!(out, "{error}");
    }
    let max = view
        .history
        .iter()
        .flat_map(|m| [m.income().value(), m.expense().value()])
        .max()
        .unwrap_or_default();
    let mut table = new_table(&["Mês", "Receitas", "Despesas", ""]);
    for item in &view.history {
        // Incomes on the first line of the bar cell, expenses on the second.
        let bars = format!(
            "+{}\n-{}",
            bar(item.income(), max),
            bar(item.expense(), max)
        );
        table.add_row(vec![
            Cell::new(item.period_label()),
            right(item.income()),
            right(item.expense()),
            Cell::new(bars),
        ]);
    }
    let _ = writeln!(out, "{table}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MonthlyItem, Period, Transaction, TransactionSummary};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_table_lines_have_equal_width() {
        let mut table = new_table(&["A", "Valor"]);
        table.add_row(vec![Cell::new("Almoço"), right("R$ 5,00")]);
        table.add_row(vec![Cell::new("Supermercado"), right("R$ 412,37")]);
        let rendered = table.to_string();
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{rendered}");
        // Right alignment pads on the left.
        assert!(rendered.contains("   R$ 5,00 "));
        assert!(rendered.contains("Supermercado"));
    }

    #[test]
    fn test_bar() {
        let max = Decimal::from(100);
        assert_eq!(bar(amt("100"), max).chars().count(), BAR_WIDTH);
        assert_eq!(bar(amt("50"), max).chars().count(), BAR_WIDTH / 2);
        // Tiny values still show up.
        assert_eq!(bar(amt("0.01"), max).chars().count(), 1);
        assert_eq!(bar(Amount::ZERO, max), "");
        assert_eq!(bar(amt("10"), Decimal::ZERO), "");
    }

    #[test]
    fn test_transactions_table() {
        let category = Category::new("c3", "Alimentação", "#FF5733", TransactionType::Expense);
        let date = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
        let view = ListView {
            period: Some(Period::new(1, 2025).unwrap()),
            loading: false,
            error: None,
            search: "alm".to_string(),
            visible: vec![Transaction::new("t03", "u1", "Almoço", amt("35.90"), date, category)],
            total: 7,
            pending_delete: Some("t03".to_string()),
        };
        let rendered = transactions(&view);
        assert!(rendered.starts_with("Transações de Janeiro 2025\n"));
        assert!(rendered.contains("Filtro: \"alm\" (1 de 7)"));
        assert!(rendered.contains("t03 (excluindo)"));
        assert!(rendered.contains("08/01/2025"));
        assert!(rendered.contains("R$ 35,90"));
    }

    #[test]
    fn test_empty_transactions_table() {
        let view = ListView {
            period: None,
            loading: false,
            error: Some("Erro ao buscar transações".to_string()),
            search: String::new(),
            visible: Vec::new(),
            total: 0,
            pending_delete: None,
        };
        let rendered = transactions(&view);
        assert!(rendered.contains("Erro ao buscar transações"));
        assert!(rendered.contains("Nenhuma transação encontrada."));
    }

    #[test]
    fn test_dashboard() {
        let view = DashboardView {
            period: Some(Period::new(1, 2025).unwrap()),
            summary: TransactionSummary::default(),
            history: vec![MonthlyItem::new("jan/25", amt("100"), amt("50"))],
            summary_error: None,
            history_error: Some("Erro ao buscar o histórico".to_string()),
        };
        let rendered = dashboard(&view);
        assert!(rendered.starts_with("Resumo de Janeiro 2025\n"));
        assert!(rendered.contains("Saldo"));
        assert!(rendered.contains("R$ 0,00"));
        // No expenses means no category breakdown.
        assert!(!rendered.contains("Despesas por categoria"));
        assert!(rendered.contains("Erro ao buscar o histórico"));
        assert!(rendered.contains(&format!("+{}", "█".repeat(BAR_WIDTH))));
        assert!(rendered.contains(&format!("-{}", "█".repeat(BAR_WIDTH / 2))));
    }
}
