//! Monthly CSV report generation.
//!
//! Layout: a per-category summary table, one blank line, then the detail
//! table. Every field is double-quoted; embedded quotes are doubled per
//! standard CSV quoting.

use std::collections::HashMap;

use csv::{QuoteStyle, WriterBuilder};

use outlay_types::{Category, Expense, Fault};

const UNCATEGORIZED: &str = "Uncategorized";

/// Render expenses as a two-section CSV report.
///
/// Summary rows appear in order of first occurrence in `expenses`; detail
/// rows keep the given order.
pub fn monthly_report_csv(expenses: &[Expense], categories: &[Category]) -> Result<String, Fault> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    // Sum per category, preserving first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();
    for expense in expenses {
        let label = expense
            .category_id
            .as_deref()
            .and_then(|id| names.get(id).copied())
            .unwrap_or(UNCATEGORIZED)
            .to_string();
        if !sums.contains_key(&label) {
            order.push(label.clone());
        }
        *sums.entry(label).or_insert(0.0) += expense.amount;
    }

    let mut summary = quoted_writer();
    summary
        .write_record(["Summary by Category", "Amount"])
        .map_err(csv_fault)?;
    for label in &order {
        let amount = format!("{:.2}", sums[label]);
        summary
            .write_record([label.as_str(), amount.as_str()])
            .map_err(csv_fault)?;
    }

    let mut detail = quoted_writer();
    detail
        .write_record(["Date", "Title", "Category", "Amount", "Currency", "Notes"])
        .map_err(csv_fault)?;
    for expense in expenses {
        let category = expense
            .category_id
            .as_deref()
            .and_then(|id| names.get(id).copied())
            .unwrap_or("");
        let date = expense.occurred_on.format("%Y-%m-%d").to_string();
        let amount = expense.amount.to_string();
        detail
            .write_record([
                date.as_str(),
                expense.title.as_str(),
                category,
                amount.as_str(),
                expense.currency.as_str(),
                expense.notes.as_deref().unwrap_or(""),
            ])
            .map_err(csv_fault)?;
    }

    Ok(format!(
        "{}\n{}",
        finish_writer(summary)?,
        finish_writer(detail)?
    ))
}

fn quoted_writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new())
}

fn finish_writer(writer: csv::Writer<Vec<u8>>) -> Result<String, Fault> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Fault::storage(format!("csv flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Fault::storage(format!("csv not utf-8: {}", e)))
}

fn csv_fault(e: csv::Error) -> Fault {
    Fault::storage(format!("csv write failed: {}", e))
}
