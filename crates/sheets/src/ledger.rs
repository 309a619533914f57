//! Fixed layout of the spreadsheet template.
//!
//! Every bound table is a copy of the shared template: the «Транзакции»
//! sheet keeps expenses and incomes in two four-column blocks starting at
//! row 5, the «Сводка» sheet lists category names in one column per kind
//! starting at row 28, with formula cells to the right of each name.

use serde_json::{Value, json};

/// Expense rows: date, amount, description, category.
pub const EXPENSE_RANGE: &str = "Транзакции!B5:E";
/// Income rows, same four columns.
pub const INCOME_RANGE: &str = "Транзакции!G5:J";

/// Expense category names on the summary sheet.
pub const EXPENSE_CATEGORIES_RANGE: &str = "Сводка!B28:B";
/// Income category names on the summary sheet.
pub const INCOME_CATEGORIES_RANGE: &str = "Сводка!H28:H";

/// First row of the category blocks on the summary sheet.
pub const CATEGORIES_FIRST_ROW: usize = 28;

/// Range of one expense category row: the name plus the formula cells
/// the template keeps next to it.
pub fn expense_category_row_range(row: usize) -> String {
    format!("Сводка!B{row}:F{row}")
}

/// Income counterpart of [`expense_category_row_range`].
pub fn income_category_row_range(row: usize) -> String {
    format!("Сводка!H{row}:L{row}")
}

/// Row index of the first gap in a category column, given the raw read of
/// that column, or the row right below its last used row.
pub fn first_free_category_row(rows: &[Vec<String>]) -> usize {
    for (offset, row) in rows.iter().enumerate() {
        let blank = row.first().is_none_or(|cell| cell.trim().is_empty());
        if blank {
            return CATEGORIES_FIRST_ROW + offset;
        }
    }
    CATEGORIES_FIRST_ROW + rows.len()
}

/// A freshly written category row: the name and four blanked-out cells.
pub fn category_row(name: &str) -> Vec<Value> {
    vec![json!(name), json!(""), json!(""), json!(""), json!("")]
}

/// One ledger row. The amount goes out as a number so the template's
/// totals keep summing regardless of the sheet locale.
pub fn transaction_row(date: &str, amount: f64, description: &str, category: &str) -> Vec<Value> {
    vec![
        json!(date),
        json!(amount),
        json!(description),
        json!(category),
    ]
}

/// Trimmed, non-empty first cells of a single-column read.
pub fn column_values(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.first())
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// Amounts come back formatted for the sheet locale: comma as the decimal
/// separator, spaces (possibly non-breaking) grouping thousands.
pub fn parse_sheet_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Public URL of a spreadsheet.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}")
}

/// Pulls the spreadsheet id out of a pasted link, or passes a bare id
/// through untouched. `None` means the text is a link with no id in it.
pub fn extract_spreadsheet_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if !input.contains("docs.google.com") {
        return Some(input.to_string());
    }

    let tail = input.split_once("spreadsheets/d/")?.1;
    let id: String = tail
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if id.is_empty() { None } else { Some(id) }
}
