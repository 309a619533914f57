//! Category reconciliation between the database and the Сводка sheet.

use engine::{CategoryKind, Engine, EngineError};
use sheets::{SheetsApi, SheetsError, ledger};

/// Names added on each side, split by kind. Nothing is ever removed.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct SyncReport {
    pub db_expenses: Vec<String>,
    pub db_incomes: Vec<String>,
    pub sheet_expenses: Vec<String>,
    pub sheet_incomes: Vec<String>,
}

impl SyncReport {
    pub(crate) fn is_empty(&self) -> bool {
        self.db_expenses.is_empty()
            && self.db_incomes.is_empty()
            && self.sheet_expenses.is_empty()
            && self.sheet_incomes.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SyncError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

/// Adds sheet-only names to the database and database-only names to the
/// sheet. Matching is case-insensitive so a hand-edited sheet never
/// produces duplicates.
pub(crate) async fn sync_categories<S: SheetsApi>(
    engine: &Engine,
    sheets: &S,
    telegram_id: i64,
    spreadsheet_id: &str,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();
    for kind in [CategoryKind::Expense, CategoryKind::Income] {
        let (to_db, to_sheet) = sync_kind(engine, sheets, telegram_id, spreadsheet_id, kind).await?;
        match kind {
            CategoryKind::Expense => {
                report.db_expenses = to_db;
                report.sheet_expenses = to_sheet;
            }
            CategoryKind::Income => {
                report.db_incomes = to_db;
                report.sheet_incomes = to_sheet;
            }
        }
    }
    Ok(report)
}

async fn sync_kind<S: SheetsApi>(
    engine: &Engine,
    sheets: &S,
    telegram_id: i64,
    spreadsheet_id: &str,
    kind: CategoryKind,
) -> Result<(Vec<String>, Vec<String>), SyncError> {
    let column_range = match kind {
        CategoryKind::Expense => ledger::EXPENSE_CATEGORIES_RANGE,
        CategoryKind::Income => ledger::INCOME_CATEGORIES_RANGE,
    };
    let column = sheets.get_values(spreadsheet_id, column_range).await?;
    let sheet_names = ledger::column_values(&column);

    let local_names: Vec<String> = engine
        .categories(telegram_id, kind)
        .await?
        .into_iter()
        .map(|category| category.name)
        .collect();

    let sheet_lower: Vec<String> = sheet_names.iter().map(|name| name.to_lowercase()).collect();
    let local_lower: Vec<String> = local_names.iter().map(|name| name.to_lowercase()).collect();

    let mut added_to_db: Vec<String> = Vec::new();
    for name in &sheet_names {
        let lower = name.to_lowercase();
        if local_lower.contains(&lower)
            || added_to_db.iter().any(|added| added.to_lowercase() == lower)
        {
            continue;
        }
        match engine.add_category(telegram_id, kind, name).await {
            Ok(_) => added_to_db.push(name.clone()),
            Err(EngineError::ExistingKey(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let mut added_to_sheet = Vec::new();
    let mut occupied = column;
    for name in &local_names {
        if sheet_lower.contains(&name.to_lowercase()) {
            continue;
        }
        let row = ledger::first_free_category_row(&occupied);
        let row_range = match kind {
            CategoryKind::Expense => ledger::expense_category_row_range(row),
            CategoryKind::Income => ledger::income_category_row_range(row),
        };
        sheets
            .update_values(spreadsheet_id, &row_range, vec![ledger::category_row(name)])
            .await?;

        let index = row - ledger::CATEGORIES_FIRST_ROW;
        if index < occupied.len() {
            occupied[index] = vec![name.clone()];
        } else {
            occupied.push(vec![name.clone()]);
        }
        added_to_sheet.push(name.clone());
    }

    Ok((added_to_db, added_to_sheet))
}
