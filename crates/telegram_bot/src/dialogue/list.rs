//! The /list flow: fetch a month's block, filter, page through it.

use chrono::{Datelike, NaiveDate};
use engine::{CategoryKind, ConversationState, EngineError, ListFilter, TempData, UserSession};
use sheets::{SheetsApi, SheetsError, ledger};

use crate::{
    months, parsing,
    ui::{self, Keyboard, ListedRow, Reply},
};

use super::Dialogue;

const TRANSACTIONS_PER_PAGE: usize = 10;

/// A transaction row read back from the sheet.
struct LedgerRow {
    date: NaiveDate,
    raw_date: String,
    amount: f64,
    description: String,
    category: String,
}

impl<S: SheetsApi> Dialogue<'_, S> {
    pub(super) async fn begin_list(
        &self,
        user: &UserSession,
        args: &[String],
    ) -> Result<Vec<Reply>, EngineError> {
        let mut month = self.today.month();
        let mut year = self.today.year();

        if let Some(raw) = args.first() {
            let Some(parsed) = parsing::parse_month_argument(raw) else {
                return Ok(vec![Reply::plain(ui::BAD_LIST_MONTH)]);
            };
            month = parsed;
        }
        if let Some(raw) = args.get(1) {
            let Ok(parsed) = raw.parse::<i32>() else {
                return Ok(vec![Reply::plain(ui::BAD_LIST_YEAR)]);
            };
            if parsed < 2020 {
                return Ok(vec![Reply::plain(ui::YEAR_TOO_OLD)]);
            }
            year = parsed;
        }

        let label = months::month_label(month, year);
        let Some(binding) = self
            .engine
            .spreadsheet_for(user.telegram_id, month, year)
            .await?
        else {
            return Ok(vec![Reply::plain(ui::no_table_for(&label))]);
        };

        self.engine
            .set_state(
                user,
                Some(ConversationState::WaitingListAction),
                Some(TempData::List(ListFilter {
                    spreadsheet_id: binding.spreadsheet_id,
                    month,
                    year,
                    kind: None,
                    page: 1,
                })),
            )
            .await?;
        Ok(vec![Reply::with_keyboard(
            ui::pick_list_type(&label),
            ui::kind_keyboard(),
        )])
    }

    /// `None` lets unrelated text fall through to the transaction parser
    /// with the state kept.
    pub(super) async fn list_action_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Option<Vec<Reply>>, EngineError> {
        let Some(TempData::List(filter)) = user.temp_data.clone() else {
            return self.corrupted_flow(user).await.map(Some);
        };
        let Some(kind) = ui::kind_from_button(text) else {
            return Ok(None);
        };

        let filter = ListFilter {
            kind: Some(kind),
            page: 1,
            ..filter
        };
        self.show_page(user, filter).await.map(Some)
    }

    pub(super) async fn list_page_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Option<Vec<Reply>>, EngineError> {
        let Some(TempData::List(filter)) = user.temp_data.clone() else {
            return self.corrupted_flow(user).await.map(Some);
        };

        let step: isize = match text {
            ui::BACK_BUTTON => -1,
            ui::FORWARD_BUTTON => 1,
            ui::CLOSE_BUTTON => {
                self.engine.clear_state(user).await?;
                return Ok(Some(vec![Reply::with_keyboard(
                    ui::LIST_CLOSED,
                    Keyboard::Remove,
                )]));
            }
            _ => return Ok(None),
        };

        let page = filter.page.saturating_add_signed(step).max(1);
        let filter = ListFilter { page, ..filter };
        self.show_page(user, filter).await.map(Some)
    }

    /// Re-reads the sheet, clamps the requested page and renders it. The
    /// sheet is the source of truth, so rows added since the last page
    /// turn show up mid-flow.
    async fn show_page(
        &self,
        user: &UserSession,
        filter: ListFilter,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(kind) = filter.kind else {
            return self.corrupted_flow(user).await;
        };
        let label = months::month_label(filter.month, filter.year);

        let rows = match self.fetch_month_rows(&filter, kind).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::error!(
                    user = user.telegram_id,
                    error = %err,
                    "reading the transaction list failed"
                );
                self.engine.clear_state(user).await?;
                return Ok(vec![Reply::with_keyboard(
                    ui::SHEET_READ_FAILED,
                    Keyboard::Remove,
                )]);
            }
        };
        if rows.is_empty() {
            self.engine.clear_state(user).await?;
            return Ok(vec![Reply::with_keyboard(
                ui::no_transactions(kind, &label),
                Keyboard::Remove,
            )]);
        }

        let total_pages = rows.len().div_ceil(TRANSACTIONS_PER_PAGE);
        let page = filter.page.clamp(1, total_pages);
        let filter = ListFilter { page, ..filter };

        self.engine
            .set_state(
                user,
                Some(ConversationState::WaitingListPage),
                Some(TempData::List(filter)),
            )
            .await?;

        let grand_total: f64 = rows.iter().map(|row| row.amount).sum();
        let start = (page - 1) * TRANSACTIONS_PER_PAGE;
        let end = (start + TRANSACTIONS_PER_PAGE).min(rows.len());
        let page_rows: Vec<ListedRow> = rows[start..end]
            .iter()
            .map(|row| ListedRow {
                date: row.raw_date.clone(),
                amount: row.amount,
                category: row.category.clone(),
                description: row.description.clone(),
            })
            .collect();

        let text = ui::transactions_page(kind, &label, page, total_pages, &page_rows, grand_total);
        Ok(vec![Reply::with_keyboard(
            text,
            ui::pager_keyboard(page > 1, page < total_pages),
        )])
    }

    /// The month's rows, newest first. Rows shorter than four cells or
    /// with unreadable dates are skipped.
    async fn fetch_month_rows(
        &self,
        filter: &ListFilter,
        kind: CategoryKind,
    ) -> Result<Vec<LedgerRow>, SheetsError> {
        let range = match kind {
            CategoryKind::Expense => ledger::EXPENSE_RANGE,
            CategoryKind::Income => ledger::INCOME_RANGE,
        };
        let values = self.sheets.get_values(&filter.spreadsheet_id, range).await?;

        let mut rows: Vec<LedgerRow> = values
            .into_iter()
            .filter_map(|row| parse_ledger_row(row, filter.month, filter.year))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}

fn parse_ledger_row(row: Vec<String>, month: u32, year: i32) -> Option<LedgerRow> {
    if row.len() < 4 {
        return None;
    }
    let raw_date = row[0].trim().to_string();
    let date = NaiveDate::parse_from_str(&raw_date, "%d.%m.%Y").ok()?;
    if date.month() != month || date.year() != year {
        return None;
    }
    Some(LedgerRow {
        date,
        raw_date,
        amount: ledger::parse_sheet_amount(&row[1]),
        description: row[2].clone(),
        category: row[3].clone(),
    })
}
