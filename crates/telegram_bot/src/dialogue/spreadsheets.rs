//! Binding spreadsheets to months: /add, /remove, /list_tables.

use chrono::Datelike;
use engine::{ConversationState, EngineError, TempData, UserSession};
use sheets::{SheetsApi, ledger};

use crate::{
    months, parsing,
    sync::{self, SyncError},
    ui::{self, Keyboard, Reply},
};

use super::Dialogue;

impl<S: SheetsApi> Dialogue<'_, S> {
    pub(super) async fn begin_add(&self, user: &UserSession) -> Result<Vec<Reply>, EngineError> {
        self.engine
            .set_state(user, Some(ConversationState::WaitingSpreadsheetId), None)
            .await?;
        Ok(vec![Reply::plain(ui::ADD_PROMPT)])
    }

    /// The /add flow got a link or a bare id. Access is checked before the
    /// month is asked, so a sheet the service account cannot see is caught
    /// while the user still has the sharing dialog open.
    pub(super) async fn spreadsheet_id_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(spreadsheet_id) = ledger::extract_spreadsheet_id(text) else {
            return Ok(vec![Reply::plain(ui::BAD_LINK)]);
        };

        if !self.sheets.validate_access(&spreadsheet_id).await {
            return Ok(vec![Reply::plain(ui::sharing_instructions(
                self.service_email,
            ))]);
        }

        self.engine
            .set_state(
                user,
                Some(ConversationState::WaitingSpreadsheetMonth),
                Some(TempData::SpreadsheetDraft { spreadsheet_id }),
            )
            .await?;
        Ok(vec![Reply::with_keyboard(
            ui::MONTH_PROMPT,
            ui::month_keyboard(self.today.month(), self.today.year()),
        )])
    }

    /// The /add flow got its "Месяц Год" answer.
    pub(super) async fn spreadsheet_month_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(TempData::SpreadsheetDraft { spreadsheet_id }) = user.temp_data.clone() else {
            return self.corrupted_flow(user).await;
        };

        let Some((month, year)) = parsing::parse_month_year(text) else {
            return Ok(vec![Reply::plain(ui::BAD_MONTH)]);
        };

        let title = match self.sheets.spreadsheet_title(&spreadsheet_id).await {
            Ok(title) => title,
            Err(err) => {
                tracing::warn!(
                    user = user.telegram_id,
                    error = %err,
                    "could not read the spreadsheet title"
                );
                return Ok(vec![Reply::plain(ui::ADD_FAILED)]);
            }
        };

        match self
            .engine
            .add_spreadsheet(user.telegram_id, &spreadsheet_id, &title, month, year)
            .await
        {
            Ok(_) => {}
            Err(EngineError::ExistingKey(_)) => {
                return Ok(vec![Reply::plain(ui::DUPLICATE_BINDING)]);
            }
            Err(err) => return Err(err),
        }

        // The binding is saved either way; a sync hiccup is not worth
        // failing the whole flow over.
        match sync::sync_categories(self.engine, self.sheets, user.telegram_id, &spreadsheet_id)
            .await
        {
            Ok(_) => {}
            Err(SyncError::Engine(err)) => return Err(err),
            Err(SyncError::Sheets(err)) => {
                tracing::warn!(
                    user = user.telegram_id,
                    error = %err,
                    "category sync after binding failed"
                );
            }
        }

        self.engine.clear_state(user).await?;
        Ok(vec![Reply::plain(ui::binding_added(&months::month_label(
            month, year,
        )))])
    }

    pub(super) async fn remove_command(
        &self,
        user: &UserSession,
        target: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let bindings = self.engine.spreadsheets(user.telegram_id).await?;
        if bindings.is_empty() {
            return Ok(vec![Reply::plain(ui::NO_TABLES_YET)]);
        }

        if !target.is_empty() {
            let Some(binding) = bindings
                .iter()
                .find(|binding| months::month_label(binding.month, binding.year) == target)
            else {
                return Ok(vec![Reply::plain(ui::TABLE_NOT_FOUND)]);
            };
            self.engine
                .remove_spreadsheet(user.telegram_id, binding.month, binding.year)
                .await?;
            return Ok(vec![Reply::plain(ui::TABLE_REMOVED)]);
        }

        self.engine
            .set_state(
                user,
                Some(ConversationState::WaitingSpreadsheetToDelete),
                None,
            )
            .await?;
        let labels = bindings
            .iter()
            .map(|binding| months::month_label(binding.month, binding.year));
        Ok(vec![Reply::with_keyboard(
            ui::PICK_TABLE_TO_DELETE,
            ui::one_per_row(labels),
        )])
    }

    pub(super) async fn spreadsheet_delete_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let bindings = self.engine.spreadsheets(user.telegram_id).await?;
        let Some(binding) = bindings
            .iter()
            .find(|binding| months::month_label(binding.month, binding.year) == text)
        else {
            return Ok(vec![Reply::plain(ui::TABLE_NOT_FOUND)]);
        };

        let label = months::month_label(binding.month, binding.year);
        self.engine
            .remove_spreadsheet(user.telegram_id, binding.month, binding.year)
            .await?;
        self.engine.clear_state(user).await?;
        Ok(vec![Reply::with_keyboard(
            ui::binding_removed(&label),
            Keyboard::Remove,
        )])
    }

    pub(super) async fn list_tables(&self, user: &UserSession) -> Result<Vec<Reply>, EngineError> {
        let bindings = self.engine.spreadsheets(user.telegram_id).await?;
        if bindings.is_empty() {
            return Ok(vec![Reply::plain(ui::NO_TABLES_YET)]);
        }
        Ok(vec![Reply::plain(ui::tables_list(&bindings))])
    }

    pub(super) async fn sync_command(&self, user: &UserSession) -> Result<Vec<Reply>, EngineError> {
        let Some(binding) = self.engine.latest_spreadsheet(user.telegram_id).await? else {
            return Ok(vec![Reply::plain(ui::NO_TABLES_YET)]);
        };

        match sync::sync_categories(
            self.engine,
            self.sheets,
            user.telegram_id,
            &binding.spreadsheet_id,
        )
        .await
        {
            Ok(report) if report.is_empty() => Ok(vec![Reply::plain(ui::ALL_SYNCED)]),
            Ok(report) => Ok(vec![Reply::plain(ui::sync_report(&report))]),
            Err(SyncError::Engine(err)) => Err(err),
            Err(SyncError::Sheets(err)) => {
                tracing::error!(
                    user = user.telegram_id,
                    error = %err,
                    "category sync failed"
                );
                Ok(vec![Reply::plain(ui::SYNC_FAILED)])
            }
        }
    }
}
