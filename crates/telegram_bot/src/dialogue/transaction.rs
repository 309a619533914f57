//! Free-text transaction lines and their recording.

use chrono::Datelike;
use engine::{
    CategoryKind, ConversationState, EngineError, TempData, TransactionDraft, UserSession,
};
use sheets::{SheetsApi, ledger};

use crate::{
    months, parsing,
    ui::{self, Reply},
};

use super::Dialogue;

impl<S: SheetsApi> Dialogue<'_, S> {
    /// Text that no command or state claimed. Anything that does not parse
    /// as a transaction line gets the format reminder.
    pub(super) async fn handle_transaction_text(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(draft) = parsing::parse_transaction(text, self.today) else {
            return Ok(vec![Reply::plain(ui::BAD_FORMAT)]);
        };
        self.classify_and_record(user, draft).await
    }

    /// Records the draft when a keyword matches; otherwise parks it and
    /// asks the user to pick a category.
    async fn classify_and_record(
        &self,
        user: &UserSession,
        draft: TransactionDraft,
    ) -> Result<Vec<Reply>, EngineError> {
        let label = months::month_label(draft.date.month(), draft.date.year());
        let binding = self
            .engine
            .spreadsheet_for(user.telegram_id, draft.date.month(), draft.date.year())
            .await?;
        if binding.is_none() {
            tracing::warn!(
                user = user.telegram_id,
                month = draft.date.month(),
                year = draft.date.year(),
                "transaction for a month without a binding"
            );
            return Ok(vec![Reply::plain(ui::no_binding_for(&label))]);
        }

        let detected = self
            .engine
            .detect_category(user.telegram_id, draft.kind(), &draft.description)
            .await?;
        match detected {
            Some(category) => self.record(user, &draft, &category.name).await,
            None => {
                let names = self.category_names(user.telegram_id, draft.kind()).await?;
                let prompt = ui::unresolved_category(&draft.description);
                self.engine
                    .set_state(
                        user,
                        Some(ConversationState::WaitingCategorySelection),
                        Some(TempData::Pending(draft)),
                    )
                    .await?;
                Ok(vec![Reply::with_keyboard(
                    prompt,
                    ui::category_keyboard(&names),
                )])
            }
        }
    }

    /// Appends the transaction to its month's block. Shared by the direct
    /// path and the pick and mapping flows.
    pub(super) async fn record(
        &self,
        user: &UserSession,
        draft: &TransactionDraft,
        category: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let label = months::month_label(draft.date.month(), draft.date.year());
        let Some(binding) = self
            .engine
            .spreadsheet_for(user.telegram_id, draft.date.month(), draft.date.year())
            .await?
        else {
            return Ok(vec![Reply::plain(ui::no_binding_for(&label))]);
        };

        let range = if draft.is_income {
            ledger::INCOME_RANGE
        } else {
            ledger::EXPENSE_RANGE
        };
        let row = ledger::transaction_row(
            &draft.date.format("%d.%m.%Y").to_string(),
            draft.amount,
            &draft.description,
            category,
        );
        if let Err(err) = self
            .sheets
            .append_values(&binding.spreadsheet_id, range, vec![row])
            .await
        {
            tracing::error!(
                user = user.telegram_id,
                error = %err,
                "appending the transaction failed"
            );
            return Ok(vec![Reply::plain(ui::RECORD_FAILED)]);
        }

        Ok(vec![Reply::plain(ui::recorded(draft, category))])
    }

    pub(super) async fn category_names(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
    ) -> Result<Vec<String>, EngineError> {
        Ok(self
            .engine
            .categories(telegram_id, kind)
            .await?
            .into_iter()
            .map(|category| category.name)
            .collect())
    }
}
