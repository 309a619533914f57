//! Category management: the /categories menu, /map, and the flows that
//! resolve an unclassified transaction.

use engine::{CategoryKind, ConversationState, EngineError, TempData, UserSession};
use sheets::SheetsApi;

use crate::{
    sync::{self, SyncError},
    ui::{self, Reply},
};

use super::Dialogue;

impl<S: SheetsApi> Dialogue<'_, S> {
    pub(super) async fn categories_menu(
        &self,
        user: &UserSession,
    ) -> Result<Vec<Reply>, EngineError> {
        self.engine
            .set_state(user, Some(ConversationState::WaitingCategoriesAction), None)
            .await?;
        Ok(vec![Reply::with_keyboard(
            ui::PICK_ACTION,
            ui::categories_menu_keyboard(),
        )])
    }

    pub(super) async fn categories_action_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        match text {
            ui::MENU_EXPENSE_CATEGORIES => {
                self.show_categories(user, CategoryKind::Expense).await
            }
            ui::MENU_INCOME_CATEGORIES => self.show_categories(user, CategoryKind::Income).await,
            ui::MENU_ADD_CATEGORY => {
                self.engine
                    .set_state(user, Some(ConversationState::WaitingCategoryType), None)
                    .await?;
                Ok(vec![Reply::with_keyboard(
                    ui::PICK_CATEGORY_KIND,
                    ui::kind_keyboard(),
                )])
            }
            ui::MENU_DELETE_CATEGORY => {
                let owned = self.owned_category_names(user.telegram_id).await?;
                if owned.is_empty() {
                    self.engine.clear_state(user).await?;
                    return Ok(vec![Reply::plain(ui::NO_OWN_CATEGORIES)]);
                }
                self.engine
                    .set_state(user, Some(ConversationState::WaitingCategoryToDelete), None)
                    .await?;
                Ok(vec![Reply::with_keyboard(
                    ui::PICK_CATEGORY_TO_DELETE,
                    ui::one_per_row(owned),
                )])
            }
            _ => {
                self.engine.clear_state(user).await?;
                Ok(vec![Reply::plain(ui::UNKNOWN_ACTION)])
            }
        }
    }

    pub(super) async fn category_type_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(kind) = ui::kind_from_button(text) else {
            return Ok(vec![Reply::plain(ui::BAD_CATEGORY_KIND)]);
        };
        self.engine
            .set_state(
                user,
                Some(ConversationState::WaitingNewCategoryName),
                Some(TempData::CategoryDraft { kind }),
            )
            .await?;
        Ok(vec![Reply::plain(ui::NEW_CATEGORY_PROMPT)])
    }

    pub(super) async fn new_category_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(&TempData::CategoryDraft { kind }) = user.temp_data.as_ref() else {
            return self.corrupted_flow(user).await;
        };

        match self.engine.add_category(user.telegram_id, kind, text).await {
            Ok(_) => {}
            Err(EngineError::ExistingKey(_)) => {
                return Ok(vec![Reply::plain(ui::category_exists(text))]);
            }
            Err(EngineError::InvalidName(_)) => {
                return Ok(vec![Reply::plain(ui::NEW_CATEGORY_PROMPT)]);
            }
            Err(err) => return Err(err),
        }

        // Push the new name to the bound sheet so it can be used right away.
        if let Some(binding) = self.engine.latest_spreadsheet(user.telegram_id).await? {
            match sync::sync_categories(
                self.engine,
                self.sheets,
                user.telegram_id,
                &binding.spreadsheet_id,
            )
            .await
            {
                Ok(_) => {}
                Err(SyncError::Engine(err)) => return Err(err),
                Err(SyncError::Sheets(err)) => {
                    tracing::warn!(
                        user = user.telegram_id,
                        error = %err,
                        "category sync after adding a category failed"
                    );
                }
            }
        }

        self.engine.clear_state(user).await?;
        Ok(vec![Reply::plain(ui::category_added(text))])
    }

    pub(super) async fn delete_category_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        match self.engine.delete_category(user.telegram_id, text).await {
            Ok(()) => {
                self.engine.clear_state(user).await?;
                Ok(vec![Reply::plain(ui::category_removed(text))])
            }
            Err(EngineError::KeyNotFound(_)) => Ok(vec![Reply::plain(ui::category_not_found(text))]),
            Err(err) => Err(err),
        }
    }

    /// A parked transaction is waiting and the user answered with either a
    /// category name or the mapping button.
    pub(super) async fn category_selection_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(TempData::Pending(draft)) = user.temp_data.clone() else {
            return self.corrupted_flow(user).await;
        };

        if text == ui::ADD_MAPPING_BUTTON {
            let prompt = ui::mapping_prompt(&draft.description);
            self.engine
                .set_state(
                    user,
                    Some(ConversationState::WaitingCategoryMapping),
                    Some(TempData::Pending(draft)),
                )
                .await?;
            return Ok(vec![Reply::plain(prompt)]);
        }

        let names = self.category_names(user.telegram_id, draft.kind()).await?;
        if !names.iter().any(|name| name == text) {
            return Ok(vec![Reply::with_keyboard(
                ui::unknown_category_pick(text),
                ui::category_keyboard(&names),
            )]);
        }

        // The whole description becomes a keyword, so the same wording is
        // classified without asking next time.
        self.engine
            .learn_keyword(user.telegram_id, draft.kind(), &draft.description, text)
            .await?;
        let replies = self.record(user, &draft, text).await?;
        self.engine.clear_state(user).await?;
        Ok(replies)
    }

    pub(super) async fn category_mapping_step(
        &self,
        user: &UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let Some(TempData::Pending(draft)) = user.temp_data.clone() else {
            return self.corrupted_flow(user).await;
        };

        let Some((word, category)) = parse_mapping(text) else {
            return Ok(vec![Reply::plain(ui::BAD_MAPPING)]);
        };

        let names = self.category_names(user.telegram_id, draft.kind()).await?;
        let Some(category) = names.iter().find(|name| name.as_str() == category) else {
            return Ok(vec![Reply::plain(ui::unknown_category_available(
                &category, &names,
            ))]);
        };

        self.engine
            .learn_keyword(user.telegram_id, draft.kind(), &word, category)
            .await?;
        let mut replies = vec![Reply::plain(ui::mapping_added(&word, category))];

        match self
            .engine
            .detect_category(user.telegram_id, draft.kind(), &draft.description)
            .await?
        {
            Some(found) => {
                replies.extend(self.record(user, &draft, &found.name).await?);
                self.engine.clear_state(user).await?;
            }
            None => {
                let prompt = ui::still_unresolved(&draft.description);
                self.engine
                    .set_state(
                        user,
                        Some(ConversationState::WaitingCategorySelection),
                        Some(TempData::Pending(draft)),
                    )
                    .await?;
                replies.push(Reply::with_keyboard(prompt, ui::category_keyboard(&names)));
            }
        }
        Ok(replies)
    }

    pub(super) async fn map_command(
        &self,
        user: &UserSession,
        tail: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        if tail.is_empty() {
            return Ok(vec![Reply::plain(ui::MAP_USAGE)]);
        }

        if tail == "--all" {
            let groups = self
                .engine
                .keywords_by_category(user.telegram_id, CategoryKind::Expense)
                .await?;
            return Ok(vec![Reply::plain(ui::mappings_reference(&groups))]);
        }

        if tail.contains('=') {
            let Some((word, category)) = parse_mapping(tail) else {
                return Ok(vec![Reply::plain(ui::BAD_MAPPING)]);
            };
            let names = self
                .category_names(user.telegram_id, CategoryKind::Expense)
                .await?;
            let Some(category) = names.iter().find(|name| name.as_str() == category) else {
                return Ok(vec![Reply::plain(ui::unknown_category_available(
                    &category, &names,
                ))]);
            };
            self.engine
                .learn_keyword(user.telegram_id, CategoryKind::Expense, &word, category)
                .await?;
            return Ok(vec![Reply::plain(ui::mapping_added(&word, category))]);
        }

        match self
            .engine
            .detect_category(user.telegram_id, CategoryKind::Expense, tail)
            .await?
        {
            Some(category) => Ok(vec![Reply::plain(ui::map_found(tail, &category.name))]),
            None => Ok(vec![Reply::plain(ui::map_not_found(tail))]),
        }
    }

    pub(super) async fn clear_command(
        &self,
        user: &UserSession,
    ) -> Result<Vec<Reply>, EngineError> {
        match self.engine.clear_categories(user.telegram_id).await {
            Ok(cleared) => Ok(vec![Reply::plain(ui::cleared_categories(
                cleared.expenses,
                cleared.incomes,
            ))]),
            Err(err) => {
                tracing::error!(
                    user = user.telegram_id,
                    error = %err,
                    "clearing categories failed"
                );
                Ok(vec![Reply::plain(ui::CLEAR_FAILED)])
            }
        }
    }

    async fn show_categories(
        &self,
        user: &UserSession,
        kind: CategoryKind,
    ) -> Result<Vec<Reply>, EngineError> {
        let names = self.category_names(user.telegram_id, kind).await?;
        self.engine.clear_state(user).await?;
        Ok(vec![Reply::plain(ui::category_listing(kind, &names))])
    }

    async fn owned_category_names(&self, telegram_id: i64) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::new();
        for kind in [CategoryKind::Expense, CategoryKind::Income] {
            names.extend(
                self.engine
                    .categories(telegram_id, kind)
                    .await?
                    .into_iter()
                    .filter(|category| !category.is_default())
                    .map(|category| category.name),
            );
        }
        Ok(names)
    }
}

/// Splits "слово = категория"; both sides must be non-empty and there can
/// be only one "=".
fn parse_mapping(text: &str) -> Option<(String, String)> {
    let (word, category) = text.split_once('=')?;
    let word = word.trim();
    let category = category.trim();
    (!word.is_empty() && !category.is_empty() && !category.contains('='))
        .then(|| (word.to_string(), category.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_mapping;

    #[test]
    fn mapping_splits_on_a_single_equals() {
        assert_eq!(
            parse_mapping("еда = Питание"),
            Some(("еда".to_string(), "Питание".to_string()))
        );
        assert_eq!(
            parse_mapping("такси до дома=Транспорт"),
            Some(("такси до дома".to_string(), "Транспорт".to_string()))
        );
        assert_eq!(parse_mapping("без разделителя"), None);
        assert_eq!(parse_mapping("= Питание"), None);
        assert_eq!(parse_mapping("еда ="), None);
        assert_eq!(parse_mapping("а = б = в"), None);
    }
}
