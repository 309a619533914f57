use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{
    EngineError, ResultEngine, UserSession,
    conversation::{ConversationState, TempData},
    users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Fetch a session. `None` when the user never ran /start.
    pub async fn user(&self, telegram_id: i64) -> ResultEngine<Option<UserSession>> {
        let model = users::Entity::find_by_id(telegram_id)
            .one(&self.database)
            .await?;
        Ok(model.map(UserSession::from))
    }

    /// Create the user on first contact. Idempotent: repeated calls refresh
    /// the profile fields and leave state and scratch data untouched.
    pub async fn register_user(
        &self,
        telegram_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> ResultEngine<UserSession> {
        with_tx!(self, |db_tx| {
            let existing = users::Entity::find_by_id(telegram_id).one(&db_tx).await?;
            let model = match existing {
                Some(model) => {
                    let mut active: users::ActiveModel = model.into();
                    active.username = ActiveValue::Set(username.map(ToString::to_string));
                    active.first_name = ActiveValue::Set(first_name.map(ToString::to_string));
                    active.last_name = ActiveValue::Set(last_name.map(ToString::to_string));
                    active.update(&db_tx).await?
                }
                None => {
                    let active = users::ActiveModel {
                        telegram_id: ActiveValue::Set(telegram_id),
                        username: ActiveValue::Set(username.map(ToString::to_string)),
                        first_name: ActiveValue::Set(first_name.map(ToString::to_string)),
                        last_name: ActiveValue::Set(last_name.map(ToString::to_string)),
                        state: ActiveValue::Set(String::new()),
                        temp_data: ActiveValue::Set("{}".to_string()),
                        current_spreadsheet_id: ActiveValue::Set(None),
                        version: ActiveValue::Set(0),
                    };
                    active.insert(&db_tx).await?
                }
            };
            Ok(UserSession::from(model))
        })
    }

    /// Persist a state transition guarded by the version the session was
    /// loaded with. A write racing a newer one fails with
    /// [`EngineError::StaleState`] instead of clobbering it.
    pub async fn set_state(
        &self,
        session: &UserSession,
        state: Option<ConversationState>,
        temp_data: Option<TempData>,
    ) -> ResultEngine<UserSession> {
        let state_value = state.map_or("", ConversationState::as_str).to_string();
        let temp_value = match &temp_data {
            Some(data) => serde_json::to_string(data)?,
            None => "{}".to_string(),
        };

        with_tx!(self, |db_tx| {
            let updated = users::Entity::update_many()
                .col_expr(users::Column::State, Expr::value(state_value))
                .col_expr(users::Column::TempData, Expr::value(temp_value))
                .col_expr(
                    users::Column::Version,
                    Expr::col(users::Column::Version).add(1),
                )
                .filter(users::Column::TelegramId.eq(session.telegram_id))
                .filter(users::Column::Version.eq(session.version))
                .exec(&db_tx)
                .await?;

            if updated.rows_affected == 0 {
                return Err(EngineError::StaleState(session.telegram_id));
            }

            Ok(UserSession {
                telegram_id: session.telegram_id,
                state,
                temp_data,
                version: session.version + 1,
            })
        })
    }

    /// Finish a flow: drop state and scratch data.
    pub async fn clear_state(&self, session: &UserSession) -> ResultEngine<UserSession> {
        self.set_state(session, None, None).await
    }
}
