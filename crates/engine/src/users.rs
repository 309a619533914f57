//! Telegram accounts and their persisted conversation state.
//!
//! `state` and `temp_data` are stored denormalized on the user row so a
//! flow survives process restarts; `version` guards against overlapping
//! writes from duplicate update delivery.

use sea_orm::entity::prelude::*;

use crate::conversation::{ConversationState, TempData};

/// Durable session exposed to clients. Carries the row version it was
/// loaded with, so a later write can detect it went stale.
#[derive(Clone, Debug, PartialEq)]
pub struct UserSession {
    pub telegram_id: i64,
    pub state: Option<ConversationState>,
    pub temp_data: Option<TempData>,
    pub(crate) version: i32,
}

impl UserSession {
    pub const fn is_idle(&self) -> bool {
        self.state.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub state: String,
    pub temp_data: String,
    pub current_spreadsheet_id: Option<String>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::user_spreadsheets::Entity")]
    UserSpreadsheets,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::user_spreadsheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSpreadsheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserSession {
    fn from(model: Model) -> Self {
        let state = match model.state.as_str() {
            "" => None,
            raw => {
                let parsed = ConversationState::parse(raw);
                if parsed.is_none() {
                    tracing::warn!(
                        user = model.telegram_id,
                        state = raw,
                        "unknown persisted state, treating as idle"
                    );
                }
                parsed
            }
        };
        let temp_data = match model.temp_data.as_str() {
            "" | "{}" => None,
            raw => match serde_json::from_str::<TempData>(raw) {
                Ok(data) => Some(data),
                Err(err) => {
                    tracing::warn!(
                        user = model.telegram_id,
                        error = %err,
                        "corrupt scratch data, dropping"
                    );
                    None
                }
            },
        };

        Self {
            telegram_id: model.telegram_id,
            state,
            temp_data,
            version: model.version,
        }
    }
}
