//! Per-month bindings to Google spreadsheets.

use sea_orm::entity::prelude::*;

/// Binding entry exposed to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadsheetBinding {
    pub spreadsheet_id: String,
    pub title: String,
    pub month: u32,
    pub year: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_spreadsheets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i64,
    pub spreadsheet_id: String,
    pub title: String,
    pub month: i32,
    pub year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::TelegramId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SpreadsheetBinding {
    fn from(model: Model) -> Self {
        Self {
            spreadsheet_id: model.spreadsheet_id,
            title: model.title,
            month: model.month.unsigned_abs(),
            year: model.year,
        }
    }
}
