use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{EngineError, ResultEngine, SpreadsheetBinding, user_spreadsheets, users};

use super::{Engine, with_tx};

impl Engine {
    /// All bindings, newest month first.
    pub async fn spreadsheets(&self, telegram_id: i64) -> ResultEngine<Vec<SpreadsheetBinding>> {
        let models = user_spreadsheets::Entity::find()
            .filter(user_spreadsheets::Column::UserId.eq(telegram_id))
            .order_by_desc(user_spreadsheets::Column::Year)
            .order_by_desc(user_spreadsheets::Column::Month)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(SpreadsheetBinding::from).collect())
    }

    /// Binding covering one month, if any.
    pub async fn spreadsheet_for(
        &self,
        telegram_id: i64,
        month: u32,
        year: i32,
    ) -> ResultEngine<Option<SpreadsheetBinding>> {
        let month = checked_month(month)?;
        let model = user_spreadsheets::Entity::find()
            .filter(user_spreadsheets::Column::UserId.eq(telegram_id))
            .filter(user_spreadsheets::Column::Month.eq(month))
            .filter(user_spreadsheets::Column::Year.eq(year))
            .one(&self.database)
            .await?;
        Ok(model.map(SpreadsheetBinding::from))
    }

    /// The most recently bound month.
    pub async fn latest_spreadsheet(
        &self,
        telegram_id: i64,
    ) -> ResultEngine<Option<SpreadsheetBinding>> {
        let model = user_spreadsheets::Entity::find()
            .filter(user_spreadsheets::Column::UserId.eq(telegram_id))
            .order_by_desc(user_spreadsheets::Column::Year)
            .order_by_desc(user_spreadsheets::Column::Month)
            .one(&self.database)
            .await?;
        Ok(model.map(SpreadsheetBinding::from))
    }

    /// Bind a spreadsheet to a month and refresh the profile pointer to the
    /// active ledger. At most one binding may exist per month.
    pub async fn add_spreadsheet(
        &self,
        telegram_id: i64,
        spreadsheet_id: &str,
        title: &str,
        month: u32,
        year: i32,
    ) -> ResultEngine<SpreadsheetBinding> {
        let month = checked_month(month)?;
        with_tx!(self, |db_tx| {
            let exists = user_spreadsheets::Entity::find()
                .filter(user_spreadsheets::Column::UserId.eq(telegram_id))
                .filter(user_spreadsheets::Column::Month.eq(month))
                .filter(user_spreadsheets::Column::Year.eq(year))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!("{month}.{year}")));
            }

            let active = user_spreadsheets::ActiveModel {
                user_id: ActiveValue::Set(telegram_id),
                spreadsheet_id: ActiveValue::Set(spreadsheet_id.to_string()),
                title: ActiveValue::Set(title.to_string()),
                month: ActiveValue::Set(month),
                year: ActiveValue::Set(year),
                ..Default::default()
            };
            let model = active.insert(&db_tx).await?;

            users::Entity::update_many()
                .col_expr(
                    users::Column::CurrentSpreadsheetId,
                    Expr::value(spreadsheet_id.to_string()),
                )
                .filter(users::Column::TelegramId.eq(telegram_id))
                .exec(&db_tx)
                .await?;

            Ok(SpreadsheetBinding::from(model))
        })
    }

    /// Remove the binding for one month.
    pub async fn remove_spreadsheet(
        &self,
        telegram_id: i64,
        month: u32,
        year: i32,
    ) -> ResultEngine<()> {
        let month = checked_month(month)?;
        with_tx!(self, |db_tx| {
            let deleted = user_spreadsheets::Entity::delete_many()
                .filter(user_spreadsheets::Column::UserId.eq(telegram_id))
                .filter(user_spreadsheets::Column::Month.eq(month))
                .filter(user_spreadsheets::Column::Year.eq(year))
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!("{month}.{year}")));
            }
            Ok(())
        })
    }
}

fn checked_month(month: u32) -> ResultEngine<i32> {
    match i32::try_from(month) {
        Ok(value) if (1..=12).contains(&value) => Ok(value),
        _ => Err(EngineError::InvalidDate(format!(
            "month {month} out of range"
        ))),
    }
}
