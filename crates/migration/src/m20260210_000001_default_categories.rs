//! Seeds the shared category set every user starts with.
//!
//! The names match the summary page of the spreadsheet template the bot is
//! distributed with. Shared categories carry `owner_id = NULL`.

use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use sea_orm_migration::{SchemaManagerConnection, prelude::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

const EXPENSE_CATEGORIES: [&str; 16] = [
    "Питание",
    "Подарки",
    "Здоровье/медицина",
    "Дом",
    "Транспорт",
    "Личные расходы",
    "Домашние животные",
    "Коммунальные услуги",
    "Путешествия",
    "Одежда",
    "Развлечения",
    "Кафе/Ресторан",
    "Алко",
    "Образование",
    "Услуги",
    "Авто",
];

const INCOME_CATEGORIES: [&str; 6] = [
    "Зарплата",
    "Премия",
    "Кешбек, др. бонусы",
    "Процентный доход",
    "Инвестиции",
    "Другое",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for name in EXPENSE_CATEGORIES {
            insert_shared_category(db, backend, name, "expense").await?;
        }
        for name in INCOME_CATEGORIES {
            insert_shared_category(db, backend, name, "income").await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        db.execute(Statement::from_string(
            backend,
            "DELETE FROM categories WHERE owner_id IS NULL;",
        ))
        .await?;

        Ok(())
    }
}

async fn insert_shared_category(
    db: &SchemaManagerConnection<'_>,
    backend: DbBackend,
    name: &str,
    kind: &str,
) -> Result<(), DbErr> {
    let values: Vec<Value> = vec![name.into(), kind.into()];
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO categories (name, kind, owner_id) VALUES (?, ?, NULL);",
        values,
    ))
    .await?;
    Ok(())
}
