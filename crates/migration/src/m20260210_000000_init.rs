//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for Kopilka:
//!
//! - `users`: Telegram accounts with their conversation state
//! - `categories`: default (shared) and per-user transaction categories
//! - `category_keywords`: learned description words per category
//! - `user_spreadsheets`: per-month bindings to Google spreadsheets

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    TelegramId,
    Username,
    FirstName,
    LastName,
    State,
    TempData,
    CurrentSpreadsheetId,
    Version,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    Kind,
    OwnerId,
}

#[derive(Iden)]
enum CategoryKeywords {
    Table,
    Id,
    CategoryId,
    Word,
}

#[derive(Iden)]
enum UserSpreadsheets {
    Table,
    Id,
    UserId,
    SpreadsheetId,
    Title,
    Month,
    Year,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::TelegramId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string())
                    .col(ColumnDef::new(Users::FirstName).string())
                    .col(ColumnDef::new(Users::LastName).string())
                    .col(
                        ColumnDef::new(Users::State)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Users::TempData)
                            .string()
                            .not_null()
                            .default("{}"),
                    )
                    .col(ColumnDef::new(Users::CurrentSpreadsheetId).string())
                    .col(
                        ColumnDef::new(Users::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::OwnerId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-owner_id")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::TelegramId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_id")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-kind")
                    .table(Categories::Table)
                    .col(Categories::Kind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-name-kind-owner_id-unique")
                    .table(Categories::Table)
                    .col(Categories::Name)
                    .col(Categories::Kind)
                    .col(Categories::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Category keywords
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CategoryKeywords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategoryKeywords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CategoryKeywords::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CategoryKeywords::Word).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-category_keywords-category_id")
                            .from(CategoryKeywords::Table, CategoryKeywords::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-category_keywords-category_id-word-unique")
                    .table(CategoryKeywords::Table)
                    .col(CategoryKeywords::CategoryId)
                    .col(CategoryKeywords::Word)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. User spreadsheets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UserSpreadsheets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSpreadsheets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserSpreadsheets::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSpreadsheets::SpreadsheetId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserSpreadsheets::Title).string().not_null())
                    .col(
                        ColumnDef::new(UserSpreadsheets::Month)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserSpreadsheets::Year).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_spreadsheets-user_id")
                            .from(UserSpreadsheets::Table, UserSpreadsheets::UserId)
                            .to(Users::Table, Users::TelegramId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user_spreadsheets-user_id-month-year-unique")
                    .table(UserSpreadsheets::Table)
                    .col(UserSpreadsheets::UserId)
                    .col(UserSpreadsheets::Month)
                    .col(UserSpreadsheets::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(UserSpreadsheets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CategoryKeywords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
