use std::collections::HashSet;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, categories, category_keywords,
    util::{normalize_required_name, normalize_text},
};

use super::{Engine, with_tx};

/// How many user-owned categories `clear_categories` removed, per kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClearedCategories {
    pub expenses: u64,
    pub incomes: u64,
}

impl Engine {
    /// Categories visible to the user: shared defaults plus user-owned,
    /// deduplicated by name (the default wins), sorted for display.
    pub async fn categories(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut list = visible_categories(&db_tx, telegram_id, kind).await?;
            list.sort_by(|a, b| normalize_text(&a.name).cmp(&normalize_text(&b.name)));
            Ok(list)
        })
    }

    /// First category of the kind with a keyword occurring inside the
    /// description. User-owned categories win over shared defaults; within
    /// a block the scan order is category name, then learning order.
    pub async fn detect_category(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
        description: &str,
    ) -> ResultEngine<Option<Category>> {
        let needle = normalize_text(description);
        with_tx!(self, |db_tx| {
            for owner_filter in [
                categories::Column::OwnerId.eq(telegram_id),
                categories::Column::OwnerId.is_null(),
            ] {
                let rows = category_keywords::Entity::find()
                    .find_also_related(categories::Entity)
                    .filter(categories::Column::Kind.eq(kind.as_str()))
                    .filter(owner_filter)
                    .order_by_asc(categories::Column::Name)
                    .order_by_asc(category_keywords::Column::Id)
                    .all(&db_tx)
                    .await?;
                for (keyword, category) in rows {
                    let Some(category) = category else { continue };
                    if needle.contains(&normalize_text(&keyword.word)) {
                        return Ok(Some(Category::try_from(category)?));
                    }
                }
            }
            Ok(None)
        })
    }

    /// Attach a keyword to a category resolved by exact name, user-owned
    /// first. Learning an already known pair is a no-op.
    pub async fn learn_keyword(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
        word: &str,
        category_name: &str,
    ) -> ResultEngine<()> {
        let word = normalize_text(&normalize_required_name(word, "keyword")?);
        let category_name = normalize_required_name(category_name, "category")?;

        with_tx!(self, |db_tx| {
            let category = resolve_category(&db_tx, telegram_id, kind, &category_name)
                .await?
                .ok_or(EngineError::KeyNotFound(category_name))?;

            let exists = category_keywords::Entity::find()
                .filter(category_keywords::Column::CategoryId.eq(category.id))
                .filter(category_keywords::Column::Word.eq(word.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                let active = category_keywords::ActiveModel {
                    category_id: ActiveValue::Set(category.id),
                    word: ActiveValue::Set(word),
                    ..Default::default()
                };
                active.insert(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Create a user-owned category unless one of that name is already
    /// visible for the kind.
    pub async fn add_category(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
        name: &str,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let visible = visible_categories(&db_tx, telegram_id, kind).await?;
            if visible.iter().any(|category| category.name == name) {
                return Err(EngineError::ExistingKey(name));
            }

            let active = categories::ActiveModel {
                name: ActiveValue::Set(name),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                owner_id: ActiveValue::Set(Some(telegram_id)),
                ..Default::default()
            };
            let model = active.insert(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Delete a user-owned category by name, with its keywords. Shared
    /// defaults cannot be deleted this way.
    pub async fn delete_category(&self, telegram_id: i64, name: &str) -> ResultEngine<()> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            let deleted = categories::Entity::delete_many()
                .filter(categories::Column::OwnerId.eq(telegram_id))
                .filter(categories::Column::Name.eq(name.clone()))
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(name));
            }
            Ok(())
        })
    }

    /// Delete all user-owned categories, counting per kind.
    pub async fn clear_categories(&self, telegram_id: i64) -> ResultEngine<ClearedCategories> {
        with_tx!(self, |db_tx| {
            let expenses = delete_owned(&db_tx, telegram_id, CategoryKind::Expense).await?;
            let incomes = delete_owned(&db_tx, telegram_id, CategoryKind::Income).await?;
            Ok(ClearedCategories { expenses, incomes })
        })
    }

    /// Every visible category of the kind with its learned keywords, shared
    /// defaults first. Categories without keywords are included.
    pub async fn keywords_by_category(
        &self,
        telegram_id: i64,
        kind: CategoryKind,
    ) -> ResultEngine<Vec<(Category, Vec<String>)>> {
        with_tx!(self, |db_tx| {
            let list = visible_categories(&db_tx, telegram_id, kind).await?;
            let mut result = Vec::with_capacity(list.len());
            for category in list {
                let words = category_keywords::Entity::find()
                    .filter(category_keywords::Column::CategoryId.eq(category.id))
                    .order_by_asc(category_keywords::Column::Id)
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(|model| model.word)
                    .collect();
                result.push((category, words));
            }
            Ok(result)
        })
    }
}

/// Defaults first, then user-owned, deduplicated by name.
async fn visible_categories(
    db_tx: &DatabaseTransaction,
    telegram_id: i64,
    kind: CategoryKind,
) -> ResultEngine<Vec<Category>> {
    let models = categories::Entity::find()
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .filter(
            Condition::any()
                .add(categories::Column::OwnerId.is_null())
                .add(categories::Column::OwnerId.eq(telegram_id)),
        )
        .order_by_asc(categories::Column::Id)
        .all(db_tx)
        .await?;

    let (defaults, owned): (Vec<_>, Vec<_>) =
        models.into_iter().partition(|model| model.owner_id.is_none());

    let mut seen = HashSet::new();
    let mut list = Vec::with_capacity(defaults.len() + owned.len());
    for model in defaults.into_iter().chain(owned) {
        let category = Category::try_from(model)?;
        if seen.insert(category.name.clone()) {
            list.push(category);
        }
    }
    Ok(list)
}

/// Exact-name lookup, user-owned block first.
async fn resolve_category(
    db_tx: &DatabaseTransaction,
    telegram_id: i64,
    kind: CategoryKind,
    name: &str,
) -> ResultEngine<Option<Category>> {
    for owner_filter in [
        categories::Column::OwnerId.eq(telegram_id),
        categories::Column::OwnerId.is_null(),
    ] {
        if let Some(model) = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(owner_filter)
            .filter(categories::Column::Name.eq(name))
            .one(db_tx)
            .await?
        {
            return Ok(Some(Category::try_from(model)?));
        }
    }
    Ok(None)
}

async fn delete_owned(
    db_tx: &DatabaseTransaction,
    telegram_id: i64,
    kind: CategoryKind,
) -> ResultEngine<u64> {
    let deleted = categories::Entity::delete_many()
        .filter(categories::Column::OwnerId.eq(telegram_id))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .exec(db_tx)
        .await?;
    Ok(deleted.rows_affected)
}
