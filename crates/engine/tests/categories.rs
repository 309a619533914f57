use sea_orm::Database;

use engine::{CategoryKind, Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn defaults_are_seeded_and_sorted() {
    let engine = engine_with_db().await;

    let expenses = engine.categories(1, CategoryKind::Expense).await.unwrap();
    assert_eq!(expenses.len(), 16);
    assert!(expenses.iter().all(|c| c.is_default()));
    assert_eq!(expenses.first().map(|c| c.name.as_str()), Some("Авто"));
    assert!(expenses.iter().any(|c| c.name == "Питание"));

    let incomes = engine.categories(1, CategoryKind::Income).await.unwrap();
    assert_eq!(incomes.len(), 6);
    assert!(incomes.iter().any(|c| c.name == "Зарплата"));
}

#[tokio::test]
async fn learned_keyword_detects_by_substring() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    engine
        .learn_keyword(1, CategoryKind::Expense, "Еда", "Питание")
        .await
        .unwrap();

    let detected = engine
        .detect_category(1, CategoryKind::Expense, "ЕДА на ужин")
        .await
        .unwrap();
    assert_eq!(detected.map(|c| c.name), Some("Питание".to_string()));

    // unchanged category set keeps the answer stable
    let again = engine
        .detect_category(1, CategoryKind::Expense, "ЕДА на ужин")
        .await
        .unwrap();
    assert_eq!(again.map(|c| c.name), Some("Питание".to_string()));

    let none = engine
        .detect_category(1, CategoryKind::Expense, "совершенно неизвестное")
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn duplicate_learn_is_a_noop() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    engine
        .learn_keyword(1, CategoryKind::Expense, "еда", "Питание")
        .await
        .unwrap();
    engine
        .learn_keyword(1, CategoryKind::Expense, " ЕДА ", "Питание")
        .await
        .unwrap();

    let reference = engine
        .keywords_by_category(1, CategoryKind::Expense)
        .await
        .unwrap();
    let (_, words) = reference
        .iter()
        .find(|(category, _)| category.name == "Питание")
        .unwrap();
    assert_eq!(words, &vec!["еда".to_string()]);
}

#[tokio::test]
async fn learning_against_unknown_category_fails() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    let result = engine
        .learn_keyword(1, CategoryKind::Expense, "еда", "Несуществующая")
        .await;
    assert_eq!(
        result.unwrap_err(),
        EngineError::KeyNotFound("Несуществующая".to_string())
    );
}

#[tokio::test]
async fn user_category_wins_detection() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    engine
        .learn_keyword(1, CategoryKind::Expense, "такси", "Транспорт")
        .await
        .unwrap();
    engine
        .add_category(1, CategoryKind::Expense, "Командировки")
        .await
        .unwrap();
    engine
        .learn_keyword(1, CategoryKind::Expense, "такси", "Командировки")
        .await
        .unwrap();

    let detected = engine
        .detect_category(1, CategoryKind::Expense, "такси до аэропорта")
        .await
        .unwrap();
    assert_eq!(detected.map(|c| c.name), Some("Командировки".to_string()));

    // another user only sees the shared keyword
    let other = engine
        .detect_category(2, CategoryKind::Expense, "такси до аэропорта")
        .await
        .unwrap();
    assert_eq!(other.map(|c| c.name), Some("Транспорт".to_string()));
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    let result = engine.add_category(1, CategoryKind::Expense, "Питание").await;
    assert_eq!(
        result.unwrap_err(),
        EngineError::ExistingKey("Питание".to_string())
    );

    // the same name on the other side of the ledger is a different bucket
    engine
        .add_category(1, CategoryKind::Income, "Питание")
        .await
        .unwrap();
}

#[tokio::test]
async fn only_user_categories_can_be_deleted() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    let result = engine.delete_category(1, "Питание").await;
    assert_eq!(
        result.unwrap_err(),
        EngineError::KeyNotFound("Питание".to_string())
    );

    engine
        .add_category(1, CategoryKind::Expense, "Хобби")
        .await
        .unwrap();
    engine.delete_category(1, "Хобби").await.unwrap();

    let expenses = engine.categories(1, CategoryKind::Expense).await.unwrap();
    assert!(expenses.iter().all(|c| c.name != "Хобби"));
}

#[tokio::test]
async fn clear_counts_per_kind() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    engine
        .add_category(1, CategoryKind::Expense, "Хобби")
        .await
        .unwrap();
    engine
        .add_category(1, CategoryKind::Expense, "Ремонт")
        .await
        .unwrap();
    engine
        .add_category(1, CategoryKind::Income, "Фриланс")
        .await
        .unwrap();

    let cleared = engine.clear_categories(1).await.unwrap();
    assert_eq!(cleared.expenses, 2);
    assert_eq!(cleared.incomes, 1);

    let expenses = engine.categories(1, CategoryKind::Expense).await.unwrap();
    assert_eq!(expenses.len(), 16);
}

#[tokio::test]
async fn keyword_reference_lists_defaults_first() {
    let engine = engine_with_db().await;
    engine.register_user(1, None, None, None).await.unwrap();

    engine
        .add_category(1, CategoryKind::Expense, "Хобби")
        .await
        .unwrap();
    engine
        .learn_keyword(1, CategoryKind::Expense, "краски", "Хобби")
        .await
        .unwrap();

    let reference = engine
        .keywords_by_category(1, CategoryKind::Expense)
        .await
        .unwrap();
    assert_eq!(reference.len(), 17);
    assert!(reference.first().unwrap().0.is_default());

    let (own, words) = reference.last().unwrap();
    assert_eq!(own.name, "Хобби");
    assert_eq!(words, &vec!["краски".to_string()]);
}
