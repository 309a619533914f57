use chrono::NaiveDate;
use sea_orm::Database;

use engine::{ConversationState, Engine, EngineError, TempData, TransactionDraft};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn unknown_user_is_none() {
    let engine = engine_with_db().await;

    assert_eq!(engine.user(42).await.unwrap(), None);
}

#[tokio::test]
async fn register_is_idempotent_and_keeps_state() {
    let engine = engine_with_db().await;

    let session = engine
        .register_user(1, Some("alice"), Some("Alice"), None)
        .await
        .unwrap();
    assert!(session.is_idle());

    let session = engine
        .set_state(&session, Some(ConversationState::WaitingListAction), None)
        .await
        .unwrap();
    assert!(!session.is_idle());

    // second /start refreshes the profile but must not reset the flow
    engine
        .register_user(1, Some("alice_new"), Some("Alice"), None)
        .await
        .unwrap();
    let reloaded = engine.user(1).await.unwrap().unwrap();
    assert_eq!(
        reloaded.state,
        Some(ConversationState::WaitingListAction)
    );
}

#[tokio::test]
async fn state_and_scratch_survive_reload() {
    let engine = engine_with_db().await;

    let session = engine.register_user(7, None, None, None).await.unwrap();
    let draft = TempData::Pending(TransactionDraft {
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        amount: 1500.0,
        description: "такси".to_string(),
        is_income: false,
    });
    engine
        .set_state(
            &session,
            Some(ConversationState::WaitingCategorySelection),
            Some(draft.clone()),
        )
        .await
        .unwrap();

    let reloaded = engine.user(7).await.unwrap().unwrap();
    assert_eq!(
        reloaded.state,
        Some(ConversationState::WaitingCategorySelection)
    );
    assert_eq!(reloaded.temp_data, Some(draft));
}

#[tokio::test]
async fn stale_session_cannot_write() {
    let engine = engine_with_db().await;

    let session = engine.register_user(9, None, None, None).await.unwrap();
    engine
        .set_state(&session, Some(ConversationState::WaitingSpreadsheetId), None)
        .await
        .unwrap();

    // the same loaded session again: its version lost the race
    let result = engine
        .set_state(&session, Some(ConversationState::WaitingListAction), None)
        .await;
    assert_eq!(result.unwrap_err(), EngineError::StaleState(9));

    // the first write stands
    let reloaded = engine.user(9).await.unwrap().unwrap();
    assert_eq!(
        reloaded.state,
        Some(ConversationState::WaitingSpreadsheetId)
    );
}

#[tokio::test]
async fn clear_state_goes_back_to_idle() {
    let engine = engine_with_db().await;

    let session = engine.register_user(3, None, None, None).await.unwrap();
    let session = engine
        .set_state(
            &session,
            Some(ConversationState::WaitingCategoriesAction),
            None,
        )
        .await
        .unwrap();
    engine.clear_state(&session).await.unwrap();

    let reloaded = engine.user(3).await.unwrap().unwrap();
    assert!(reloaded.is_idle());
    assert_eq!(reloaded.temp_data, None);
}
