use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kopilka={level},telegram_bot={level},engine={level},sheets={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(telegram) = settings.telegram {
        let database = settings.database;
        tasks.spawn(async move {
            tracing::info!("Found telegram settings...");
            let db = match parse_database(&database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder().database(db).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };

            let sheets = match sheets::HttpSheets::new(&telegram.sheets_token) {
                Ok(sheets) => sheets,
                Err(err) => {
                    tracing::error!("failed to initialize sheets client: {err}");
                    return;
                }
            };

            match telegram_bot::Bot::builder()
                .token(&telegram.token)
                .engine(std::sync::Arc::new(engine))
                .sheets(sheets)
                .service_email(&telegram.service_email)
                .build()
            {
                Ok(bot) => bot.run().await,
                Err(err) => tracing::error!("failed to initialize telegram bot: {err}"),
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
