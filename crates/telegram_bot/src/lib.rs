//! Telegram bot.
//!
//! The bot is a thin front: it parses inbound messages, drives the
//! dialogue against the engine and sends the replies back. The ledgers
//! themselves live in the users' Google spreadsheets.

use std::sync::Arc;

use sheets::HttpSheets;
use teloxide::prelude::*;

mod commands;
mod dialogue;
mod handlers;
mod months;
mod parsing;
mod sync;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    engine: Arc<engine::Engine>,
    sheets: HttpSheets,
    service_email: String,
}

pub struct Bot {
    token: String,
    engine: Arc<engine::Engine>,
    sheets: HttpSheets,
    service_email: String,
}

impl Bot {
    pub fn new(
        token: &str,
        engine: Arc<engine::Engine>,
        sheets: HttpSheets,
        service_email: &str,
    ) -> Result<Self, String> {
        if token.is_empty() {
            return Err("telegram token is empty".to_string());
        }
        Ok(Self {
            token: token.to_string(),
            engine,
            sheets,
            service_email: service_email.to_string(),
        })
    }

    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let parameters = ConfigParameters {
            engine: self.engine.clone(),
            sheets: self.sheets.clone(),
            service_email: self.service_email.clone(),
        };

        let handler =
            dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default, Debug)]
pub struct BotBuilder {
    token: String,
    engine: Option<Arc<engine::Engine>>,
    sheets: Option<HttpSheets>,
    service_email: String,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn engine(mut self, engine: Arc<engine::Engine>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn sheets(mut self, sheets: HttpSheets) -> BotBuilder {
        self.sheets = Some(sheets);
        self
    }

    /// Shown to users in the sharing instructions for new spreadsheets.
    pub fn service_email(mut self, email: &str) -> BotBuilder {
        self.service_email = email.to_string();
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        let engine = self
            .engine
            .ok_or_else(|| "an engine is required".to_string())?;
        let sheets = self
            .sheets
            .ok_or_else(|| "a sheets client is required".to_string())?;
        Bot::new(&self.token, engine, sheets, &self.service_email)
    }
}
