//! The conversation itself, free of any Telegram transport.
//!
//! Every inbound message goes through [`Dialogue::handle`]: commands win
//! over whatever state is active, then the state handler runs, and text
//! that neither claims is read as a transaction line. Handlers return
//! [`Reply`] values; sending them is the caller's business, which keeps
//! the whole flow testable against an in-memory sheets client.

mod categories;
mod list;
mod spreadsheets;
mod transaction;


use chrono::NaiveDate;
use engine::{ConversationState, Engine, EngineError, UserSession};
use sheets::SheetsApi;

use crate::{
    commands::CommandLine,
    ui::{self, Reply},
};

/// Sender identity attached to a message, used by `/start` registration.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Profile<'a> {
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// One message's worth of conversation, bound to a clock value so that
/// "today" stays fixed while the message is being handled.
pub(crate) struct Dialogue<'a, S> {
    engine: &'a Engine,
    sheets: &'a S,
    service_email: &'a str,
    today: NaiveDate,
}

/// Commands that require a registered user.
const USER_COMMANDS: [&str; 8] = [
    "/add",
    "/list",
    "/list_tables",
    "/remove",
    "/categories",
    "/map",
    "/sync_categories",
    "/clear_categories",
];

impl<'a, S: SheetsApi> Dialogue<'a, S> {
    pub(crate) fn new(
        engine: &'a Engine,
        sheets: &'a S,
        service_email: &'a str,
        today: NaiveDate,
    ) -> Self {
        Self {
            engine,
            sheets,
            service_email,
            today,
        }
    }

    pub(crate) async fn handle(
        &self,
        chat_id: i64,
        profile: Profile<'_>,
        text: &str,
    ) -> Result<Vec<Reply>, EngineError> {
        let line = CommandLine::parse(text);
        let user = self.engine.user(chat_id).await?;

        if line.is_command()
            && let Some(replies) = self.try_command(chat_id, profile, user.as_ref(), &line).await?
        {
            return Ok(replies);
        }

        let Some(user) = user else {
            return Ok(vec![Reply::plain(ui::USE_START)]);
        };

        if let Some(state) = user.state
            && let Some(replies) = self.handle_state(&user, state, text).await?
        {
            return Ok(replies);
        }

        self.handle_transaction_text(&user, text).await
    }

    /// Returns `None` when the token matches no command, so the message
    /// falls through to the state and transaction handlers.
    async fn try_command(
        &self,
        chat_id: i64,
        profile: Profile<'_>,
        user: Option<&UserSession>,
        line: &CommandLine,
    ) -> Result<Option<Vec<Reply>>, EngineError> {
        let replies = match (line.command.as_str(), user) {
            ("/start", _) => self.start(chat_id, profile).await?,
            ("/help", _) => vec![Reply::plain(ui::HELP)],
            (command, None) if USER_COMMANDS.contains(&command) => {
                vec![Reply::plain(ui::PLEASE_START)]
            }
            ("/add", Some(user)) => self.begin_add(user).await?,
            ("/list", Some(user)) => self.begin_list(user, &line.args).await?,
            ("/list_tables", Some(user)) => self.list_tables(user).await?,
            ("/remove", Some(user)) => self.remove_command(user, &line.tail()).await?,
            ("/categories", Some(user)) => self.categories_menu(user).await?,
            ("/map", Some(user)) => self.map_command(user, &line.tail()).await?,
            ("/sync_categories", Some(user)) => self.sync_command(user).await?,
            ("/clear_categories", Some(user)) => self.clear_command(user).await?,
            _ => return Ok(None),
        };
        Ok(Some(replies))
    }

    /// Routes an active state to its handler. `None` means the handler did
    /// not claim the text and it should be read as a transaction line, with
    /// the state left as it is.
    async fn handle_state(
        &self,
        user: &UserSession,
        state: ConversationState,
        text: &str,
    ) -> Result<Option<Vec<Reply>>, EngineError> {
        let text = text.trim();
        match state {
            ConversationState::WaitingSpreadsheetId => {
                self.spreadsheet_id_step(user, text).await.map(Some)
            }
            ConversationState::WaitingSpreadsheetMonth => {
                self.spreadsheet_month_step(user, text).await.map(Some)
            }
            ConversationState::WaitingSpreadsheetToDelete => {
                self.spreadsheet_delete_step(user, text).await.map(Some)
            }
            ConversationState::WaitingCategoriesAction => {
                self.categories_action_step(user, text).await.map(Some)
            }
            ConversationState::WaitingCategoryType => {
                self.category_type_step(user, text).await.map(Some)
            }
            ConversationState::WaitingNewCategoryName => {
                self.new_category_step(user, text).await.map(Some)
            }
            ConversationState::WaitingCategoryToDelete => {
                self.delete_category_step(user, text).await.map(Some)
            }
            ConversationState::WaitingCategorySelection => {
                self.category_selection_step(user, text).await.map(Some)
            }
            ConversationState::WaitingCategoryMapping => {
                self.category_mapping_step(user, text).await.map(Some)
            }
            ConversationState::WaitingListAction => self.list_action_step(user, text).await,
            ConversationState::WaitingListPage => self.list_page_step(user, text).await,
        }
    }

    async fn start(&self, chat_id: i64, profile: Profile<'_>) -> Result<Vec<Reply>, EngineError> {
        self.engine
            .register_user(
                chat_id,
                profile.username,
                profile.first_name,
                profile.last_name,
            )
            .await?;
        Ok(vec![Reply::plain(ui::GREETING)])
    }

    /// A flow lost its scratch data, usually after a competing update.
    /// Reset and ask the user to start over.
    async fn corrupted_flow(&self, user: &UserSession) -> Result<Vec<Reply>, EngineError> {
        tracing::warn!(
            user = user.telegram_id,
            state = ?user.state,
            "conversation state without its scratch data, resetting"
        );
        self.engine.clear_state(user).await?;
        Ok(vec![Reply::plain(ui::INTERNAL_ERROR)])
    }
}
