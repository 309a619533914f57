//! Domain core of the bot: users with their conversation state, expense and
//! income categories, learned keywords and per-month spreadsheet bindings,
//! all persisted through `sea-orm`.
//!
//! The engine owns storage and classification only. Talking to Telegram and
//! to the Google Sheets API happens in the crates sitting on top of it.

pub use categories::{Category, CategoryKind};
pub use conversation::{ConversationState, ListFilter, TempData, TransactionDraft};
pub use error::EngineError;
pub use ops::{ClearedCategories, Engine, EngineBuilder};
pub use user_spreadsheets::SpreadsheetBinding;
pub use users::UserSession;

mod categories;
mod category_keywords;
mod conversation;
mod error;
mod ops;
mod user_spreadsheets;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
