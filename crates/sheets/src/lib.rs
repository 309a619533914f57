//! Google Sheets access.
//!
//! [`SheetsApi`] is the narrow slice of the values API the bot needs;
//! [`HttpSheets`] implements it over REST. The [`ledger`] module owns the
//! fixed layout of the spreadsheet template every bound table is copied from.

mod api;
pub mod ledger;

pub use api::{HttpSheets, SheetsApi, SheetsError};
