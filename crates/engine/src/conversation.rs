//! Conversation states and the typed scratch data that travels with them.
//!
//! A state names the step of a multi-message flow the user is in; the
//! scratch payload carries what the flow has collected so far. Both are
//! persisted on the user row between messages, so every inbound message is
//! handled against durable state rather than in-memory continuation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryKind;

/// Steps of the multi-message flows, persisted by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversationState {
    /// `/add` asked for a spreadsheet link or id.
    WaitingSpreadsheetId,
    /// The id checked out; asked for "Месяц Год".
    WaitingSpreadsheetMonth,
    /// `/remove` asked which binding to drop.
    WaitingSpreadsheetToDelete,
    /// `/categories` showed the four-action menu.
    WaitingCategoriesAction,
    /// Adding a category: asked for Расходы or Доходы.
    WaitingCategoryType,
    /// Adding a category: asked for its name.
    WaitingNewCategoryName,
    /// Deleting a category: asked for its name.
    WaitingCategoryToDelete,
    /// A transaction could not be classified; asked to pick a category.
    WaitingCategorySelection,
    /// Asked for a "слово = категория" mapping.
    WaitingCategoryMapping,
    /// `/list` asked for Расходы or Доходы.
    WaitingListAction,
    /// Paging through a rendered transaction list.
    WaitingListPage,
}

impl ConversationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitingSpreadsheetId => "WAITING_SPREADSHEET_ID",
            Self::WaitingSpreadsheetMonth => "WAITING_SPREADSHEET_MONTH",
            Self::WaitingSpreadsheetToDelete => "WAITING_SPREADSHEET_TO_DELETE",
            Self::WaitingCategoriesAction => "WAITING_CATEGORIES_ACTION",
            Self::WaitingCategoryType => "WAITING_CATEGORY_TYPE",
            Self::WaitingNewCategoryName => "WAITING_NEW_CATEGORY_NAME",
            Self::WaitingCategoryToDelete => "WAITING_CATEGORY_TO_DELETE",
            Self::WaitingCategorySelection => "WAITING_CATEGORY_SELECTION",
            Self::WaitingCategoryMapping => "WAITING_CATEGORY_MAPPING",
            Self::WaitingListAction => "WAITING_LIST_ACTION",
            Self::WaitingListPage => "WAITING_LIST_PAGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "WAITING_SPREADSHEET_ID" => Some(Self::WaitingSpreadsheetId),
            "WAITING_SPREADSHEET_MONTH" => Some(Self::WaitingSpreadsheetMonth),
            "WAITING_SPREADSHEET_TO_DELETE" => Some(Self::WaitingSpreadsheetToDelete),
            "WAITING_CATEGORIES_ACTION" => Some(Self::WaitingCategoriesAction),
            "WAITING_CATEGORY_TYPE" => Some(Self::WaitingCategoryType),
            "WAITING_NEW_CATEGORY_NAME" => Some(Self::WaitingNewCategoryName),
            "WAITING_CATEGORY_TO_DELETE" => Some(Self::WaitingCategoryToDelete),
            "WAITING_CATEGORY_SELECTION" => Some(Self::WaitingCategorySelection),
            "WAITING_CATEGORY_MAPPING" => Some(Self::WaitingCategoryMapping),
            "WAITING_LIST_ACTION" => Some(Self::WaitingListAction),
            "WAITING_LIST_PAGE" => Some(Self::WaitingListPage),
            _ => None,
        }
    }
}

/// Scratch data carried between the messages of one flow. Persisted as
/// tagged JSON in `temp_data`; `None` is stored as `"{}"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TempData {
    /// Validated spreadsheet id waiting for its month.
    SpreadsheetDraft { spreadsheet_id: String },
    /// Parsed transaction waiting for a category.
    Pending(TransactionDraft),
    /// Selection for the listing flow.
    List(ListFilter),
    /// Kind chosen for a category being added.
    CategoryDraft { kind: CategoryKind },
}

/// A parsed transaction line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub is_income: bool,
}

impl TransactionDraft {
    pub const fn kind(&self) -> CategoryKind {
        if self.is_income {
            CategoryKind::Income
        } else {
            CategoryKind::Expense
        }
    }
}

/// What `/list` is looking at: one bound month plus, once chosen, the
/// transaction kind and the page being shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    pub spreadsheet_id: String,
    pub month: u32,
    pub year: i32,
    pub kind: Option<CategoryKind>,
    pub page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_round_trip() {
        let states = [
            ConversationState::WaitingSpreadsheetId,
            ConversationState::WaitingSpreadsheetMonth,
            ConversationState::WaitingSpreadsheetToDelete,
            ConversationState::WaitingCategoriesAction,
            ConversationState::WaitingCategoryType,
            ConversationState::WaitingNewCategoryName,
            ConversationState::WaitingCategoryToDelete,
            ConversationState::WaitingCategorySelection,
            ConversationState::WaitingCategoryMapping,
            ConversationState::WaitingListAction,
            ConversationState::WaitingListPage,
        ];
        for state in states {
            assert_eq!(ConversationState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ConversationState::parse("WAITING_SOMETHING_ELSE"), None);
        assert_eq!(ConversationState::parse(""), None);
    }

    #[test]
    fn scratch_data_keeps_its_tag() {
        let draft = TempData::Pending(TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 1500.0,
            description: "такси".to_string(),
            is_income: false,
        });

        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("\"type\":\"pending\""));
        assert_eq!(serde_json::from_str::<TempData>(&json).unwrap(), draft);
    }

    #[test]
    fn kind_follows_the_income_flag() {
        let mut draft = TransactionDraft {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            amount: 10.0,
            description: "x".to_string(),
            is_income: false,
        };
        assert_eq!(draft.kind(), CategoryKind::Expense);
        draft.is_income = true;
        assert_eq!(draft.kind(), CategoryKind::Income);
    }
}
