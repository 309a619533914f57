//! Internal helpers for text normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Lowercased NFC form used for keyword and description comparison. NFC
/// keeps Cyrillic letters with combining marks (й, ё) intact.
pub(crate) fn normalize_text(value: &str) -> String {
    value.trim().nfc().collect::<String>().to_lowercase()
}

/// Trim a user-supplied name and reject empty input.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
