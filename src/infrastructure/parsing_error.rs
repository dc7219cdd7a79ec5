//! Parsing error types for catalog listing pages
//!
//! Only structural failures are errors. A listing block with a missing name,
//! price or photo still yields an item with empty fields.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No listing blocks matching '{selector}' found on page")]
    NoListingBlocks { selector: String },

    #[error("Pagination present but last page number unreadable: '{text}'")]
    InvalidPagination { text: String },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
