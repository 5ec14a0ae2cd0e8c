//! Construction and configuration errors
//!
//! Navigation itself never fails: rejected requests are reported as
//! [`crate::nav::IgnoreReason`] values. These errors only surface while
//! building the site or wiring it to the page.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("site needs at least one section")]
    NoSections,

    #[error("section id `{0}` appears more than once")]
    DuplicateSection(String),

    #[error("invalid colour `{0}` (expected #rrggbb or #rgb)")]
    InvalidColor(String),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: String,
    },

    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing browser object or element (wasm only)
    #[error("dom: {0}")]
    Dom(String),
}

pub type SiteResult<T> = Result<T, SiteError>;
