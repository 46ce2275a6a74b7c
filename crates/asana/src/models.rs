//! Asana API response envelopes.
//!
//! Every Asana response wraps its payload in `data`; list endpoints add a
//! `next_page` cursor when more results are available.

use serde::Deserialize;

/// Single-resource response wrapper.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    /// Response data.
    pub data: T,
}

/// Paginated list response wrapper.
#[derive(Debug, Deserialize)]
pub struct PageEnvelope<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Cursor for the next page, `null` on the last page.
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

/// Pagination cursor.
#[derive(Debug, Deserialize)]
pub struct NextPage {
    /// Opaque offset token to pass back as `offset`.
    pub offset: String,
}

/// Error response body.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable message.
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Join all error messages, falling back to the raw body.
    pub fn message_or(body: &str) -> String {
        let messages: Vec<String> = serde_json::from_str::<Self>(body)
            .map(|env| env.errors.into_iter().filter_map(|e| e.message).collect())
            .unwrap_or_default();

        if messages.is_empty() {
            body.to_string()
        } else {
            messages.join("; ")
        }
    }
}
