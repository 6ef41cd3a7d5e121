//! Structured error types for form rendering and local state.
//!
//! Most failures in this crate are deliberately non-fatal: storage problems
//! turn into a [`SaveStatus`](crate::storage::SaveStatus), a broken signature
//! turns into a blank signature line. The variants below are what is left
//! when a caller actually has to decide something.

use thiserror::Error;

/// The unified error type returned by the public API.
#[derive(Debug, Error)]
pub enum FormsError {
    /// JSON input failed to parse as a record, draft or stored value.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// The form kind is not one of the four known variants.
    #[error("Unknown form kind: {0}")]
    UnknownFormKind(String),
    /// A theme name that is not `light`, `dark` or `high-contrast`.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
    /// A record violates one of its structural invariants.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// The local key/value store could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Clipboard or share sheet unavailable.
    #[error("Clipboard error: {0}")]
    ClipboardError(String),
    /// An image could not be decoded or produced.
    #[error("Image error: {0}")]
    ImageError(String),
    /// Raster capture could not be paginated.
    #[error("Capture error: {0}")]
    CaptureError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FormsError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the evaluation record schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FormsError::ParseError { source: e, hint }
    }
}
