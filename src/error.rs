//! Request-level errors.
//!
//! Each variant's `Display` output is the exact line sent back to the
//! device, so the connection handler can write `err.to_string()` as is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    /// The request line is not valid JSON.
    #[error("Error: Invalid JSON format - {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Well-formed JSON that lacks a required field.
    #[error("Error: Missing field in data: {0}")]
    MissingField(&'static str),

    /// A recognized field with a value of the wrong type.
    #[error("Error: Invalid value for field '{field}': {detail}")]
    InvalidField { field: &'static str, detail: String },

    /// JSON that matches none of the known request shapes.
    #[error("Error: Unknown message format. Expected 'user_message' or BP data.")]
    UnknownFormat,

    #[error("Error processing request: {0}")]
    Internal(String),
}
