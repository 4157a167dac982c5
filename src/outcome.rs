//! Uniform operation results
//!
//! Every engine operation can be rendered as a success flag, an optional
//! payload and a human-readable comment. Error details never go in the payload.

use serde::Serialize;

use crate::error::{EngineError, ErrorKind};

/// Tri-part result handed to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub comment: String,
    /// Error classification, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with(data, "ok")
    }

    pub fn ok_with(data: T, comment: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            comment: comment.into(),
            kind: None,
        }
    }

    pub fn failed(error: &EngineError) -> Self {
        Self {
            success: false,
            data: None,
            comment: error.to_string(),
            kind: Some(error.kind()),
        }
    }

    /// True when the failure only means there was nothing to return
    pub fn is_empty_result(&self) -> bool {
        self.kind == Some(ErrorKind::Empty)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            success: self.success,
            data: self.data.map(f),
            comment: self.comment,
            kind: self.kind,
        }
    }
}

impl<T> From<Result<T, EngineError>> for Outcome<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(data) => Outcome::ok(data),
            Err(error) => Outcome::failed(&error),
        }
    }
}
