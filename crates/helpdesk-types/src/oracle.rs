//! Wire types and errors for the Answer Oracle.
//!
//! The oracle is an external HTTP service: `POST <base>/ask` with
//! `{sessionId, question}` returns an answer. Older deployments return a
//! bare JSON string instead of an object, so [`AskResponse`] accepts both.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Request body sent to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub session_id: Uuid,
    pub question: String,
}

/// A retrieved passage the oracle based its answer on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Parsed oracle answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub citations: Option<String>,
    #[serde(default)]
    pub route: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceChunk>,
}

impl AskResponse {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }

    /// Parse either `{"answer": ...}` or a bare JSON string.
    pub fn from_json(value: serde_json::Value) -> Result<Self, OracleError> {
        match value {
            serde_json::Value::String(answer) => Ok(Self::text(answer)),
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| OracleError::Malformed(e.to_string())),
            other => Err(OracleError::Malformed(format!(
                "expected object or string, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Non-empty citation text, if any.
    pub fn citations(&self) -> Option<&str> {
        self.citations
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Ways an oracle call can fail. All of them end in the fallback reply.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("empty answer")]
    EmptyAnswer,
}

impl OracleError {
    /// Short, log-friendly label for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Transport(_) => "transport",
            OracleError::Timeout(_) => "timeout",
            OracleError::Status { .. } => "status",
            OracleError::Malformed(_) => "malformed",
            OracleError::EmptyAnswer => "empty",
        }
    }
}
