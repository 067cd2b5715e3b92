//! HttpAnswerOracle -- concrete [`AnswerOracle`] over the RAG service's REST API.
//!
//! `POST {base}/ask` with `{sessionId, question}`; `GET {base}/health` for
//! liveness. Every failure is mapped onto [`OracleError`] so the exchange can
//! fall back without ever seeing a raw reqwest error.

use std::time::Duration;

use helpdesk_core::oracle::AnswerOracle;
use helpdesk_types::oracle::{AskRequest, AskResponse, OracleError};

/// Error bodies longer than this are cut before they reach a log line.
const MAX_ERROR_BODY: usize = 512;

pub struct HttpAnswerOracle {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAnswerOracle {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.timeout.as_millis() as u64)
        } else {
            OracleError::Transport(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OracleError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(OracleError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl AnswerOracle for HttpAnswerOracle {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, OracleError> {
        tracing::debug!(session_id = %request.session_id, "Asking oracle");

        let response = self
            .client
            .post(self.url("/ask"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response).await?;

        let value: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.send_error(e)
            } else {
                OracleError::Malformed(e.to_string())
            }
        })?;

        let answer = AskResponse::from_json(value)?;
        if answer.answer.trim().is_empty() {
            return Err(OracleError::EmptyAnswer);
        }
        Ok(answer)
    }

    async fn health(&self) -> Result<(), OracleError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }
}
