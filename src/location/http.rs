//! Outbound HTTP for adapters.
//!
//! `ureq` is blocking, so every request runs on Tokio's blocking pool and the
//! calling task suspends on the join handle.

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed body: {0}")]
    Body(String),
    #[error("blocking worker failed: {0}")]
    Worker(String),
}

/// Shared HTTP client. Cloning is cheap (`ureq::Agent` is reference counted).
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T>(&self, url: String) -> Result<T, HttpError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.get_json_with_query(url, Vec::new()).await
    }

    /// GET `url` with percent-encoded query parameters appended.
    pub async fn get_json_with_query<T>(
        &self,
        url: String,
        query: Vec<(&'static str, String)>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || fetch_json_sync(&agent, &url, &query))
            .await
            .map_err(|e| HttpError::Worker(e.to_string()))?
    }
}

fn fetch_json_sync<T: DeserializeOwned>(
    agent: &ureq::Agent,
    url: &str,
    query: &[(&'static str, String)],
) -> Result<T, HttpError> {
    let request = query
        .iter()
        .fold(agent.get(url), |req, (name, value)| req.query(name, value));
    let response = request.call().map_err(|e| match e {
        ureq::Error::Status(code, _) => HttpError::Status(code),
        ureq::Error::Transport(t) => HttpError::Transport(t.to_string()),
    })?;

    response
        .into_json()
        .map_err(|e| HttpError::Body(e.to_string()))
}
