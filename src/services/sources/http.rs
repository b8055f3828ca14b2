/// HTTP candidate source
///
/// Issues a single GET against a configured endpoint and decodes the body through
/// `SourceEnvelope`, so both `{"videos": [...]}` and bare-array responses work.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    services::{adapter::SourceEnvelope, sources::CandidateSource},
};

#[derive(Clone)]
pub struct HttpSource {
    name: String,
    url: String,
    http_client: HttpClient,
}

impl HttpSource {
    /// Creates a source whose client gives up after `timeout`
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            name: name.into(),
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait::async_trait]
impl CandidateSource for HttpSource {
    async fn fetch(&self) -> AppResult<Vec<Value>> {
        let response = self.http_client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "{} returned status {}: {}",
                self.name, status, body
            )));
        }

        let response_text = response.text().await?;
        let envelope: SourceEnvelope = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(
                source = %self.name,
                error = %e,
                response = %response_text,
                "Failed to decode candidate response"
            );
            AppError::ExternalApi(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        let records = envelope.into_records();

        tracing::info!(
            source = %self.name,
            records = records.len(),
            "Candidates fetched"
        );

        Ok(records)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
