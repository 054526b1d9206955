//! HTTP exchange client
//!
//! Concrete `AgentExchange` over reqwest, speaking the backend's REST
//! surface. A non-success status code becomes `ExchangeError::Status`, so
//! callers see the same shape for a 500 as for a refused connection.

use async_trait::async_trait;
use reqwest::multipart;

use bz_core::config::ClientConfig;
use bz_core::error::ExchangeError;
use bz_core::traits::AgentExchange;
use bz_protocol::{HealthResponse, QueryRequest, QueryResponse, ResetResponse, UploadResponse};

/// Talks to the assistant backend over HTTP
pub struct HttpExchange {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExchange {
    /// Build an exchange client from configuration.
    ///
    /// The exchange timeout, when configured, applies to every request;
    /// without one a hung request blocks its operation indefinitely.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ExchangeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.exchange_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a response to its JSON body, or to `Status` on a non-success code
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ExchangeError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ExchangeError::Status(status.as_u16()));
    }
    Ok(response.json().await?)
}

#[async_trait]
impl AgentExchange for HttpExchange {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadResponse, ExchangeError> {
        tracing::debug!(filename, size = bytes.len(), "Uploading image");
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("image", part);
        let response = self
            .client
            .post(self.endpoint("/upload_image"))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, ExchangeError> {
        tracing::debug!(has_image = request.image.is_some(), "Submitting query");
        let response = self
            .client
            .post(self.endpoint("/agent"))
            .json(&request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn reset(&self) -> Result<ResetResponse, ExchangeError> {
        tracing::debug!("Requesting conversation reset");
        let response = self
            .client
            .post(self.endpoint("/reset_conversation"))
            .send()
            .await?;
        read_json(response).await
    }

    async fn health(&self) -> Result<HealthResponse, ExchangeError> {
        let response = self.client.get(self.endpoint("/health")).send().await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            server_url: "http://localhost:8000/".into(),
            ..Default::default()
        };
        let exchange = HttpExchange::from_config(&config).unwrap();
        assert_eq!(exchange.endpoint("/agent"), "http://localhost:8000/agent");
    }
}
