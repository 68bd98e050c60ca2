//! Hugging Face inference endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::value::RawValue;
use vision_relay_common::OutboundPayload;

use super::InferenceApi;
use crate::config::UpstreamTarget;
use crate::error::{Error, Result};

/// Client for dedicated Hugging Face inference endpoints.
///
/// Holds only the connection pool; the URL, token and timeout come with
/// each call.
#[derive(Clone, Default)]
pub struct HuggingFaceClient {
    http_client: Client,
}

impl HuggingFaceClient {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::UpstreamTimeout
    } else {
        Error::upstream(e.to_string())
    }
}

#[async_trait]
impl InferenceApi for HuggingFaceClient {
    fn api_type(&self) -> &'static str {
        "huggingface"
    }

    async fn analyze(
        &self,
        target: &UpstreamTarget,
        payload: &OutboundPayload,
        timeout: Duration,
    ) -> Result<Box<RawValue>> {
        tracing::debug!("Sending analysis request to {} (timeout {:?})", target.url, timeout);

        let response = self
            .http_client
            .post(&target.url)
            .bearer_auth(&target.token)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        tracing::info!(status = %status.as_u16(), "Upstream responded");

        if status.is_client_error() || status.is_server_error() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) if e.is_timeout() => return Err(map_reqwest_error(e)),
                Err(_) => String::new(),
            };
            return Err(Error::Upstream {
                message: format!("HTTP status {} for url {}", status, target.url),
                details: (!body.is_empty()).then_some(body),
            });
        }

        let body = response.text().await.map_err(map_reqwest_error)?;

        serde_json::from_str::<Box<RawValue>>(&body).map_err(|e| Error::Upstream {
            message: format!("invalid JSON in response: {}", e),
            details: Some(body.clone()),
        })
    }
}
