//! The relay request handler.
//!
//! One call to [`RequestHandler::handle`] is one invocation: validate the
//! request, resolve configuration, call the inference API once, and turn the
//! outcome into a [`HandlerResponse`]. Failures never escape as errors.

use std::sync::Arc;
use std::time::Duration;

use serde_json::value::RawValue;
use tracing::Instrument;
use uuid::Uuid;
use vision_relay_common::{AnalysisRequest, HandlerResponse, IncomingRequest, PayloadError};

use crate::config::{CorsConfig, EnvSource, ProcessEnv, Settings, UpstreamConfig};
use crate::error::{Error, Result};
use crate::upstream::{HuggingFaceClient, InferenceApi};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Stateless handler shared by every invocation.
#[derive(Clone)]
pub struct RequestHandler {
    api: Arc<dyn InferenceApi>,
    env: Arc<dyn EnvSource>,
    timeout: Duration,
    cors: CorsConfig,
}

impl RequestHandler {
    pub fn new(
        api: Arc<dyn InferenceApi>,
        env: Arc<dyn EnvSource>,
        timeout: Duration,
        cors: CorsConfig,
    ) -> Self {
        Self {
            api,
            env,
            timeout,
            cors,
        }
    }

    /// Handler backed by the Hugging Face client and the process environment.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(HuggingFaceClient::new()),
            Arc::new(ProcessEnv),
            settings.upstream.timeout(),
            settings.cors.clone(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one invocation.
    pub async fn handle(&self, request: &IncomingRequest) -> HandlerResponse {
        let span = tracing::info_span!(
            "invocation",
            id = %Uuid::new_v4(),
            method = %request.http_method,
        );

        async {
            match self.process(request).await {
                Ok(body) => {
                    tracing::info!("Analysis completed");
                    self.respond(200, body.get().to_string())
                }
                Err(e) => self.reject(e),
            }
        }
        .instrument(span)
        .await
    }

    /// Turn a failure into the JSON error response for the caller.
    pub fn reject(&self, e: Error) -> HandlerResponse {
        let kind = e.kind();
        if kind.status().is_server_error() {
            tracing::error!(kind = kind.as_str(), "Invocation failed: {}", e);
        } else {
            tracing::warn!(kind = kind.as_str(), "Request rejected: {}", e);
        }
        self.respond(e.status().as_u16(), e.to_body().to_string())
    }

    async fn process(&self, request: &IncomingRequest) -> Result<Box<RawValue>> {
        tracing::info!("Received {} request", request.http_method);

        if request.http_method != "POST" {
            return Err(Error::MethodNotAllowed);
        }

        let analysis = AnalysisRequest::from_body(request.body.as_deref()).map_err(|e| match e {
            PayloadError::MissingFields => Error::MissingFields,
            PayloadError::Malformed(msg) => Error::Internal(msg),
        })?;

        let upstream = UpstreamConfig::from_source(self.env.as_ref());
        let target = upstream.resolve(&analysis.model_key)?;
        tracing::info!(
            model = %target.model,
            endpoint = %target.url,
            api = self.api.api_type(),
            "Model selected"
        );

        let payload = analysis.to_outbound();
        self.api.analyze(&target, &payload, self.timeout).await
    }

    fn respond(&self, status_code: u16, body: String) -> HandlerResponse {
        let response =
            HandlerResponse::new(status_code, body).with_header("Content-Type", CONTENT_TYPE_JSON);
        match self.cors.allow_origin() {
            Some(origin) => response.with_header("Access-Control-Allow-Origin", origin),
            None => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use vision_relay_common::OutboundPayload;

    use super::*;
    use crate::config::UpstreamTarget;

    /// Records calls and replies with a fixed outcome.
    struct StubApi {
        calls: AtomicUsize,
        reply: fn() -> Result<Box<RawValue>>,
    }

    impl StubApi {
        fn new(reply: fn() -> Result<Box<RawValue>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply,
            })
        }
    }

    #[async_trait]
    impl InferenceApi for StubApi {
        fn api_type(&self) -> &'static str {
            "stub"
        }

        async fn analyze(
            &self,
            _target: &UpstreamTarget,
            _payload: &OutboundPayload,
            _timeout: Duration,
        ) -> Result<Box<RawValue>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn ok_reply() -> Result<Box<RawValue>> {
        Ok(RawValue::from_string(r#"{"text":"ok"}"#.to_string()).unwrap())
    }

    fn full_env() -> Arc<HashMap<String, String>> {
        Arc::new(
            [
                ("HF_TOKEN", "hf_test"),
                ("ENDPOINT_URL_4B", "http://small.invalid"),
                ("ENDPOINT_URL_27B", "http://large.invalid"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        )
    }

    fn handler(
        api: Arc<StubApi>,
        env: Arc<HashMap<String, String>>,
        cors: CorsConfig,
    ) -> RequestHandler {
        RequestHandler::new(api, env, Duration::from_secs(1), cors)
    }

    const VALID_BODY: &str = r#"{"model_key":"4b","prompt":"Describe","image_base64":"aGVsbG8="}"#;

    #[tokio::test]
    async fn test_rejects_non_post_without_calling_upstream() {
        let api = StubApi::new(ok_reply);
        let handler = handler(api.clone(), full_env(), CorsConfig::default());

        for method in ["GET", "PUT", "DELETE", "OPTIONS", "post"] {
            let response = handler
                .handle(&IncomingRequest::new(method, Some(VALID_BODY.to_string())))
                .await;
            assert_eq!(response.status_code, 405, "method {}", method);
            assert_eq!(response.body, r#"{"error":"Method Not Allowed"}"#);
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_passes_body_through() {
        let api = StubApi::new(ok_reply);
        let handler = handler(api.clone(), full_env(), CorsConfig::default());

        let response = handler.handle(&IncomingRequest::post(VALID_BODY)).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"text":"ok"}"#);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cors_header_omitted_when_disabled() {
        let handler = handler(StubApi::new(ok_reply), full_env(), CorsConfig::disabled());

        let response = handler.handle(&IncomingRequest::post(VALID_BODY)).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Access-Control-Allow-Origin"), None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_internal_error() {
        let handler = handler(StubApi::new(ok_reply), full_env(), CorsConfig::default());

        let response = handler.handle(&IncomingRequest::post("{not json")).await;
        assert_eq!(response.status_code, 500);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Ocorreu um erro interno: "));

        let response = handler.handle(&IncomingRequest::new("POST", None)).await;
        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn test_missing_configuration_skips_upstream() {
        let api = StubApi::new(ok_reply);
        let handler = handler(api.clone(), Arc::new(HashMap::new()), CorsConfig::default());

        let response = handler.handle(&IncomingRequest::post(VALID_BODY)).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body,
            r#"{"error":"Variáveis de ambiente não configuradas no Netlify."}"#
        );
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_errors_map_to_gateway_statuses() {
        let timeout = handler(
            StubApi::new(|| Err(Error::UpstreamTimeout)),
            full_env(),
            CorsConfig::default(),
        );
        let response = timeout.handle(&IncomingRequest::post(VALID_BODY)).await;
        assert_eq!(response.status_code, 504);

        let failed = handler(
            StubApi::new(|| Err(Error::upstream("connection reset"))),
            full_env(),
            CorsConfig::default(),
        );
        let response = failed.handle(&IncomingRequest::post(VALID_BODY)).await;
        assert_eq!(response.status_code, 502);
    }
}
