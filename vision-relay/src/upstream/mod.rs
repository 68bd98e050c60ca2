//! Upstream inference API abstraction.
//!
//! The handler talks to the hosted model through the `InferenceApi` trait so
//! tests and alternative hosts can stand in for the real endpoint.

mod huggingface;

pub use huggingface::HuggingFaceClient;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::value::RawValue;
use vision_relay_common::OutboundPayload;

use crate::config::UpstreamTarget;
use crate::error::Result;

/// A remote image-to-text inference API.
#[async_trait]
pub trait InferenceApi: Send + Sync {
    /// Short identifier used in logs (e.g., "huggingface").
    fn api_type(&self) -> &'static str;

    /// Send one analysis request and return the upstream JSON body untouched.
    ///
    /// Implementations must give up once `timeout` elapses and report
    /// `Error::UpstreamTimeout`.
    async fn analyze(
        &self,
        target: &UpstreamTarget,
        payload: &OutboundPayload,
        timeout: Duration,
    ) -> Result<Box<RawValue>>;
}
