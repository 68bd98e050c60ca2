//! Image-analysis payloads: the caller's request and the body sent upstream.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded caller request.
///
/// `model_key` stays a plain string here: an unknown key is a configuration
/// problem for the relay, not a malformed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub model_key: String,
    pub prompt: String,
    pub image_base64: String,
}

/// Why a request body could not be turned into an [`AnalysisRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The body is absent, not JSON, or not a JSON object.
    Malformed(String),
    /// One of the required fields is missing, null or empty.
    MissingFields,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Malformed(msg) => write!(f, "malformed body: {}", msg),
            PayloadError::MissingFields => f.write_str("missing required fields"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl AnalysisRequest {
    /// Parse a raw request body.
    ///
    /// A field counts as present only when it is a non-empty JSON string.
    pub fn from_body(body: Option<&str>) -> Result<Self, PayloadError> {
        let body =
            body.ok_or_else(|| PayloadError::Malformed("request body is empty".to_string()))?;

        let value: Value =
            serde_json::from_str(body).map_err(|e| PayloadError::Malformed(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| PayloadError::Malformed("expected a JSON object".to_string()))?;

        match (
            required_string(object, "model_key"),
            required_string(object, "prompt"),
            required_string(object, "image_base64"),
        ) {
            (Some(model_key), Some(prompt), Some(image_base64)) => Ok(Self {
                model_key,
                prompt,
                image_base64,
            }),
            _ => Err(PayloadError::MissingFields),
        }
    }

    /// Build the body sent to the inference endpoint.
    pub fn to_outbound(&self) -> OutboundPayload {
        OutboundPayload {
            inputs: OutboundInputs {
                prompt: self.prompt.clone(),
                image: self.image_base64.clone(),
            },
        }
    }
}

fn required_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Body POSTed to the inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub inputs: OutboundInputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundInputs {
    pub prompt: String,
    /// Base64-encoded image, forwarded untouched.
    pub image: String,
}
