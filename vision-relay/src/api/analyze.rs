//! Image analysis endpoint.
//!
//! Every method is routed to the handler so that non-POST requests get the
//! same JSON 405 body a serverless invocation would.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use vision_relay_common::{HandlerResponse, IncomingRequest};

use crate::error::Error;
use crate::state::AppState;

/// Path the relay was originally deployed under as a Netlify function.
pub const LEGACY_FUNCTION_PATH: &str = "/.netlify/functions/analise_ia";

/// Build the analysis router (nested under `/v1`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analyze", any(analyze))
}

/// Routes kept for clients of the original function path.
pub fn legacy_router() -> Router<Arc<AppState>> {
    Router::new().route(LEGACY_FUNCTION_PATH, any(analyze))
}

/// ANY /v1/analyze - relay an image-analysis request.
async fn analyze(State(state): State<Arc<AppState>>, method: Method, body: Bytes) -> Response {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(text) => (!text.is_empty()).then_some(text),
        Err(e) if method == Method::POST => {
            let error = Error::Internal(format!("request body is not valid UTF-8: {}", e));
            return into_http_response(state.handler.reject(error));
        }
        // Body is never read for other methods; they get the 405.
        Err(_) => None,
    };

    let response = state
        .handler
        .handle(&IncomingRequest::new(method.as_str(), body))
        .await;

    into_http_response(response)
}

/// Convert a handler response into an axum response.
pub fn into_http_response(response: HandlerResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http_response = (status, response.body).into_response();

    let headers = http_response.headers_mut();
    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Dropping invalid response header {}", name),
        }
    }

    http_response
}
