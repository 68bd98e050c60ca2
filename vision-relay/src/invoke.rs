//! One-shot invocation: read an event from a reader, write the response.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use vision_relay_common::IncomingRequest;

use crate::handler::RequestHandler;

/// Read one `IncomingRequest` JSON document, run it, and write the
/// `HandlerResponse` JSON followed by a newline.
pub async fn run<R, W>(handler: &RequestHandler, mut input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = String::new();
    input.read_to_string(&mut raw).await?;

    let event: IncomingRequest = serde_json::from_str(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let response = handler.handle(&event).await;

    let mut encoded = serde_json::to_vec(&response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    encoded.push(b'\n');
    output.write_all(&encoded).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::CorsConfig;
    use crate::upstream::HuggingFaceClient;

    fn handler() -> RequestHandler {
        RequestHandler::new(
            Arc::new(HuggingFaceClient::new()),
            Arc::new(HashMap::new()),
            Duration::from_secs(1),
            CorsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_run_writes_handler_response() {
        let input: &[u8] = br#"{"httpMethod":"GET","body":null}"#;
        let mut output = Vec::new();

        run(&handler(), input, &mut output).await.unwrap();

        let response: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["statusCode"], 405);
        assert_eq!(response["body"], r#"{"error":"Method Not Allowed"}"#);
        assert_eq!(response["headers"]["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_event() {
        let input: &[u8] = b"not an event";
        let mut output = Vec::new();

        let err = run(&handler(), input, &mut output).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(output.is_empty());
    }
}
