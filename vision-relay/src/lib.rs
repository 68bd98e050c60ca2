//! Vision Relay - forwards image-analysis requests to a hosted inference
//! endpoint and relays the JSON result back to the caller.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod invoke;
pub mod state;
pub mod upstream;

pub use config::{
    ConfigurationError, CorsConfig, EnvSource, ProcessEnv, Settings, UpstreamConfig,
    UpstreamTarget,
};
pub use error::{Error, ErrorKind, Result};
pub use handler::RequestHandler;
pub use state::AppState;
pub use upstream::{HuggingFaceClient, InferenceApi};
