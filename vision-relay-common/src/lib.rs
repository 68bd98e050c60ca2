//! Vision Relay Common Types
//!
//! Shared types used by the relay handler, its HTTP surface and its tests.

pub mod analysis;
pub mod invocation;
pub mod model;

pub use analysis::{AnalysisRequest, OutboundInputs, OutboundPayload, PayloadError};
pub use invocation::{HandlerResponse, IncomingRequest};
pub use model::{ModelKey, UnknownModelKey};
