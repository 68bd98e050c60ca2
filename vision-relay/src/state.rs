//! Shared application state.

use crate::config::Settings;
use crate::handler::RequestHandler;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub settings: Settings,
    pub handler: RequestHandler,
}

impl AppState {
    pub fn new(settings: Settings, handler: RequestHandler) -> Self {
        Self { settings, handler }
    }

    /// State wired to the real inference client and process environment.
    pub fn from_settings(settings: Settings) -> Self {
        let handler = RequestHandler::from_settings(&settings);
        Self::new(settings, handler)
    }
}
