//! Vision Relay - HTTP server and one-shot invocation entry point.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vision_relay::{api, invoke, AppState, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("vision-relay {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing; logs go to stderr so --invoke output stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check config.toml and VISION_RELAY__SECTION__KEY environment variables.",
            e
        )
    })?;

    let state = Arc::new(AppState::from_settings(settings));

    // One-shot mode: event on stdin, response on stdout
    if args.iter().any(|a| a == "--invoke") {
        invoke::run(&state.handler, tokio::io::stdin(), tokio::io::stdout()).await?;
        return Ok(());
    }

    tracing::info!(
        "Upstream timeout {:?}, CORS origin {:?}",
        state.handler.timeout(),
        state.settings.cors.allow_origin()
    );

    // Start server
    let addr = format!("{}:{}", state.settings.api.host, state.settings.api.port);
    let app = api::app(state);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
