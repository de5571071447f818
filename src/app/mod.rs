pub mod router;
pub mod scan;
pub mod server;
pub mod state;
pub mod tracing;

pub use state::AppState;

use crate::config;
use crate::error::SummarizerError;
use tokio_util::sync::CancellationToken;

/// Application entry point. Handles subcommands, then initializes tracing and
/// configuration, connects the backends and serves until shutdown.
pub async fn run() -> Result<(), SummarizerError> {
    match std::env::args().nth(1).as_deref() {
        // Docker healthcheck in the distroless image
        Some("healthcheck") => match crate::healthcheck().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("Healthcheck failed: {e}");
                std::process::exit(1)
            }
        },
        Some("scan") => {
            tracing::init_tracing();
            let settings = config::get_configuration()?;
            match scan::run_scan(&settings).await {
                Ok(()) => std::process::exit(0),
                Err(e) => {
                    eprintln!("Scan failed: {e:#}");
                    std::process::exit(1)
                }
            }
        }
        _ => {}
    }

    tracing::init_tracing();

    let settings = config::get_configuration()?;
    ::tracing::info!("Loaded settings");

    let state = AppState::build(&settings).await?;
    let app = router::router(state.clone());

    server::serve(app, &settings.api_bind_addr(), CancellationToken::new()).await?;

    drop(state);
    ::tracing::info!("Inference client released");
    Ok(())
}
