//! Guided medical-intake consultation client.
//!
//! `intake` holds the consultation state machine and its async driver,
//! `summary` turns generated case summaries into structured documents, and
//! `dialogue` talks to the intake backend.

pub mod config;
pub mod dialogue;
pub mod intake;
pub mod models;
pub mod render;
pub mod summary;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use config::IntakeConfig;
use dialogue::{DialogueError, HttpDialogueClient};
use intake::orchestrator::{Consultation, ConsultationDriver};
use render::{Intent, RenderTarget};

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to `config::default_log_filter()`.
/// A subscriber installed earlier is left in place.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Run one consultation against the HTTP backend named in `config`.
///
/// Returns the final consultation once `intents` closes and pending work drains.
pub async fn run<R: RenderTarget>(
    config: IntakeConfig,
    target: R,
    intents: mpsc::Receiver<Intent>,
) -> Result<Consultation, DialogueError> {
    let client = HttpDialogueClient::new(&config)?;
    tracing::info!(backend = %client.base_url(), "Connecting to dialogue backend");

    let mut driver = ConsultationDriver::new(config, client, target);
    driver.run(intents).await;
    let (consultation, _, _) = driver.into_parts();
    Ok(consultation)
}
