pub mod completion;
pub mod continuation;
pub mod cues;
pub mod orchestrator;
pub mod progress;
pub mod stage;
pub mod types;

use thiserror::Error;

use crate::models::Action;

/// Rejection of a user intent by the consultation state machine.
///
/// These never change state; the driver logs them and renders a fresh frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("A request is already in progress")]
    Busy,

    #[error("The consultation is complete")]
    ConsultationComplete,

    #[error("Message is empty")]
    EmptyInput,

    #[error("Action not available: {0}")]
    NotAvailable(Action),
}
