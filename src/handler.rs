//! The prompt/response interaction cycle.

use std::sync::Arc;

use log::warn;

use crate::consts::{MODEL, PENDING_CAPTION};
use crate::generator::{Generation, GenerationRequest, Generator, ServiceError};
use crate::spinner::Spinner;

/// Terminal state of one interaction. Every trigger produces exactly
/// one of these; a new trigger starts the cycle from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was typed; no request was made.
    EmptyPrompt,
    /// The service answered.
    Answer(Generation),
    /// The service call failed. The session stays alive.
    Failed(ServiceError),
}

/// Drives one user-triggered request/response cycle against an
/// injected [`Generator`]. The model identifier is fixed at
/// construction.
pub struct AskHandler {
    generator: Arc<dyn Generator>,
    model: &'static str,
}

impl AskHandler {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            model: MODEL,
        }
    }

    /// Run one cycle: validate, call the service, classify the result.
    ///
    /// Whitespace-only input counts as empty and issues no request;
    /// otherwise the trimmed prompt is sent, with the pending spinner
    /// shown for the duration of the call. Service failures come back
    /// as [`Outcome::Failed`], never as a panic.
    pub async fn ask(&self, prompt: &str) -> Outcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Outcome::EmptyPrompt;
        }

        let request = GenerationRequest {
            model: self.model.to_string(),
            prompt: prompt.to_string(),
        };

        let spinner = Spinner::start(PENDING_CAPTION);
        let result = self.generator.generate(&request).await;
        spinner.stop().await;

        match result {
            Ok(generation) => Outcome::Answer(generation),
            Err(err) => {
                let kind = if err.is_transient() {
                    "transient"
                } else {
                    "permanent"
                };
                warn!("generation failed ({kind}): {err}");
                Outcome::Failed(err)
            }
        }
    }
}
