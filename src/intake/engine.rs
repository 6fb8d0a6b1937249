//! Flow engine: advances a session through its flow one field at a time.
//!
//! States are `Collecting(i)` for each field index and `Complete` once every
//! field holds a validated value. Valid input moves to the next field;
//! rejected input leaves the session untouched and re-asks.

use std::sync::Arc;

use tracing::debug;

use super::definition::FlowDefinition;
use super::record::ProjectRecord;
use super::state::{FlowStep, SessionState, Turn};
use crate::error::FlowDefinitionError;

pub const COMPLETION_MESSAGE: &str = "Thank you! The flow is now complete.";
pub const ALREADY_COMPLETE_MESSAGE: &str =
    "Flow is already complete. Reset the session to start over.";

/// What the engine produced for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Prompt for the field at `step`.
    Prompt { step: usize, message: String },
    /// Input failed validation; `message` carries the reason and the re-asked prompt.
    Rejected {
        step: usize,
        reason: String,
        message: String,
    },
    /// This input finished the flow.
    Completed { record: ProjectRecord },
    /// The flow had already finished; nothing changed.
    AlreadyComplete { record: ProjectRecord },
}

impl FlowOutcome {
    /// Text to show the user.
    pub fn message(&self) -> &str {
        match self {
            Self::Prompt { message, .. } | Self::Rejected { message, .. } => message,
            Self::Completed { .. } => COMPLETION_MESSAGE,
            Self::AlreadyComplete { .. } => ALREADY_COMPLETE_MESSAGE,
        }
    }

    pub fn record(&self) -> Option<&ProjectRecord> {
        match self {
            Self::Completed { record } | Self::AlreadyComplete { record } => Some(record),
            _ => None,
        }
    }
}

/// Drives sessions through a shared [`FlowDefinition`].
#[derive(Debug, Clone)]
pub struct FlowEngine {
    flow: Arc<FlowDefinition>,
}

impl FlowEngine {
    pub fn new(flow: Arc<FlowDefinition>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    /// Emit the prompt for the session's current step without consuming input.
    pub fn current_prompt(&self, state: &mut SessionState) -> FlowOutcome {
        if let Some(record) = &state.record {
            return FlowOutcome::AlreadyComplete {
                record: record.clone(),
            };
        }
        self.prompt_for(state)
    }

    /// Feed one piece of user input to the session's current step.
    pub fn submit(
        &self,
        state: &mut SessionState,
        input: &str,
    ) -> Result<FlowOutcome, FlowDefinitionError> {
        if let Some(record) = &state.record {
            return Ok(FlowOutcome::AlreadyComplete {
                record: record.clone(),
            });
        }

        let step = match state.step(self.flow.len()) {
            FlowStep::Collecting(step) => step,
            // Index ran past the end without a record; finish it now.
            FlowStep::Complete => return self.complete(state),
        };
        let Some(field) = self.flow.get(step) else {
            return self.complete(state);
        };

        let value = match field.validate(input) {
            Ok(value) => value,
            Err(rejected) => {
                debug!(
                    session_id = %state.session_id,
                    field = %field.key,
                    reason = %rejected.reason,
                    "Field rejected"
                );
                let prompt = self
                    .flow
                    .render_prompt(step, &state.collected)
                    .unwrap_or_default();
                return Ok(FlowOutcome::Rejected {
                    step,
                    message: format!("Input Error: {} Please try again.\n\n{prompt}", rejected.reason),
                    reason: rejected.reason,
                });
            }
        };

        debug!(session_id = %state.session_id, field = %field.key, "Field accepted");
        state.collected.insert(field.key.clone(), value);
        state.push_turn(Turn::user(input.trim()));
        state.step_index = step + 1;

        if state.step_index >= self.flow.len() {
            return self.complete(state);
        }
        Ok(self.prompt_for(state))
    }

    fn prompt_for(&self, state: &mut SessionState) -> FlowOutcome {
        let step = state.step_index;
        let message = self
            .flow
            .render_prompt(step, &state.collected)
            .unwrap_or_default();
        state.push_turn(Turn::assistant(message.clone()));
        FlowOutcome::Prompt { step, message }
    }

    fn complete(&self, state: &mut SessionState) -> Result<FlowOutcome, FlowDefinitionError> {
        let record = self.flow.build_record(&state.collected)?;
        state.step_index = self.flow.len();
        state.record = Some(record.clone());
        state.push_turn(Turn::assistant(COMPLETION_MESSAGE));
        Ok(FlowOutcome::Completed { record })
    }
}
