//! Conversational intake: field-by-field form filling with a Q&A side mode.
//!
//! A session first picks a mode. In flow mode the user answers one question
//! per message until every field of the [`FlowDefinition`] holds a validated
//! value, producing a [`ProjectRecord`]. In Q&A mode messages go to an
//! external question-answering collaborator instead.

pub mod definition;
pub mod engine;
pub mod record;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;
pub mod validator;

pub use definition::{FieldSpec, FlowDefinition};
pub use engine::{FlowEngine, FlowOutcome};
pub use record::{ProjectRecord, ValueFormat};
pub use router::{ModeKeywords, ModeRouter, Reply, ReplyStatus};
pub use routes::{IntakeRouteState, intake_routes};
pub use state::{FlowStep, Mode, SessionState, Speaker, Turn};
pub use store::SessionStore;
pub use validator::{FieldRule, FieldValue, ValidationRejected};
