//! Q&A collaborator: answers open-ended questions for sessions in Q&A mode.
//!
//! The session router only sees the [`QuestionAnswerer`] trait: a question and
//! the prior turns go in, one answer (or a failure) comes out. Retrieval and
//! model calls are owned by the implementation.

pub mod hybrid;
pub mod retriever;

pub use hybrid::HybridAnswerer;
pub use retriever::{HttpRetriever, Retriever};

use async_trait::async_trait;

use crate::error::QaError;
use crate::intake::state::Turn;

/// Answers a free-text question given the conversation so far.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str, history: &[Turn]) -> Result<String, QaError>;
}
