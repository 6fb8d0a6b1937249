//! Hybrid answerer: classify the question, then answer from retrieved
//! passages or directly from the model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::QuestionAnswerer;
use super::retriever::Retriever;
use crate::error::QaError;
use crate::intake::state::{Speaker, Turn};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Prior turns sent to the model along with each question.
const MAX_HISTORY_TURNS: usize = 20;
/// Separator between retrieved passages in the grounding context.
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

const CLASSIFY_TEMPERATURE: f32 = 0.0;
const ANSWER_TEMPERATURE: f32 = 0.1;

/// Where a question should be answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// About the indexed topic: answer from retrieved passages.
    Retrieval,
    /// General knowledge: answer directly.
    Direct,
}

fn classifier_prompt(topic: &str) -> String {
    format!(
        "You are an intent router. Your task is to classify the user query. \
         If the query is primarily about '{topic}', respond with 'RAG'. \
         Otherwise, respond with 'LLM'. Only output the classification word, nothing else."
    )
}

fn grounded_prompt(topic: &str, context: &str) -> String {
    format!(
        "You are a specialized assistant on {topic}. \
         Answer the user's question ONLY using the following context. \
         If the context does not contain the answer, state that you cannot answer \
         based on the provided documents.\n\nContext: {context}"
    )
}

const DIRECT_PROMPT: &str =
    "You are a helpful and concise general knowledge assistant. Answer the user's question directly.";

/// Parse the classifier's one-word reply. Anything but `RAG` is a direct question.
fn parse_intent(reply: &str) -> Intent {
    let word = reply
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .to_ascii_uppercase();
    if word == "RAG" {
        Intent::Retrieval
    } else {
        Intent::Direct
    }
}

/// The Q&A collaborator used in production.
pub struct HybridAnswerer {
    /// `None` when no API key is configured; every question then fails.
    llm: Option<Arc<dyn LlmProvider>>,
    retriever: Option<Arc<dyn Retriever>>,
    topic: String,
    top_k: usize,
}

impl HybridAnswerer {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, topic: impl Into<String>) -> Self {
        Self {
            llm,
            retriever: None,
            topic: topic.into(),
            top_k: 3,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        self.retriever = Some(retriever);
        self.top_k = top_k;
        self
    }

    async fn classify(&self, llm: &dyn LlmProvider, question: &str) -> Result<Intent, QaError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(classifier_prompt(&self.topic)),
            ChatMessage::user(question),
        ])
        .with_max_tokens(8)
        .with_temperature(CLASSIFY_TEMPERATURE);
        let response = llm.complete(request).await?;
        let intent = parse_intent(&response.content);
        debug!(
            ?intent,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Question classified"
        );
        Ok(intent)
    }
}

/// Convert the tail of a session history into chat messages.
fn history_messages(history: &[Turn]) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history[start..]
        .iter()
        .map(|turn| match turn.speaker {
            Speaker::User => ChatMessage::user(&turn.text),
            Speaker::Assistant => ChatMessage::assistant(&turn.text),
        })
        .collect()
}

#[async_trait]
impl QuestionAnswerer for HybridAnswerer {
    async fn answer(&self, question: &str, history: &[Turn]) -> Result<String, QaError> {
        let llm = self.llm.as_deref().ok_or(QaError::MissingCredential)?;

        let intent = self.classify(llm, question).await?;
        let system = match (intent, &self.retriever) {
            (Intent::Retrieval, Some(retriever)) => {
                let passages = retriever.retrieve(question, self.top_k).await?;
                info!(passages = passages.len(), "Answering from retrieved passages");
                grounded_prompt(&self.topic, &passages.join(PASSAGE_SEPARATOR))
            }
            (Intent::Retrieval, None) => {
                debug!("No retriever configured, answering directly");
                DIRECT_PROMPT.to_string()
            }
            (Intent::Direct, _) => {
                info!("Answering directly");
                DIRECT_PROMPT.to_string()
            }
        };

        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(history_messages(history));
        messages.push(ChatMessage::user(question));

        let request = CompletionRequest::new(messages).with_temperature(ANSWER_TEMPERATURE);
        let response = llm.complete(request).await?;
        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Answer generated"
        );
        Ok(response.content.trim().to_string())
    }
}
