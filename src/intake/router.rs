//! Mode router: the entry point for every user message.
//!
//! A session's first message picks its mode. After that, flow sessions feed
//! the [`FlowEngine`] and Q&A sessions forward each message to the
//! [`QuestionAnswerer`]. The mode only changes on reset.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::engine::{FlowEngine, FlowOutcome};
use super::state::{Mode, SessionState, Turn};
use super::store::SessionStore;
use crate::qa::QuestionAnswerer;

const RESET_MESSAGE: &str = "Session reset. Please start your conversation.";
const QA_IDLE_MESSAGE: &str = "Q&A mode is active. Ask your question.";

/// Words that select a mode on a session's first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeKeywords {
    pub flow: String,
    pub qa: String,
}

impl ModeKeywords {
    pub fn new(flow: impl Into<String>, qa: impl Into<String>) -> Self {
        Self {
            flow: flow.into().trim().to_lowercase(),
            qa: qa.into().trim().to_lowercase(),
        }
    }

    /// Read a mode selection. The whole message or any single word of it must
    /// equal a keyword, ignoring case and punctuation. Flow wins ties.
    pub fn parse(&self, text: &str) -> Option<Mode> {
        let lowered = text.trim().to_lowercase();
        let matches = |keyword: &str| {
            lowered == keyword
                || lowered
                    .split_whitespace()
                    .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
                    .any(|word| word == keyword)
        };
        if matches(&self.flow) {
            Some(Mode::Flow)
        } else if matches(&self.qa) {
            Some(Mode::Rag)
        } else {
            None
        }
    }

    fn greeting(&self) -> String {
        format!(
            "Hello! I can walk you through the **Project Intake** form or answer open questions. \
             Respond with '{}' to start the intake or '{}' to ask questions.",
            self.flow, self.qa
        )
    }

    fn invalid_selection(&self) -> String {
        format!(
            "I couldn't understand that. Please respond with '{}' to start the Project Intake \
             or '{}' to ask questions.",
            self.flow, self.qa
        )
    }
}

impl Default for ModeKeywords {
    fn default() -> Self {
        Self::new("flow", "rag")
    }
}

/// Outcome category of a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Success,
    ValidationError,
    Complete,
    Error,
}

/// What the caller shows the user after a submit or reset.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub session_id: String,
    pub status: ReplyStatus,
    pub bot_message: String,
    pub is_complete: bool,
    /// Collected values so far, or the finished record once complete.
    pub data: serde_json::Value,
    pub mode: Mode,
}

impl Reply {
    fn new(state: &SessionState, status: ReplyStatus, bot_message: impl Into<String>) -> Self {
        Self {
            session_id: state.session_id.clone(),
            status,
            bot_message: bot_message.into(),
            is_complete: false,
            data: serde_json::json!({}),
            mode: state.mode,
        }
    }

    fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Routes messages to the flow engine or the Q&A collaborator.
pub struct ModeRouter {
    store: Arc<SessionStore>,
    engine: FlowEngine,
    answerer: Arc<dyn QuestionAnswerer>,
    keywords: ModeKeywords,
}

impl ModeRouter {
    pub fn new(
        store: Arc<SessionStore>,
        engine: FlowEngine,
        answerer: Arc<dyn QuestionAnswerer>,
        keywords: ModeKeywords,
    ) -> Self {
        Self {
            store,
            engine,
            answerer,
            keywords,
        }
    }

    pub fn engine(&self) -> &FlowEngine {
        &self.engine
    }

    /// Handle one user message. An empty session id starts a new session.
    pub async fn submit(&self, session_id: &str, text: &str) -> Reply {
        let session_id = match session_id.trim() {
            "" => Uuid::new_v4().to_string(),
            id => id.to_string(),
        };
        let handle = self.store.get_or_create(&session_id).await;
        // Held for the whole message, Q&A call included: one message per session at a time.
        let mut state = handle.lock().await;

        match state.mode {
            Mode::Unset => self.select_mode(&mut state, text),
            Mode::Flow => self.flow_step(&mut state, text),
            Mode::Rag => self.ask(&mut state, text).await,
        }
    }

    /// Discard a session. The next message starts over with mode selection.
    pub async fn reset(&self, session_id: &str) -> Reply {
        self.store.reset(session_id.trim()).await;
        let fresh = SessionState::new(session_id.trim());
        Reply::new(&fresh, ReplyStatus::Success, RESET_MESSAGE)
    }

    /// Copy of a session's current state, if it exists.
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionState> {
        let handle = self.store.get(session_id.trim()).await?;
        let state = handle.lock().await;
        Some(state.clone())
    }

    fn select_mode(&self, state: &mut SessionState, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::new(state, ReplyStatus::Success, self.keywords.greeting());
        }

        state.push_turn(Turn::user(text.trim()));
        match self.keywords.parse(text) {
            Some(Mode::Flow) => {
                state.mode = Mode::Flow;
                info!(session_id = %state.session_id, mode = %state.mode, "Mode selected");
                let outcome = self.engine.current_prompt(state);
                self.flow_reply(state, outcome)
            }
            Some(Mode::Rag) => {
                state.mode = Mode::Rag;
                info!(session_id = %state.session_id, mode = %state.mode, "Mode selected");
                let message = "Q&A mode selected. Ask me any question.";
                state.push_turn(Turn::assistant(message));
                Reply::new(state, ReplyStatus::Success, message)
            }
            Some(Mode::Unset) | None => Reply::new(
                state,
                ReplyStatus::ValidationError,
                self.keywords.invalid_selection(),
            ),
        }
    }

    fn flow_step(&self, state: &mut SessionState, text: &str) -> Reply {
        let outcome = if text.trim().is_empty() {
            self.engine.current_prompt(state)
        } else {
            match self.engine.submit(state, text) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(session_id = %state.session_id, error = %e, "Flow could not finish");
                    return Reply::new(
                        state,
                        ReplyStatus::Error,
                        "An unexpected state was reached. Please reset the session.",
                    );
                }
            }
        };
        self.flow_reply(state, outcome)
    }

    fn flow_reply(&self, state: &SessionState, outcome: FlowOutcome) -> Reply {
        let collected = || serde_json::to_value(&state.collected).unwrap_or_default();
        let message = outcome.message().to_string();
        match outcome {
            FlowOutcome::Prompt { .. } => {
                Reply::new(state, ReplyStatus::Success, message).with_data(collected())
            }
            FlowOutcome::Rejected { .. } => {
                Reply::new(state, ReplyStatus::ValidationError, message).with_data(collected())
            }
            FlowOutcome::Completed { record } => {
                info!(session_id = %state.session_id, fields = record.len(), "Flow complete");
                let mut reply = Reply::new(state, ReplyStatus::Success, message)
                    .with_data(serde_json::to_value(&record).unwrap_or_default());
                reply.is_complete = true;
                reply
            }
            FlowOutcome::AlreadyComplete { record } => {
                let mut reply = Reply::new(state, ReplyStatus::Complete, message)
                    .with_data(serde_json::to_value(&record).unwrap_or_default());
                reply.is_complete = true;
                reply
            }
        }
    }

    async fn ask(&self, state: &mut SessionState, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::new(state, ReplyStatus::Success, QA_IDLE_MESSAGE);
        }

        match self.answerer.answer(text, &state.history).await {
            Ok(answer) => {
                state.push_turn(Turn::user(text));
                state.push_turn(Turn::assistant(answer.clone()));
                Reply::new(state, ReplyStatus::Success, answer)
            }
            Err(e) => {
                warn!(session_id = %state.session_id, error = %e, "Q&A collaborator failed");
                Reply::new(
                    state,
                    ReplyStatus::Error,
                    format!("An error occurred while answering your question: {e}"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::QaError;
    use crate::intake::definition::FlowDefinition;
    use crate::intake::engine::{ALREADY_COMPLETE_MESSAGE, COMPLETION_MESSAGE};

    /// Echoes questions back and remembers what it was asked.
    #[derive(Default)]
    struct EchoAnswerer {
        asked: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl QuestionAnswerer for EchoAnswerer {
        async fn answer(
            &self,
            question: &str,
            history: &[Turn],
        ) -> Result<String, QaError> {
            self.asked
                .lock()
                .unwrap()
                .push((question.to_string(), history.len()));
            Ok(format!("echo: {question}"))
        }
    }

    struct FailingAnswerer;

    #[async_trait]
    impl QuestionAnswerer for FailingAnswerer {
        async fn answer(&self, _question: &str, _history: &[Turn]) -> Result<String, QaError> {
            Err(QaError::MissingCredential)
        }
    }

    fn router_with(answerer: Arc<dyn QuestionAnswerer>) -> ModeRouter {
        ModeRouter::new(
            SessionStore::new(),
            FlowEngine::new(Arc::new(FlowDefinition::project_intake())),
            answerer,
            ModeKeywords::default(),
        )
    }

    fn router() -> (ModeRouter, Arc<EchoAnswerer>) {
        let echo = Arc::new(EchoAnswerer::default());
        (router_with(echo.clone()), echo)
    }

    #[test]
    fn keyword_parsing() {
        let keywords = ModeKeywords::default();
        assert_eq!(keywords.parse("flow"), Some(Mode::Flow));
        assert_eq!(keywords.parse("Flow"), Some(Mode::Flow));
        assert_eq!(keywords.parse("  FLOW!  "), Some(Mode::Flow));
        assert_eq!(keywords.parse("RAG"), Some(Mode::Rag));
        assert_eq!(keywords.parse("let's do rag please"), Some(Mode::Rag));
        assert_eq!(keywords.parse("workflow"), None);
        assert_eq!(keywords.parse("hello"), None);
        assert_eq!(keywords.parse(""), None);
    }

    #[test]
    fn custom_keywords_are_normalized() {
        let keywords = ModeKeywords::new(" Intake ", "ASK");
        assert_eq!(keywords.parse("intake"), Some(Mode::Flow));
        assert_eq!(keywords.parse("Ask"), Some(Mode::Rag));
        assert_eq!(keywords.parse("flow"), None);
    }

    #[tokio::test]
    async fn empty_first_message_greets() {
        let (router, _) = router();
        let reply = router.submit("s1", "").await;
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.mode, Mode::Unset);
        assert!(reply.bot_message.contains("'flow'"));
    }

    #[tokio::test]
    async fn flow_keyword_selects_flow_any_case() {
        for word in ["flow", "Flow"] {
            let (router, _) = router();
            let reply = router.submit("s1", word).await;
            assert_eq!(reply.mode, Mode::Flow);
            assert_eq!(reply.status, ReplyStatus::Success);
            assert_eq!(
                reply.bot_message,
                "Welcome! To start, what is your **full name**?"
            );
            assert!(!reply.is_complete);
        }
    }

    #[tokio::test]
    async fn unrecognized_selection_keeps_mode_unset() {
        let (router, _) = router();
        let reply = router.submit("s1", "hello there").await;
        assert_eq!(reply.status, ReplyStatus::ValidationError);
        assert_eq!(reply.mode, Mode::Unset);
        assert!(reply.bot_message.starts_with("I couldn't understand that."));

        let state = router.snapshot("s1").await.unwrap();
        assert_eq!(state.mode, Mode::Unset);
        assert_eq!(state.step_index, 0);
        assert_eq!(state.history.len(), 1);

        // Still selectable afterwards.
        assert_eq!(router.submit("s1", "flow").await.mode, Mode::Flow);
    }

    #[tokio::test]
    async fn full_flow_then_completion_is_sticky() {
        let (router, echo) = router();
        router.submit("s1", "flow").await;
        router.submit("s1", "Ana Lima").await;

        let rejected = router.submit("s1", "App").await;
        assert_eq!(rejected.status, ReplyStatus::ValidationError);
        assert_eq!(rejected.data, serde_json::json!({"name": "Ana Lima"}));

        router.submit("s1", "Mobile App").await;
        router.submit("s1", "12").await;
        let done = router.submit("s1", "5000").await;
        assert_eq!(done.status, ReplyStatus::Success);
        assert!(done.is_complete);
        assert_eq!(done.bot_message, COMPLETION_MESSAGE);
        let expected = serde_json::json!({
            "name": "Ana Lima",
            "projectType": "Mobile App",
            "duration": 12,
            "budget": 5000
        });
        assert_eq!(done.data, expected);

        let again = router.submit("s1", "rag").await;
        assert_eq!(again.status, ReplyStatus::Complete);
        assert!(again.is_complete);
        assert_eq!(again.bot_message, ALREADY_COMPLETE_MESSAGE);
        assert_eq!(again.data, expected);
        assert_eq!(again.mode, Mode::Flow);
        assert!(echo.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_input_in_flow_repeats_prompt() {
        let (router, _) = router();
        router.submit("s1", "flow").await;
        let reply = router.submit("s1", "   ").await;
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(
            reply.bot_message,
            "Welcome! To start, what is your **full name**?"
        );
        assert_eq!(router.snapshot("s1").await.unwrap().step_index, 0);
    }

    #[tokio::test]
    async fn rag_mode_forwards_everything_including_flow() {
        let (router, echo) = router();
        let selected = router.submit("s1", "RAG").await;
        assert_eq!(selected.mode, Mode::Rag);

        let reply = router.submit("s1", "flow").await;
        assert_eq!(reply.mode, Mode::Rag);
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.bot_message, "echo: flow");

        let asked = echo.asked.lock().unwrap();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, "flow");
        // Selection message and its acknowledgement were passed as context.
        assert_eq!(asked[0].1, 2);
    }

    #[tokio::test]
    async fn empty_question_does_not_call_collaborator() {
        let (router, echo) = router();
        router.submit("s1", "rag").await;
        let reply = router.submit("s1", "").await;
        assert_eq!(reply.bot_message, QA_IDLE_MESSAGE);
        assert!(echo.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn collaborator_failure_leaves_session_unchanged() {
        let router = router_with(Arc::new(FailingAnswerer));
        router.submit("s1", "rag").await;
        let before = router.snapshot("s1").await.unwrap();

        let reply = router.submit("s1", "Who is he?").await;
        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.mode, Mode::Rag);
        assert!(reply.bot_message.contains("GROQ_API_KEY"));

        let after = router.snapshot("s1").await.unwrap();
        assert_eq!(after.history, before.history);
        assert_eq!(after.mode, Mode::Rag);
    }

    #[tokio::test]
    async fn reset_returns_to_mode_selection() {
        let (router, _) = router();
        router.submit("s1", "flow").await;
        router.submit("s1", "Ana Lima").await;

        let reply = router.reset("s1").await;
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.mode, Mode::Unset);
        assert!(router.snapshot("s1").await.is_none());

        let reply = router.submit("s1", "flow").await;
        assert_eq!(
            reply.bot_message,
            "Welcome! To start, what is your **full name**?"
        );
        let state = router.snapshot("s1").await.unwrap();
        assert_eq!(state.step_index, 0);
        assert!(state.collected.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_completed_and_rag_sessions() {
        let (router, _) = router();
        for input in ["flow", "Ana Lima", "Mobile App", "12", "5000"] {
            router.submit("done", input).await;
        }
        router.submit("qa", "rag").await;

        router.reset("done").await;
        router.reset("qa").await;

        assert_eq!(router.submit("qa", "flow").await.mode, Mode::Flow);
        let reply = router.submit("done", "").await;
        assert_eq!(reply.mode, Mode::Unset);
        assert!(!reply.is_complete);

        let state = router.snapshot("done").await.unwrap();
        assert_eq!(state.step_index, 0);
        assert!(state.collected.is_empty());
        assert!(state.record.is_none());

        router.submit("done", "flow").await;
        let state = router.snapshot("done").await.unwrap();
        assert_eq!(state.step_index, 0);
        assert!(state.collected.is_empty());
        assert!(state.record.is_none());
    }

    #[tokio::test]
    async fn questions_are_forwarded_verbatim() {
        let (router, echo) = router();
        router.submit("s1", "rag").await;
        let reply = router.submit("s1", "  Who is he?\n").await;
        assert_eq!(reply.bot_message, "echo:   Who is he?\n");
        assert_eq!(echo.asked.lock().unwrap()[0].0, "  Who is he?\n");
    }

    #[tokio::test]
    async fn snapshot_trims_session_id_like_submit() {
        let (router, _) = router();
        router.submit(" s1 ", "flow").await;
        assert_eq!(router.snapshot("s1").await.unwrap().mode, Mode::Flow);
        assert_eq!(router.snapshot(" s1").await.unwrap().mode, Mode::Flow);

        router.reset(" s1").await;
        assert!(router.snapshot("s1 ").await.is_none());
    }

    #[tokio::test]
    async fn blank_session_id_mints_one() {
        let (router, _) = router();
        let first = router.submit("", "flow").await;
        let second = router.submit("  ", "flow").await;
        assert!(Uuid::parse_str(&first.session_id).is_ok());
        assert_ne!(first.session_id, second.session_id);

        let next = router.submit(&first.session_id, "Ana Lima").await;
        assert_eq!(next.data, serde_json::json!({"name": "Ana Lima"}));
    }

    #[tokio::test]
    async fn sessions_do_not_share_state() {
        let (router, _) = router();
        router.submit("a", "flow").await;
        router.submit("b", "rag").await;
        router.submit("a", "Ana Lima").await;

        assert_eq!(router.snapshot("a").await.unwrap().step_index, 1);
        let b = router.snapshot("b").await.unwrap();
        assert_eq!(b.mode, Mode::Rag);
        assert!(b.collected.is_empty());
    }
}
