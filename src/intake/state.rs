//! Per-conversation session state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::ProjectRecord;
use super::validator::FieldValue;

/// Which conversation a session is having. Chosen once, sticky until reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No mode chosen yet; the next message is read as a mode selection.
    #[default]
    Unset,
    /// Structured field collection.
    Flow,
    /// Open-ended questions forwarded to the Q&A collaborator.
    Rag,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unset => "unset",
            Self::Flow => "flow",
            Self::Rag => "rag",
        };
        write!(f, "{s}")
    }
}

/// Position of a session within its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Expecting the field at this index.
    Collecting(usize),
    Complete,
}

impl FlowStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Who said something in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Mutable record of one conversation.
///
/// Created on first contact with a session id, discarded on reset. Never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub session_id: String,
    pub mode: Mode,
    /// Index of the next field to collect; equals the flow length once done.
    pub step_index: usize,
    /// Values accepted so far, keyed by field key.
    pub collected: BTreeMap<String, FieldValue>,
    /// The finished record, set exactly once when the flow completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ProjectRecord>,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            mode: Mode::default(),
            step_index: 0,
            collected: BTreeMap::new(),
            record: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Where the session is in a flow of `flow_len` fields.
    pub fn step(&self, flow_len: usize) -> FlowStep {
        if self.step_index >= flow_len {
            FlowStep::Complete
        } else {
            FlowStep::Collecting(self.step_index)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.record.is_some()
    }

    /// Append a turn to the history.
    pub fn push_turn(&mut self, turn: Turn) {
        self.updated_at = turn.at;
        self.history.push(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        for mode in [Mode::Unset, Mode::Flow, Mode::Rag] {
            let display = format!("{mode}");
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {mode:?}"
            );
        }
    }

    #[test]
    fn new_session_is_blank() {
        let state = SessionState::new("abc");
        assert_eq!(state.session_id, "abc");
        assert_eq!(state.mode, Mode::Unset);
        assert_eq!(state.step_index, 0);
        assert!(state.collected.is_empty());
        assert!(state.history.is_empty());
        assert!(!state.is_complete());
    }

    #[test]
    fn step_tracks_index() {
        let mut state = SessionState::new("abc");
        assert_eq!(state.step(4), FlowStep::Collecting(0));
        state.step_index = 3;
        assert_eq!(state.step(4), FlowStep::Collecting(3));
        state.step_index = 4;
        assert_eq!(state.step(4), FlowStep::Complete);
        assert!(state.step(4).is_terminal());
    }

    #[test]
    fn push_turn_keeps_order() {
        let mut state = SessionState::new("abc");
        state.push_turn(Turn::user("hi"));
        state.push_turn(Turn::assistant("hello"));
        let speakers: Vec<Speaker> = state.history.iter().map(|t| t.speaker).collect();
        assert_eq!(speakers, [Speaker::User, Speaker::Assistant]);
        assert_eq!(state.updated_at, state.history[1].at);
    }

    #[test]
    fn snapshot_serializes_mode_and_progress() {
        let mut state = SessionState::new("abc");
        state.mode = Mode::Flow;
        state.step_index = 2;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "flow");
        assert_eq!(json["step_index"], 2);
        assert!(json.get("record").is_none());
    }
}
