//! Session state
//!
//! A session is the ordered list of turns for one (app, user, session)
//! triple plus a small scratch map that carries context such as the last
//! resolved location between turns. Turns are append-only.

use super::SCRATCH_LAST_AGENTS;
use chrono::{DateTime, Utc};
use plantworks_llm::MessageRole;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Application name
    pub app_name: String,
    /// User id
    pub user_id: String,
    /// Session id
    pub session_id: String,
}

impl SessionKey {
    /// Create a key
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.app_name, self.user_id, self.session_id)
    }
}

/// One part of a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// MIME type of an attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Location of an attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Part {
    /// A text part
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// One recorded turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub role: MessageRole,
    /// Text content (joined text parts)
    pub content: String,
    /// Original parts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// A user turn
    #[must_use]
    pub fn user(content: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            parts,
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            parts: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Stored session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Identity
    pub key: SessionKey,
    /// Ordered turns
    pub turns: Vec<Turn>,
    /// Cross-turn scratch state
    pub scratch: HashMap<String, Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last commit time
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            turns: Vec::new(),
            scratch: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot of the last `window` turns and the scratch map
    #[must_use]
    pub fn view(&self, window: usize) -> SessionView {
        let skip = self.turns.len().saturating_sub(window);
        SessionView {
            key: self.key.clone(),
            recent_turns: self.turns[skip..].to_vec(),
            scratch: self.scratch.clone(),
        }
    }

    /// Apply a commit: append turns and merge scratch (null removes a key)
    pub fn apply(&mut self, commit: TurnCommit) {
        self.turns.extend(commit.turns);
        for (key, value) in commit.scratch {
            if value.is_null() {
                self.scratch.remove(&key);
            } else {
                self.scratch.insert(key, value);
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Read-only snapshot handed to specialists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Identity
    pub key: SessionKey,
    /// Most recent turns, oldest first
    pub recent_turns: Vec<Turn>,
    /// Scratch state at the start of the turn
    pub scratch: HashMap<String, Value>,
}

impl SessionView {
    /// Empty view for a key
    #[must_use]
    pub fn empty(key: SessionKey) -> Self {
        Self {
            key,
            recent_turns: Vec::new(),
            scratch: HashMap::new(),
        }
    }

    /// A scratch value as a non-empty string
    #[must_use]
    pub fn scratch_str(&self, key: &str) -> Option<&str> {
        self.scratch
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Agent labels dispatched on the previous turn
    #[must_use]
    pub fn last_agents(&self) -> Vec<String> {
        self.scratch
            .get(SCRATCH_LAST_AGENTS)
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Everything one turn writes, applied atomically
#[derive(Debug, Clone, Default)]
pub struct TurnCommit {
    /// Turns to append, in order
    pub turns: Vec<Turn>,
    /// Scratch entries to merge
    pub scratch: HashMap<String, Value>,
}

impl TurnCommit {
    /// Append a turn
    #[must_use]
    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    /// Set a scratch entry
    #[must_use]
    pub fn with_scratch(mut self, key: impl Into<String>, value: Value) -> Self {
        self.scratch.insert(key.into(), value);
        self
    }
}
