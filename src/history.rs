//! Chat history with the "no two consecutive same-role turns" invariant
//! and optional oldest-first eviction.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who spoke a given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// Ordered conversation turns with a maximum retained count.
///
/// `push` enforces data-model invariant 6 (adjacent turns never share a
/// role) with a `debug_assert!` rather than a panic, matching the spec's
/// "log, don't crash" posture toward invariant violations — callers are
/// expected to use `reconcile`/`amend_last` instead of pushing
/// same-role turns back to back.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    turns: VecDeque<ChatTurn>,
    max_turns: Option<usize>,
}

impl ChatHistory {
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a new turn, evicting the oldest turn(s) if over capacity.
    pub fn push(&mut self, turn: ChatTurn) {
        debug_assert!(
            self.turns.back().map(|t| t.role) != Some(turn.role),
            "adjacent chat turns must not share a role"
        );
        self.turns.push_back(turn);
        if let Some(max) = self.max_turns {
            while self.turns.len() > max {
                self.turns.pop_front();
            }
        }
    }

    /// Drop the last turn (used when reconciling an in-progress agent turn
    /// that was cancelled before it could be appended).
    pub fn pop_last_if_role(&mut self, role: Role) -> bool {
        if self.turns.back().map(|t| t.role) == Some(role) {
            self.turns.pop_back();
            true
        } else {
            false
        }
    }

    /// Append `text` to the last turn's content with a single-space
    /// separator, iff the last turn has the given role.
    pub fn amend_last_if_role(&mut self, role: Role, text: &str) -> bool {
        if let Some(last) = self.turns.back_mut()
            && last.role == role
        {
            last.content.push(' ');
            last.content.push_str(text);
            return true;
        }
        false
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.back()
    }

    pub fn last_role(&self) -> Option<Role> {
        self.turns.back().map(|t| t.role)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Snapshot the turns as a contiguous slice-friendly `Vec`, for handing
    /// off to an Agent Runner.
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Iterate turns in order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }
}
