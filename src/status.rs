//! Stage status enums and the system-idle predicate.
//!
//! Each stage has its own enum exposing only the values legal for that
//! stage, rather than one shared string-like status — a value like
//! `TtsStatus::Active` simply does not exist, so a component cannot drift
//! into a status its stage was never meant to hold.

use serde::{Deserialize, Serialize};

/// STT worker status: {Idle, Processing}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SttStatus {
    #[default]
    Idle,
    Processing,
}

/// Agent runner status: {Idle, Processing, Streaming}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentStatus {
    #[default]
    Idle,
    Processing,
    Streaming,
}

/// TTS worker status: {Idle, Processing, Streaming}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TtsStatus {
    #[default]
    Idle,
    Processing,
    Streaming,
}

/// Client-facing playback status: {Idle, Active, Paused}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Active,
    Paused,
}

/// Interruption soft-lock status: {Idle, Processing, Active}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterruptionStatus {
    #[default]
    Idle,
    Processing,
    Active,
}

impl InterruptionStatus {
    /// True when the decision task should treat the current utterance as
    /// potentially happening under an active interruption.
    pub fn is_under_interruption(self) -> bool {
        matches!(self, Self::Processing | Self::Active)
    }
}

/// Snapshot of every stage status plus the booleans that feed
/// `is_system_idle`. Read under the session lock for a consistent view.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusSnapshot {
    pub stt: SttStatus,
    pub agent: AgentStatus,
    pub tts: TtsStatus,
    pub playback: PlaybackStatus,
    pub interruption: InterruptionStatus,
    pub client_playback_active: bool,
    pub response_in_progress: bool,
}

impl StatusSnapshot {
    /// `is_system_idle` per the data-model invariant: no stage active, no
    /// client playback, and no response in flight.
    pub fn is_system_idle(&self) -> bool {
        self.stt == SttStatus::Idle
            && self.agent == AgentStatus::Idle
            && self.tts == TtsStatus::Idle
            && self.playback == PlaybackStatus::Idle
            && !self.client_playback_active
            && !self.response_in_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_is_system_idle() {
        let snap = StatusSnapshot::default();
        assert!(snap.is_system_idle());
    }

    #[test]
    fn agent_processing_breaks_idle() {
        let snap = StatusSnapshot {
            agent: AgentStatus::Processing,
            ..Default::default()
        };
        assert!(!snap.is_system_idle());
    }

    #[test]
    fn client_playback_active_breaks_idle() {
        let snap = StatusSnapshot {
            client_playback_active: true,
            ..Default::default()
        };
        assert!(!snap.is_system_idle());
    }

    #[test]
    fn response_in_progress_breaks_idle() {
        let snap = StatusSnapshot {
            response_in_progress: true,
            ..Default::default()
        };
        assert!(!snap.is_system_idle());
    }

    #[test]
    fn interruption_processing_or_active_is_under_interruption() {
        assert!(!InterruptionStatus::Idle.is_under_interruption());
        assert!(InterruptionStatus::Processing.is_under_interruption());
        assert!(InterruptionStatus::Active.is_under_interruption());
    }
}
