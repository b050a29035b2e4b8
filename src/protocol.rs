//! Client ↔ orchestrator wire protocol.
//!
//! One JSON object per frame, unknown fields ignored, unknown `type`/`event`
//! values logged and dropped rather than treated as fatal — the event
//! router enforces the drop side of that rule; decoding an unrecognized
//! tag simply fails to deserialize into these enums, and the caller logs
//! and moves on. Grounded on the teacher's typed inter-stage messages
//! (`pipeline::messages`), given an externally-tagged serde shape per the
//! spec's framing rule.

use serde::{Deserialize, Serialize};

/// A frame sent from the client to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// VAD detected voice onset.
    SpeechStart,
    /// Complete utterance audio blob.
    SpeechEnd {
        /// Base64-encoded audio bytes, opaque to the orchestrator.
        audio: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    /// First audio chunk is now playing on the client.
    ClientPlaybackStarted,
    /// Audio queue drained on the client.
    ClientPlaybackComplete,
}

/// A frame sent from the orchestrator to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Session established.
    Connected { message: String, session_id: String },
    /// Enqueue and play this audio.
    PlayAudio { audio: String },
    /// Pause playback; the client retains its local queue for resume.
    StopPlayback {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Resume paused playback or process queued chunks.
    PlaybackResume,
    /// Discard all client-side audio (paused + queued).
    PlaybackReset,
    /// Informational: last recognized user turn.
    Transcript { text: String },
    /// Informational: agent's textual response.
    AgentResponse { text: String },
    /// Recoverable error notification.
    Error { message: String },
}

/// Decode a client frame from a single JSON text. Unknown `type` values or
/// malformed frames are reported as `None` so the caller can log-and-drop
/// per the protocol's tolerant-parsing rule, rather than tearing down the
/// session over a `ProtocolViolation`.
pub fn decode_client_frame(text: &str) -> Option<ClientFrame> {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(%err, "dropping malformed or unknown inbound frame");
            None
        }
    }
}

/// Encode a server frame to its wire JSON representation.
pub fn encode_server_frame(frame: &ServerFrame) -> String {
    serde_json::to_string(frame).expect("ServerFrame always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_start_round_trips() {
        let json = r#"{"type":"speech_start"}"#;
        let frame = decode_client_frame(json).expect("decodes");
        assert!(matches!(frame, ClientFrame::SpeechStart));
    }

    #[test]
    fn speech_end_carries_audio_and_optional_timestamp() {
        let json = r#"{"type":"speech_end","audio":"YWJj","timestamp":12345}"#;
        let frame = decode_client_frame(json).expect("decodes");
        match frame {
            ClientFrame::SpeechEnd { audio, timestamp } => {
                assert_eq!(audio, "YWJj");
                assert_eq!(timestamp, Some(12345));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"type":"speech_start","bogus_extra_field":true}"#;
        let frame = decode_client_frame(json).expect("decodes despite unknown field");
        assert!(matches!(frame, ClientFrame::SpeechStart));
    }

    #[test]
    fn unknown_type_is_dropped_not_fatal() {
        let json = r#"{"type":"frobnicate"}"#;
        assert!(decode_client_frame(json).is_none());
    }

    #[test]
    fn server_frame_stop_playback_omits_absent_message() {
        let frame = ServerFrame::StopPlayback { message: None };
        let json = encode_server_frame(&frame);
        assert_eq!(json, r#"{"event":"stop_playback"}"#);
    }

    #[test]
    fn server_frame_play_audio_encodes_event_tag() {
        let frame = ServerFrame::PlayAudio {
            audio: "ZGVmZw==".to_owned(),
        };
        let json = encode_server_frame(&frame);
        assert_eq!(json, r#"{"event":"play_audio","audio":"ZGVmZw=="}"#);
    }
}
