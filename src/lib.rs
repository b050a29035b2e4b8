//! Interruption-aware conversation orchestrator core for a full-duplex
//! voice assistant: the per-session state machine and concurrent pipeline
//! coordinating speech-to-text, a tool-calling language model, and
//! text-to-speech behind a barge-in-aware interruption protocol.
//!
//! The carrier (WebSocket transport, HTTP bootstrap), provider SDKs, and
//! client-side audio capture/playback are external collaborators reached
//! only through the traits in [`collaborators`]; this crate owns none of
//! them.

pub mod agent_runner;
pub mod collaborators;
pub mod config;
pub mod decision;
pub mod egress;
pub mod error;
pub mod history;
pub mod interruption;
pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod status;
pub mod stt_worker;
pub mod tool_registry;
pub mod tts_worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use collaborators::{LanguageModel, SpeechToText, TextToSpeech};
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};
pub use history::{ChatHistory, ChatTurn, Role};
pub use orchestrator::Orchestrator;
pub use protocol::{ClientFrame, ServerFrame};
