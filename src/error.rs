//! Error types for the conversation orchestrator.

/// Top-level error type for the orchestrator core.
///
/// Variants correspond to the logical error kinds in the error-handling
/// design: `TransientExternal`, `ProtocolViolation`, `StateViolation`,
/// `Cancelled`, and `Fatal`. Worker-level errors are caught at the worker
/// boundary and never propagate into peer components' state; only `Fatal`
/// reaches session teardown.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// An STT/LLM/TTS collaborator call failed or timed out.
    #[error("{stage} call failed: {message}")]
    TransientExternal {
        /// Which stage's collaborator failed (`"stt"`, `"llm"`, `"tts"`).
        stage: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// A malformed inbound frame or unknown field was observed.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Decoding an inbound frame failed outright.
    #[error("malformed frame: {0}")]
    FrameDecode(#[from] serde_json::Error),

    /// An invariant was found broken (e.g. two live Agent Runners).
    #[error("state violation: {0}")]
    StateViolation(String),

    /// Cooperative cancellation was observed; unwind quietly.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The carrier disconnected or the session scheduler is down.
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
