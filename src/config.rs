//! Configuration types for the conversation orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Top-level configuration for one orchestrator instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Speech-to-text worker settings.
    pub stt: SttConfig,
    /// Decision task settings.
    pub decision: DecisionConfig,
    /// Bounded queue capacities.
    pub queue: QueueConfig,
    /// Backchannel classification settings.
    pub backchannel: BackchannelConfig,
    /// Language model settings.
    pub llm: LlmConfig,
    /// Text-to-speech worker settings.
    pub tts: TtsConfig,
    /// Tool execution settings.
    pub tool: ToolConfig,
    /// Chat history retention settings.
    pub history: HistoryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stt: SttConfig::default(),
            decision: DecisionConfig::default(),
            queue: QueueConfig::default(),
            backchannel: BackchannelConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
            tool: ToolConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Speech-to-text worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Blobs smaller than this are treated as likely silence and dropped
    /// without being sent to the transcription collaborator.
    ///
    /// The source value (~5000 bytes) is codec-dependent, so this is a
    /// configuration knob rather than a constant.
    pub min_blob_bytes: usize,
    /// Timeout for one `transcribe` call, in milliseconds.
    pub transcribe_timeout_ms: u64,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            min_blob_bytes: 5_000,
            transcribe_timeout_ms: 10_000,
        }
    }
}

/// Decision task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Debounce window in milliseconds, to let coalesced STT fragments
    /// accumulate before classifying.
    pub debounce_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

/// Bounded queue capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// STT-job queue capacity (audio blobs awaiting transcription).
    pub stt_job_cap: usize,
    /// Text-stream queue capacity (LLM sentences awaiting synthesis).
    pub text_stream_cap: usize,
    /// Audio-output queue capacity (synthesized audio awaiting egress).
    pub audio_output_cap: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            stt_job_cap: 8,
            text_stream_cap: 50,
            audio_output_cap: 20,
        }
    }
}

/// Backchannel classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackchannelConfig {
    /// Closed set of backchannel utterances (lower-cased, stripped).
    pub set: HashSet<String>,
}

impl Default for BackchannelConfig {
    fn default() -> Self {
        let set = [
            "uh-huh",
            "uhuh",
            "uh huh",
            "mm-hmm",
            "mmhmm",
            "mm hmm",
            "yeah",
            "yep",
            "yup",
            "okay",
            "ok",
            "k",
            "right",
            "sure",
            "got it",
            "i see",
            "go ahead",
        ]
        .into_iter()
        .map(str::to_owned)
        .collect();
        Self { set }
    }
}

/// Language model / agent runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Timeout for one LLM request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
        }
    }
}

/// Text-to-speech worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Timeout for one `synthesize` call, in milliseconds.
    pub synthesis_timeout_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_ms: 10_000,
        }
    }
}

/// Tool execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Grace period after a cancel request before a non-cooperative tool
    /// is considered abandoned, in milliseconds.
    pub cancel_grace_ms: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            cancel_grace_ms: 2_000,
        }
    }
}

/// Chat history retention configuration.
///
/// Not named explicitly in the enumerated configuration list, but called
/// for by the unbounded-growth design note: a maximum retained turn count
/// with oldest-first eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of turns retained in `chat_history`. `None` means
    /// unbounded.
    pub max_turns: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_turns: None }
    }
}
