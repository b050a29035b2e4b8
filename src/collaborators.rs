//! Service collaborator contracts (STT, LLM, TTS).
//!
//! These are the three external collaborators named in scope §6.2. The
//! carrier, provider SDKs, and client audio mechanics are assumed
//! implementations of these traits and are never modeled further by this
//! crate. Grounded on the teacher's `fae_llm::provider::ProviderAdapter`
//! trait-object pattern for pluggable backends.

use crate::error::Result;
use crate::history::ChatTurn;
use crate::tool_registry::ToolRegistry;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Transcribes one complete utterance audio blob.
///
/// No streaming: the spec treats STT as a single post-utterance call.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe `blob`, returning an empty string for silence/no speech.
    async fn transcribe(&self, blob: &[u8]) -> Result<String>;
}

/// Streams a response from the language model, given the conversation so
/// far.
///
/// Tool calls the model makes along the way are handled entirely inside
/// the implementation (which registers each tool execution with `tools`
/// for cooperative cancellation) and never surface to the caller — the
/// returned stream yields only text tokens, so the caller may treat
/// generation as linear token consumption.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Begin streaming a response. `cancel` is the session's
    /// `agent_cancel_signal`: the implementation polls it cooperatively
    /// between tokens and between tool calls, same as the runner does on
    /// the consuming side.
    async fn stream(
        &self,
        history: &[ChatTurn],
        tools: Arc<ToolRegistry>,
        cancel: Arc<AtomicBool>,
    ) -> Result<BoxStream<'static, Result<String>>>;
}

/// Synthesizes one sentence of text into audio.
///
/// No streaming within a sentence.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `sentence`, returning encoded audio bytes.
    async fn synthesize(&self, sentence: &str) -> Result<Vec<u8>>;
}
