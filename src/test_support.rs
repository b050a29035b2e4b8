//! Scripted fake collaborators for exercising the orchestrator without a
//! real speech/LLM/TTS backend.
//!
//! Grounded on the channel-driven fakes used throughout
//! `fae_llm::agent`'s own test modules and the teacher's `test_utils`
//! convention of small, purpose-built helpers rather than a generic mock
//! framework.

use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
use crate::error::{OrchestratorError, Result};
use crate::history::ChatTurn;
use crate::tool_registry::ToolRegistry;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A scripted transcription result, queued in call order.
pub enum SttScript {
    Text(&'static str),
    Fail(&'static str),
}

/// Transcribes by popping the next scripted result; panics if the script
/// runs dry, since an unscripted call means the test under-specified its
/// expectations.
pub struct FakeStt {
    script: Mutex<VecDeque<SttScript>>,
}

impl FakeStt {
    pub fn new(script: impl IntoIterator<Item = SttScript>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _blob: &[u8]) -> Result<String> {
        match self.script.lock().await.pop_front() {
            Some(SttScript::Text(text)) => Ok(text.to_owned()),
            Some(SttScript::Fail(message)) => Err(OrchestratorError::TransientExternal {
                stage: "stt",
                message: message.to_owned(),
            }),
            None => panic!("FakeStt script exhausted"),
        }
    }
}

/// One scripted LLM turn: a sequence of tokens to stream, or an outright
/// failure to start the stream.
pub enum LlmScript {
    Tokens(Vec<&'static str>),
    Fail(&'static str),
}

/// Streams the next scripted turn's tokens in order; panics if the script
/// runs dry.
pub struct FakeLlm {
    script: Mutex<VecDeque<LlmScript>>,
}

impl FakeLlm {
    pub fn new(script: impl IntoIterator<Item = LlmScript>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn stream(
        &self,
        _history: &[ChatTurn],
        _tools: Arc<ToolRegistry>,
        _cancel: Arc<AtomicBool>,
    ) -> Result<BoxStream<'static, Result<String>>> {
        match self.script.lock().await.pop_front() {
            Some(LlmScript::Tokens(tokens)) => {
                let items: Vec<Result<String>> = tokens.into_iter().map(|t| Ok(t.to_owned())).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Some(LlmScript::Fail(message)) => Err(OrchestratorError::TransientExternal {
                stage: "llm",
                message: message.to_owned(),
            }),
            None => panic!("FakeLlm script exhausted"),
        }
    }
}

/// Synthesizes by returning the sentence's bytes as "audio", so assertions
/// can decode the fake audio payload back into the text it stands for.
#[derive(Default)]
pub struct FakeTts;

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, sentence: &str) -> Result<Vec<u8>> {
        Ok(sentence.as_bytes().to_vec())
    }
}
