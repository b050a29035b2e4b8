//! Agent Runner: drives one LLM streaming turn, batches tokens into
//! sentences for the TTS worker, and reconciles the final response into
//! chat history once its generation is still the current one.
//!
//! Grounded on the teacher's streamed-token accumulation in
//! `fae_llm::agent::accumulator` and `loop_engine::AgentLoop::run`, which
//! already distinguish a live run from a stale/cancelled one before
//! committing any side effect.

use crate::error::OrchestratorError;
use crate::history::ChatTurn;
use crate::protocol::ServerFrame;
use crate::queue::Sentineled;
use crate::session::SessionContext;
use crate::status::AgentStatus;
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Run one agent turn for `generation_id` over the given history snapshot.
///
/// If a newer generation has superseded this one by the time any await
/// point is reached, the run abandons silently: no further frames, no
/// history mutation, no status write. This is the "late runner must not
/// corrupt a newer run" guarantee.
pub async fn run(ctx: Arc<SessionContext>, generation_id: u64, history_snapshot: Vec<ChatTurn>) {
    if !is_current(&ctx, generation_id).await {
        return;
    }

    let request_timeout = Duration::from_millis(ctx.config.llm.request_timeout_ms);
    let stream_start = tokio::time::timeout(
        request_timeout,
        ctx.llm
            .stream(&history_snapshot, Arc::clone(&ctx.tool_registry), Arc::clone(&ctx.agent_cancel)),
    )
    .await;

    let mut stream = match stream_start {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            tracing::warn!(session = %ctx.session_id, %err, "llm stream failed to start");
            finish(&ctx, generation_id, None).await;
            return;
        }
        Err(_) => {
            tracing::warn!(session = %ctx.session_id, timeout_ms = ctx.config.llm.request_timeout_ms, "llm stream failed to start: timed out");
            finish(&ctx, generation_id, None).await;
            return;
        }
    };

    {
        let mut state = ctx.state.lock().await;
        if state.generation_id != generation_id {
            return;
        }
        state.agent_status = AgentStatus::Streaming;
    }

    let mut sentence_buf = String::new();
    let mut full_response = String::new();

    loop {
        if ctx.agent_cancel.load(Ordering::SeqCst) || !is_current(&ctx, generation_id).await {
            return;
        }

        let next = match tokio::time::timeout(request_timeout, stream.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(OrchestratorError::TransientExternal {
                stage: "llm",
                message: "token stream timed out".to_owned(),
            })),
        };

        let Some(next) = next else { break };

        match next {
            Ok(token) => {
                sentence_buf.push_str(&token);
                full_response.push_str(&token);
                if ends_sentence(&sentence_buf) {
                    let sentence = std::mem::take(&mut sentence_buf);
                    ctx.text_stream_queue.push(Sentineled::Item(sentence)).await;
                }
            }
            Err(err) => {
                tracing::warn!(session = %ctx.session_id, %err, "llm stream token failed");
                break;
            }
        }
    }

    if !is_current(&ctx, generation_id).await {
        return;
    }

    if !sentence_buf.trim().is_empty() {
        ctx.text_stream_queue.push(Sentineled::Item(sentence_buf)).await;
    }
    ctx.text_stream_queue.push(Sentineled::Sentinel).await;

    let response = (!full_response.is_empty()).then_some(full_response);
    finish(&ctx, generation_id, response).await;
}

/// True iff `generation_id` still matches the session's current generation.
async fn is_current(ctx: &Arc<SessionContext>, generation_id: u64) -> bool {
    ctx.state.lock().await.generation_id == generation_id
}

/// Commit the final response (if any) to history and restore agent status,
/// gated on the generation still being current.
async fn finish(ctx: &Arc<SessionContext>, generation_id: u64, response: Option<String>) {
    let mut state = ctx.state.lock().await;
    if state.generation_id != generation_id {
        return;
    }
    state.agent_status = AgentStatus::Idle;
    state.agent_runner_live = false;

    if let Some(text) = response {
        state.history.push(ChatTurn::agent(text.clone()));
        drop(state);
        ctx.emit(ServerFrame::AgentResponse { text });
    }
}

/// A sentence boundary is any run of text ending (after trimming trailing
/// whitespace) in one of the spec's terminal punctuation marks.
fn ends_sentence(buf: &str) -> bool {
    matches!(buf.trim_end().chars().last(), Some('.' | '!' | '?' | '\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
    use crate::config::OrchestratorConfig;
    use crate::error::{OrchestratorError, Result};
    use crate::tool_registry::ToolRegistry;
    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream};
    use std::sync::atomic::AtomicBool;
    use tokio::sync::mpsc;

    struct SilentStt;
    #[async_trait]
    impl SpeechToText for SilentStt {
        async fn transcribe(&self, _blob: &[u8]) -> Result<String> {
            Ok(String::new())
        }
    }

    struct NoopTts;
    #[async_trait]
    impl TextToSpeech for NoopTts {
        async fn synthesize(&self, _sentence: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    struct ScriptedLlm {
        tokens: Vec<&'static str>,
    }
    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn stream(
            &self,
            _history: &[ChatTurn],
            _tools: Arc<ToolRegistry>,
            _cancel: Arc<AtomicBool>,
        ) -> Result<BoxStream<'static, Result<String>>> {
            let items: Vec<Result<String>> = self.tokens.iter().map(|t| Ok((*t).to_owned())).collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    struct FailingLlm;
    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn stream(
            &self,
            _history: &[ChatTurn],
            _tools: Arc<ToolRegistry>,
            _cancel: Arc<AtomicBool>,
        ) -> Result<BoxStream<'static, Result<String>>> {
            Err(OrchestratorError::TransientExternal {
                stage: "llm",
                message: "connection refused".to_owned(),
            })
        }
    }

    fn test_ctx(llm: Arc<dyn LanguageModel>) -> Arc<SessionContext> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(
            "test-session".to_owned(),
            OrchestratorConfig::default(),
            Arc::new(SilentStt),
            llm,
            Arc::new(NoopTts),
            tx,
        );
        ctx
    }

    #[tokio::test]
    async fn streams_tokens_and_batches_on_terminal_punctuation() {
        let llm = Arc::new(ScriptedLlm {
            tokens: vec!["Hello", " there", ".", " How are you", "?"],
        });
        let ctx = test_ctx(llm);
        {
            let mut state = ctx.state.lock().await;
            state.generation_id = 1;
        }

        run(Arc::clone(&ctx), 1, Vec::new()).await;

        assert_eq!(
            ctx.text_stream_queue.pop().await,
            Sentineled::Item("Hello there.".to_owned())
        );
        assert_eq!(
            ctx.text_stream_queue.pop().await,
            Sentineled::Item(" How are you?".to_owned())
        );
        assert!(ctx.text_stream_queue.pop().await.is_sentinel());

        let state = ctx.state.lock().await;
        assert_eq!(state.agent_status, AgentStatus::Idle);
        assert_eq!(state.history.last().unwrap().content, "Hello there. How are you?");
    }

    #[tokio::test]
    async fn stale_generation_abandons_without_touching_history() {
        let llm = Arc::new(ScriptedLlm { tokens: vec!["late"] });
        let ctx = test_ctx(llm);
        {
            let mut state = ctx.state.lock().await;
            state.generation_id = 2;
        }

        run(Arc::clone(&ctx), 1, Vec::new()).await;

        assert_eq!(ctx.text_stream_queue.len().await, 0);
        let state = ctx.state.lock().await;
        assert_eq!(state.history.len(), 0);
    }

    #[tokio::test]
    async fn failed_stream_start_restores_idle_without_response() {
        let ctx = test_ctx(Arc::new(FailingLlm));
        {
            let mut state = ctx.state.lock().await;
            state.generation_id = 1;
        }

        run(Arc::clone(&ctx), 1, Vec::new()).await;

        let state = ctx.state.lock().await;
        assert_eq!(state.agent_status, AgentStatus::Idle);
        assert_eq!(state.history.len(), 0);
    }
}
