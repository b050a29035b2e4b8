//! Interruption Handler: reacts to the client signalling voice onset mid
//! response, and hands completed audio blobs to the STT Worker.
//!
//! Grounded on the teacher's barge-in control path in
//! `pipeline::coordinator` (`interrupt`/`assistant_speaking` flags and the
//! `PlaybackCommand::Stop` send, plus its `CancellationToken`-driven tool
//! teardown), generalized into §4.8's nine-step sequence and recorded here
//! rather than inline in the event router so the sequence reads as one
//! unit.

use crate::protocol::ServerFrame;
use crate::session::SessionContext;
use crate::status::{InterruptionStatus, PlaybackStatus};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Handle a `SpeechStart` frame: the client detected voice onset.
///
/// If the system is already idle, this is just the start of a fresh turn
/// and no interruption bookkeeping is needed. If an interruption is already
/// `Active`, a second rapid `speech_start` is a no-op (§8 boundary
/// behavior). Otherwise this runs the full nine-step sequence: snapshot the
/// client's playback state, pause it, and tear down every piece of state
/// the interrupted turn was still feeding — the agent cancel signal, all
/// registered tools, and the three queues downstream of the cancelled
/// turn — so nothing from it reaches the client while the Decision Task
/// is still waiting on the matching `SpeechEnd`.
pub async fn on_user_starts_speaking(ctx: &Arc<SessionContext>) {
    let pause_playback = {
        let mut state = ctx.state.lock().await;

        if state.interruption_status == InterruptionStatus::Active {
            return;
        }
        if state.is_system_idle() {
            return;
        }

        state.client_playback_was_active_before_interruption = state.client_playback_active;
        state.interruption_status = InterruptionStatus::Active;
        state.stt_output_list.clear();

        let pause = state.playback_status == PlaybackStatus::Active;
        if pause {
            state.playback_status = PlaybackStatus::Paused;
        }
        pause
    };

    ctx.agent_cancel.store(true, Ordering::SeqCst);
    ctx.tool_registry.cancel_all().await;
    ctx.audio_output_queue.clear().await;
    ctx.text_stream_queue.clear().await;
    ctx.stt_job_queue.clear().await;

    if pause_playback {
        ctx.emit(ServerFrame::StopPlayback { message: None });
    }
}

/// Handle a `SpeechEnd` frame: the client finished sending one complete
/// utterance blob. Queues it for transcription; classification of
/// false-alarm vs. new-input happens downstream in the Decision Task once
/// the STT Worker has produced text.
pub async fn on_user_ends_speaking(ctx: &Arc<SessionContext>, audio_blob: Vec<u8>) {
    ctx.stt_job_queue.push(audio_blob).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
    use crate::config::OrchestratorConfig;
    use crate::error::Result;
    use crate::history::ChatTurn;
    use crate::status::AgentStatus;
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
    struct NoopLlm;
    #[async_trait]
    impl LanguageModel for NoopLlm {
        async fn stream(
            &self,
            _h: &[ChatTurn],
            _t: Arc<ToolRegistry>,
            _c: Arc<AtomicBool>,
        ) -> Result<BoxStream<'static, Result<String>>> {
            Ok(Box::pin(stream::empty()))
        }
    }
    struct NoopTts;
    #[async_trait]
    impl TextToSpeech for NoopTts {
        async fn synthesize(&self, _s: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn test_ctx() -> Arc<SessionContext> {
        let (tx, _rx) = mpsc::unbounded_channel();
        SessionContext::new(
            "s".to_owned(),
            OrchestratorConfig::default(),
            Arc::new(SilentStt),
            Arc::new(NoopLlm),
            Arc::new(NoopTts),
            tx,
        )
    }

    #[tokio::test]
    async fn idle_system_ignores_speech_start() {
        let ctx = test_ctx();
        on_user_starts_speaking(&ctx).await;
        let state = ctx.state.lock().await;
        assert_eq!(state.interruption_status, InterruptionStatus::Idle);
    }

    #[tokio::test]
    async fn speech_start_during_active_playback_pauses_and_stops() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.agent_status = AgentStatus::Idle;
            state.response_in_progress = true;
            state.playback_status = PlaybackStatus::Active;
            state.client_playback_active = true;
        }
        on_user_starts_speaking(&ctx).await;
        let state = ctx.state.lock().await;
        assert_eq!(state.interruption_status, InterruptionStatus::Active);
        assert_eq!(state.playback_status, PlaybackStatus::Paused);
        assert!(state.client_playback_was_active_before_interruption);
    }

    #[tokio::test]
    async fn second_rapid_speech_start_is_a_no_op() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.response_in_progress = true;
            state.playback_status = PlaybackStatus::Active;
            state.client_playback_active = true;
        }
        on_user_starts_speaking(&ctx).await;
        {
            // Flip playback back to active as if a resume had raced in, to
            // prove the second call does not re-derive the snapshot.
            let mut state = ctx.state.lock().await;
            state.client_playback_active = false;
        }
        on_user_starts_speaking(&ctx).await;
        let state = ctx.state.lock().await;
        assert_eq!(state.interruption_status, InterruptionStatus::Active);
        assert!(
            state.client_playback_was_active_before_interruption,
            "the first call's snapshot must survive a no-op second call"
        );
    }

    #[tokio::test]
    async fn speech_start_clears_queues_and_cancels_agent_and_tools() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.response_in_progress = true;
            state.agent_status = AgentStatus::Streaming;
            state.stt_output_list.push("stale fragment".to_owned());
        }
        ctx.audio_output_queue
            .push(crate::queue::Sentineled::Item(vec![1, 2, 3]))
            .await;
        ctx.text_stream_queue
            .push(crate::queue::Sentineled::Item("stale sentence".to_owned()))
            .await;
        ctx.stt_job_queue.push(vec![4, 5, 6]).await;

        let cancelled = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let hook_flag = Arc::clone(&cancelled);
        ctx.tool_registry
            .register(
                "noop",
                Arc::new(move || hook_flag.store(true, Ordering::SeqCst)),
                serde_json::json!({}),
            )
            .await;

        on_user_starts_speaking(&ctx).await;

        assert!(!ctx.audio_output_queue.has_items().await);
        assert_eq!(ctx.text_stream_queue.len().await, 0);
        assert_eq!(ctx.stt_job_queue.len().await, 0);
        assert!(ctx.agent_cancel.load(Ordering::SeqCst));
        assert!(cancelled.load(Ordering::SeqCst));
        let state = ctx.state.lock().await;
        assert!(state.stt_output_list.is_empty());
    }

    #[tokio::test]
    async fn speech_end_enqueues_blob_without_touching_interruption_status() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.interruption_status = InterruptionStatus::Active;
        }
        on_user_ends_speaking(&ctx, vec![9, 9, 9]).await;
        let state = ctx.state.lock().await;
        assert_eq!(state.interruption_status, InterruptionStatus::Active);
        assert_eq!(ctx.stt_job_queue.len().await, 1);
    }
}
