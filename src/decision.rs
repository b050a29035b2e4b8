//! Decision Task: the debounced single-shot task that classifies the
//! accumulated utterance and either dispatches a new agent run or
//! resolves a false alarm by resuming playback.
//!
//! Grounded on the teacher's conversation-gate and queue-clearing logic in
//! `pipeline::coordinator`, generalized to the spec's full
//! classify/reconcile/dispatch state machine.

use crate::agent_runner;
use crate::history::Role;
use crate::prompt;
use crate::protocol::ServerFrame;
use crate::session::SessionContext;
use crate::status::{AgentStatus, InterruptionStatus, PlaybackStatus};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Run one Decision Task invocation: debounce, then classify and act.
///
/// Single-shot per trigger; the caller (STT Worker) is responsible for not
/// spawning a second one while this is live, via
/// `SessionState::decision_task_live`.
pub async fn run(ctx: Arc<SessionContext>) {
    tokio::time::sleep(Duration::from_millis(ctx.config.decision.debounce_ms)).await;

    let (under_interruption, utterance, stand_down) = {
        let state = ctx.state.lock().await;
        let busy = matches!(state.agent_status, AgentStatus::Processing | AgentStatus::Streaming)
            && state.interruption_status != InterruptionStatus::Active;
        (
            state.interruption_status.is_under_interruption(),
            prompt::merge(&state.stt_output_list),
            busy,
        )
    };

    if stand_down {
        // The agent is busy with a prior turn and we are not resolving an
        // interruption; the STT worker will retrigger us once more
        // fragments arrive or the agent finishes.
        let mut state = ctx.state.lock().await;
        state.decision_task_live = false;
        return;
    }

    if utterance.is_empty() {
        if under_interruption {
            resolve_false_alarm(&ctx).await;
        }
        // Outside interruption, an empty utterance is a no-op: nothing was
        // said worth acting on, and boundary behavior requires no history
        // mutation and no transcript frame in this case.
        let mut state = ctx.state.lock().await;
        state.stt_output_list.clear();
        state.decision_task_live = false;
        return;
    }

    let is_false_alarm = under_interruption && prompt::is_backchannel(&utterance, &ctx.config.backchannel);

    if is_false_alarm {
        resolve_false_alarm(&ctx).await;
        let mut state = ctx.state.lock().await;
        state.stt_output_list.clear();
        state.decision_task_live = false;
        return;
    }

    // New-input path.
    dispatch_new_turn(&ctx, &utterance, under_interruption).await;
    let mut state = ctx.state.lock().await;
    state.decision_task_live = false;
}

/// New-input execution: reconcile history, clear fragments, cancel any
/// stale agent run for safety, clear the audio-output queue, bump the
/// generation, reset statuses, and spawn a fresh Agent Runner over a
/// snapshot of history.
async fn dispatch_new_turn(ctx: &Arc<SessionContext>, utterance: &str, under_interruption: bool) {
    ctx.agent_cancel.store(true, Ordering::SeqCst);
    ctx.tool_registry.cancel_all().await;
    ctx.audio_output_queue.clear().await;

    let (generation_id, history_snapshot) = {
        let mut state = ctx.state.lock().await;
        prompt::reconcile(&mut state.history, utterance, under_interruption);
        state.stt_output_list.clear();

        state.generation_id += 1;
        state.playback_status = PlaybackStatus::Idle;
        state.client_playback_active = false;
        state.client_playback_was_active_before_interruption = false;
        state.agent_status = AgentStatus::Processing;
        state.interruption_status = InterruptionStatus::Idle;
        state.response_in_progress = true;
        state.agent_runner_live = true;

        (state.generation_id, state.history.snapshot())
    };

    ctx.emit(ServerFrame::Transcript {
        text: utterance.to_owned(),
    });
    ctx.agent_cancel.store(false, Ordering::SeqCst);

    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        agent_runner::run(ctx, generation_id, history_snapshot).await;
    });
}

/// False-alarm resolution per Table 1 (spec.md §4.4 step 6): the
/// interruption was a backchannel or silence, so the session is steered
/// back toward wherever it would have been had the interruption never
/// happened, rather than generating a fresh response.
///
/// The barge-in handler already cancelled the interrupted agent run
/// unconditionally on `speech_start` (§4.8), so a false alarm never has a
/// live run left to resume — only its *audio* can potentially resume
/// (whatever already reached the client's local queue before it paused).
/// If nothing was ever playing and the interrupted turn's user message is
/// still unanswered, the only way to recover the response is to retry it
/// as a fresh agent run.
async fn resolve_false_alarm(ctx: &Arc<SessionContext>) {
    let anything_left = ctx.audio_output_queue.has_items().await;

    let mut state = ctx.state.lock().await;
    let was_active_before = state.client_playback_was_active_before_interruption;
    let mut retry_snapshot = None;

    match state.playback_status {
        PlaybackStatus::Paused => {
            ctx.emit(ServerFrame::PlaybackResume);
            state.playback_status = if anything_left {
                PlaybackStatus::Active
            } else {
                PlaybackStatus::Idle
            };
            state.client_playback_active = true;
        }
        PlaybackStatus::Idle if was_active_before => {
            // The client was still playing when speech-start arrived, even
            // though the server's own mirror had already rolled to Idle;
            // let the client decide whether it still has audio queued.
            ctx.emit(ServerFrame::PlaybackResume);
        }
        PlaybackStatus::Idle => {
            // Nothing was ever playing, so there is nothing to resume. The
            // interrupted turn's generation was already cancelled at
            // speech-start, so if a user turn is still waiting on a
            // response, the only way to produce one is to retry it fresh.
            if matches!(state.history.last_role(), Some(Role::User)) {
                state.generation_id += 1;
                state.agent_status = AgentStatus::Processing;
                state.response_in_progress = true;
                state.agent_runner_live = true;
                retry_snapshot = Some((state.generation_id, state.history.snapshot()));
            }
        }
        PlaybackStatus::Active => {
            // Already resumed elsewhere; no client-facing frame is owed.
        }
    }

    state.interruption_status = InterruptionStatus::Idle;
    state.client_playback_was_active_before_interruption = false;
    drop(state);

    if let Some((generation_id, history_snapshot)) = retry_snapshot {
        ctx.emit(ServerFrame::PlaybackReset);
        ctx.agent_cancel.store(false, Ordering::SeqCst);
        let ctx = Arc::clone(ctx);
        tokio::spawn(async move {
            agent_runner::run(ctx, generation_id, history_snapshot).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
    use crate::config::OrchestratorConfig;
    use crate::error::Result;
    use crate::history::ChatTurn;
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
            _history: &[ChatTurn],
            _tools: Arc<ToolRegistry>,
            _cancel: Arc<AtomicBool>,
        ) -> Result<BoxStream<'static, Result<String>>> {
            Ok(Box::pin(stream::empty()))
        }
    }

    struct NoopTts;
    #[async_trait]
    impl TextToSpeech for NoopTts {
        async fn synthesize(&self, _sentence: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn test_ctx() -> Arc<SessionContext> {
        let (tx, _rx) = mpsc::unbounded_channel();
        SessionContext::new(
            "test-session".to_owned(),
            OrchestratorConfig::default(),
            Arc::new(SilentStt),
            Arc::new(NoopLlm),
            Arc::new(NoopTts),
            tx,
        )
    }

    #[tokio::test]
    async fn empty_utterance_outside_interruption_is_a_no_op() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.decision_task_live = true;
        }
        run(Arc::clone(&ctx)).await;
        let state = ctx.state.lock().await;
        assert!(!state.decision_task_live);
        assert_eq!(state.history.len(), 0);
        assert_eq!(state.generation_id, 0);
    }

    #[tokio::test]
    async fn busy_agent_stands_down_without_dispatch() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.decision_task_live = true;
            state.agent_status = AgentStatus::Streaming;
            state.stt_output_list.push("more words".to_owned());
        }
        run(Arc::clone(&ctx)).await;
        let state = ctx.state.lock().await;
        assert!(!state.decision_task_live);
        assert_eq!(state.generation_id, 0);
    }

    #[tokio::test]
    async fn new_input_outside_interruption_dispatches_and_bumps_generation() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.decision_task_live = true;
            state.stt_output_list.push("tell me a joke".to_owned());
        }
        run(Arc::clone(&ctx)).await;
        // Give the spawned agent runner a tick to reach its idle exit.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = ctx.state.lock().await;
        assert!(!state.decision_task_live);
        assert_eq!(state.generation_id, 1);
        assert_eq!(state.history.last().unwrap().content, "tell me a joke");
    }

    #[tokio::test]
    async fn backchannel_under_interruption_resolves_without_new_turn() {
        let ctx = test_ctx();
        {
            let mut state = ctx.state.lock().await;
            state.decision_task_live = true;
            state.interruption_status = InterruptionStatus::Active;
            state.playback_status = PlaybackStatus::Paused;
            state.stt_output_list.push("okay".to_owned());
        }
        ctx.audio_output_queue
            .push(crate::queue::Sentineled::Item(vec![1, 2, 3]))
            .await;

        run(Arc::clone(&ctx)).await;
        let state = ctx.state.lock().await;
        assert!(!state.decision_task_live);
        assert_eq!(state.generation_id, 0);
        assert_eq!(state.interruption_status, InterruptionStatus::Idle);
        assert_eq!(state.playback_status, PlaybackStatus::Active);
    }
}
