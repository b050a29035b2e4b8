//! TTS Worker: drains the text-stream queue, synthesizes each sentence,
//! and forwards the audio to the audio-output queue for the Egress Pump.
//!
//! Grounded on the teacher's `run_tts_stage` task shape in
//! `pipeline::coordinator` — a loop that pops from an inbound channel,
//! calls into a collaborator, and restores its own status on failure
//! without propagating the error past this stage, per spec §4.6's
//! "log and skip the sentence" rule.

use crate::queue::Sentineled;
use crate::session::SessionContext;
use crate::status::TtsStatus;
use std::sync::Arc;
use std::time::Duration;

/// Run the TTS worker loop until the session is cancelled.
pub async fn run(ctx: Arc<SessionContext>) {
    loop {
        let item = tokio::select! {
            () = ctx.cancel.cancelled() => break,
            item = ctx.text_stream_queue.pop() => item,
        };

        let sentence = match item {
            Sentineled::Sentinel => {
                ctx.audio_output_queue.push(Sentineled::Sentinel).await;
                continue;
            }
            Sentineled::Item(sentence) => sentence,
        };

        {
            let mut state = ctx.state.lock().await;
            state.tts_status = TtsStatus::Processing;
        }

        let timeout = Duration::from_millis(ctx.config.tts.synthesis_timeout_ms);
        match tokio::time::timeout(timeout, ctx.tts.synthesize(&sentence)).await {
            Ok(Ok(audio)) => {
                ctx.audio_output_queue.push(Sentineled::Item(audio)).await;
                let mut state = ctx.state.lock().await;
                state.tts_status = TtsStatus::Idle;
            }
            Ok(Err(err)) => {
                tracing::warn!(session = %ctx.session_id, %err, "tts synthesis failed, skipping sentence");
                let mut state = ctx.state.lock().await;
                state.tts_status = TtsStatus::Idle;
            }
            Err(_) => {
                tracing::warn!(session = %ctx.session_id, timeout_ms = ctx.config.tts.synthesis_timeout_ms, "tts synthesis timed out, skipping sentence");
                let mut state = ctx.state.lock().await;
                state.tts_status = TtsStatus::Idle;
            }
        }
    }
}
