//! STT Worker: drains the STT-job queue, transcribes, and feeds the
//! Decision Task.
//!
//! Grounded on the teacher's `run_stt_stage` task shape in
//! `pipeline::coordinator` — a loop that pops from an inbound channel,
//! calls into a collaborator, and restores its own status on both success
//! and failure without ever touching a peer component's state.

use crate::decision;
use crate::session::SessionContext;
use crate::status::SttStatus;
use std::sync::Arc;
use std::time::Duration;

/// Run the STT worker loop until the session is cancelled.
pub async fn run(ctx: Arc<SessionContext>) {
    loop {
        let blob = tokio::select! {
            () = ctx.cancel.cancelled() => break,
            blob = ctx.stt_job_queue.pop() => blob,
        };

        if blob.len() < ctx.config.stt.min_blob_bytes {
            tracing::debug!(
                session = %ctx.session_id,
                bytes = blob.len(),
                "dropping sub-threshold blob as likely silence"
            );
            maybe_spawn_decision_task(&ctx).await;
            continue;
        }

        {
            let mut state = ctx.state.lock().await;
            state.stt_status = SttStatus::Processing;
        }

        let timeout = Duration::from_millis(ctx.config.stt.transcribe_timeout_ms);
        match tokio::time::timeout(timeout, ctx.stt.transcribe(&blob)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                let mut state = ctx.state.lock().await;
                state.stt_output_list.push(text);
                state.stt_status = SttStatus::Idle;
            }
            Ok(Ok(_)) => {
                let mut state = ctx.state.lock().await;
                state.stt_status = SttStatus::Idle;
            }
            Ok(Err(err)) => {
                tracing::warn!(session = %ctx.session_id, %err, "stt transcription failed");
                let mut state = ctx.state.lock().await;
                state.stt_status = SttStatus::Idle;
            }
            Err(_) => {
                tracing::warn!(session = %ctx.session_id, timeout_ms = ctx.config.stt.transcribe_timeout_ms, "stt transcription timed out");
                let mut state = ctx.state.lock().await;
                state.stt_status = SttStatus::Idle;
            }
        }

        maybe_spawn_decision_task(&ctx).await;
    }
}

/// Spawn a Decision Task if none is currently live, enforcing the
/// at-most-one-live invariant via the session lock.
async fn maybe_spawn_decision_task(ctx: &Arc<SessionContext>) {
    let mut state = ctx.state.lock().await;
    if state.decision_task_live {
        return;
    }
    state.decision_task_live = true;
    drop(state);

    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        decision::run(ctx).await;
    });
}
