//! Egress Pump: drains the audio-output queue and forwards each chunk to
//! the client as a `PlayAudio` frame.
//!
//! Deliberately thin: it does not set `client_playback_active` or
//! `playback_status` itself (per §4.7 the client is the authority on
//! playback state — the orchestrator hears about it from
//! `ClientPlaybackStarted`/`ClientPlaybackComplete` instead), grounded on
//! the teacher's `run_playback_stage`, which only forwards frames and
//! leaves control-plane bookkeeping to the event router.

use crate::protocol::ServerFrame;
use crate::queue::Sentineled;
use crate::session::SessionContext;
use base64::Engine;
use std::sync::Arc;

/// Run the egress pump loop until the session is cancelled.
pub async fn run(ctx: Arc<SessionContext>) {
    loop {
        let item = tokio::select! {
            () = ctx.cancel.cancelled() => break,
            item = ctx.audio_output_queue.pop() => item,
        };

        let audio = match item {
            Sentineled::Sentinel => continue,
            Sentineled::Item(audio) => audio,
        };

        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        ctx.emit(ServerFrame::PlayAudio { audio: encoded });
    }
}
