//! Session lifecycle and the Event Router: the crate's single public entry
//! point for driving one conversation session end to end.
//!
//! Grounded on the teacher's `PipelineCoordinator::run`
//! (`pipeline::coordinator`) — one struct owning the shared context,
//! spawning one task per stage, and joining them all on teardown.

use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
use crate::config::OrchestratorConfig;
use crate::interruption;
use crate::protocol::{ClientFrame, ServerFrame};
use crate::session::SessionContext;
use crate::status::PlaybackStatus;
use base64::Engine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Owns one session's shared context and worker tasks.
pub struct Orchestrator {
    ctx: Arc<SessionContext>,
    handles: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Spawn a new session: creates the shared context, starts the STT
    /// Worker, TTS Worker, and Egress Pump tasks, and returns the handle
    /// plus the outbound frame receiver the carrier should forward to the
    /// client.
    ///
    /// The Decision Task and Agent Runner are not long-lived tasks; they
    /// are spawned on demand by the STT Worker and Decision Task
    /// respectively, per the data model's "at most one live" invariant.
    pub fn spawn(
        session_id: String,
        config: OrchestratorConfig,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerFrame>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(session_id, config, stt, llm, tts, outbound_tx);

        ctx.emit(ServerFrame::Connected {
            message: "ready".to_owned(),
            session_id: ctx.session_id.clone(),
        });

        let mut handles = Vec::with_capacity(3);
        handles.push(tokio::spawn(crate::stt_worker::run(Arc::clone(&ctx))));
        handles.push(tokio::spawn(crate::tts_worker::run(Arc::clone(&ctx))));
        handles.push(tokio::spawn(crate::egress::run(Arc::clone(&ctx))));

        (Arc::new(Self { ctx, handles }), outbound_rx)
    }

    /// Dispatch one inbound client frame. This is the Event Router: each
    /// frame variant is handled exhaustively, with no default arm, so
    /// adding a frame variant without updating this match is a compile
    /// error rather than a silently-dropped frame.
    pub async fn handle_client_frame(&self, frame: ClientFrame) {
        match frame {
            ClientFrame::SpeechStart => {
                interruption::on_user_starts_speaking(&self.ctx).await;
            }
            ClientFrame::SpeechEnd { audio, .. } => {
                match base64::engine::general_purpose::STANDARD.decode(audio) {
                    Ok(blob) => interruption::on_user_ends_speaking(&self.ctx, blob).await,
                    Err(err) => {
                        tracing::warn!(session = %self.ctx.session_id, %err, "speech_end carried malformed base64 audio");
                    }
                }
            }
            ClientFrame::ClientPlaybackStarted => {
                let mut state = self.ctx.state.lock().await;
                state.client_playback_active = true;
                state.playback_status = PlaybackStatus::Active;
            }
            ClientFrame::ClientPlaybackComplete => {
                let mut state = self.ctx.state.lock().await;
                state.client_playback_active = false;
                state.playback_status = PlaybackStatus::Idle;
                state.response_in_progress = false;
            }
        }
    }

    /// Decode and dispatch a raw inbound frame in one step; malformed or
    /// unrecognized frames are logged and dropped, never fatal.
    pub async fn handle_client_text(&self, text: &str) {
        if let Some(frame) = crate::protocol::decode_client_frame(text) {
            self.handle_client_frame(frame).await;
        }
    }

    /// True iff no stage is active, no client playback is underway, and no
    /// response is in flight.
    pub async fn is_system_idle(&self) -> bool {
        self.ctx.is_system_idle().await
    }

    /// Tear down the session: cancel every worker task, cancel any
    /// in-flight tool executions, and join all handles.
    ///
    /// Per §4.11: (1) flip the cancellation token so worker loops exit at
    /// their next await point, (2) set the agent cancel signal so a live
    /// LLM stream unwinds, (3) cancel every in-flight tool, (4) join every
    /// spawned task, (5) drop the context.
    pub async fn shutdown(self: Arc<Self>) {
        self.ctx.cancel.cancel();
        self.ctx.agent_cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        self.ctx.tool_registry.cancel_all().await;

        let orchestrator = match Arc::try_unwrap(self) {
            Ok(orchestrator) => orchestrator,
            Err(shared) => {
                tracing::warn!(session = %shared.ctx.session_id, "shutdown called with outstanding Orchestrator references");
                return;
            }
        };

        for handle in orchestrator.handles {
            if let Err(err) = handle.await {
                tracing::warn!(%err, "worker task panicked during shutdown");
            }
        }
    }
}
