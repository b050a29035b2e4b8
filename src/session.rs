//! Per-session shared state and the context bundle every worker task
//! receives a clone of.
//!
//! Shared mutable state (statuses, booleans, history) lives behind one
//! `tokio::sync::Mutex`, matching the "per-session mutex" discipline in
//! the concurrency model — every component serializes through it rather
//! than reading atomics independently, so a status read can never
//! interleave with the mutation that produced it.

use crate::collaborators::{LanguageModel, SpeechToText, TextToSpeech};
use crate::config::OrchestratorConfig;
use crate::history::ChatHistory;
use crate::protocol::ServerFrame;
use crate::queue::{BoundedQueue, Sentineled};
use crate::status::{AgentStatus, InterruptionStatus, PlaybackStatus, SttStatus, StatusSnapshot, TtsStatus};
use crate::tool_registry::ToolRegistry;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Everything the data model calls a "session state" field, guarded by
/// the session mutex.
pub struct SessionState {
    pub stt_status: SttStatus,
    pub agent_status: AgentStatus,
    pub tts_status: TtsStatus,
    pub playback_status: PlaybackStatus,
    pub interruption_status: InterruptionStatus,
    pub client_playback_active: bool,
    pub client_playback_was_active_before_interruption: bool,
    pub response_in_progress: bool,
    pub generation_id: u64,
    pub current_audio_generation_tag: u64,
    pub history: ChatHistory,
    pub stt_output_list: Vec<String>,
    pub decision_task_live: bool,
    pub agent_runner_live: bool,
}

impl SessionState {
    fn new(max_history_turns: Option<usize>) -> Self {
        Self {
            stt_status: SttStatus::Idle,
            agent_status: AgentStatus::Idle,
            tts_status: TtsStatus::Idle,
            playback_status: PlaybackStatus::Idle,
            interruption_status: InterruptionStatus::Idle,
            client_playback_active: false,
            client_playback_was_active_before_interruption: false,
            response_in_progress: false,
            generation_id: 0,
            current_audio_generation_tag: 0,
            history: ChatHistory::new(max_history_turns),
            stt_output_list: Vec::new(),
            decision_task_live: false,
            agent_runner_live: false,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            stt: self.stt_status,
            agent: self.agent_status,
            tts: self.tts_status,
            playback: self.playback_status,
            interruption: self.interruption_status,
            client_playback_active: self.client_playback_active,
            response_in_progress: self.response_in_progress,
        }
    }

    pub fn is_system_idle(&self) -> bool {
        self.snapshot().is_system_idle()
    }
}

/// Resources shared by every worker task of one session. Cheap to clone
/// (an `Arc`), so each `tokio::spawn`'d stage gets its own handle.
pub struct SessionContext {
    pub session_id: String,
    pub config: OrchestratorConfig,
    pub state: Mutex<SessionState>,
    pub stt_job_queue: BoundedQueue<Vec<u8>>,
    pub text_stream_queue: BoundedQueue<Sentineled<String>>,
    pub audio_output_queue: BoundedQueue<Sentineled<Vec<u8>>>,
    pub tool_registry: Arc<ToolRegistry>,
    pub stt: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
    pub outbound: mpsc::UnboundedSender<ServerFrame>,
    pub agent_cancel: Arc<AtomicBool>,
    pub cancel: CancellationToken,
}

impl SessionContext {
    pub fn new(
        session_id: String,
        config: OrchestratorConfig,
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn LanguageModel>,
        tts: Arc<dyn TextToSpeech>,
        outbound: mpsc::UnboundedSender<ServerFrame>,
    ) -> Arc<Self> {
        let stt_job_cap = config.queue.stt_job_cap;
        let text_stream_cap = config.queue.text_stream_cap;
        let audio_output_cap = config.queue.audio_output_cap;
        let max_turns = config.history.max_turns;
        Arc::new(Self {
            session_id,
            config,
            state: Mutex::new(SessionState::new(max_turns)),
            stt_job_queue: BoundedQueue::new(stt_job_cap),
            text_stream_queue: BoundedQueue::new(text_stream_cap),
            audio_output_queue: BoundedQueue::new(audio_output_cap),
            tool_registry: Arc::new(ToolRegistry::new()),
            stt,
            llm,
            tts,
            outbound,
            agent_cancel: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        })
    }

    /// Best-effort emission of an outbound frame; a closed channel means
    /// the carrier already disconnected, which is handled by session
    /// teardown rather than here.
    pub fn emit(&self, frame: ServerFrame) {
        if self.outbound.send(frame).is_err() {
            tracing::debug!(session = %self.session_id, "outbound channel closed, dropping frame");
        }
    }

    pub async fn is_system_idle(&self) -> bool {
        self.state.lock().await.is_system_idle()
    }
}
