//! Minimal end-to-end run of one clean conversational turn against
//! scripted fake collaborators, printing every frame the orchestrator
//! would have sent to a real client.
//!
//! Run with `cargo run --example clean_turn --features test-support`.

use antiphon_core::config::OrchestratorConfig;
use antiphon_core::orchestrator::Orchestrator;
use antiphon_core::protocol::{ClientFrame, ServerFrame};
use antiphon_core::test_support::{FakeLlm, FakeStt, FakeTts, LlmScript, SttScript};
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let stt = Arc::new(FakeStt::new([SttScript::Text("what time is it")]));
    let llm = Arc::new(FakeLlm::new([LlmScript::Tokens(vec![
        "It is",
        " five o'clock",
        ".",
    ])]));
    let tts = Arc::new(FakeTts);

    let (orchestrator, mut rx) = Orchestrator::spawn(
        "demo-session".to_owned(),
        OrchestratorConfig::default(),
        stt,
        llm,
        tts,
    );

    let audio = base64::engine::general_purpose::STANDARD.encode([0u8; 6_000]);
    orchestrator
        .handle_client_frame(ClientFrame::SpeechEnd { audio, timestamp: None })
        .await;

    let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(frame)) => print_frame(&frame),
            _ => break,
        }
    }

    orchestrator.shutdown().await;
}

fn print_frame(frame: &ServerFrame) {
    match frame {
        ServerFrame::Connected { session_id, .. } => println!("connected: {session_id}"),
        ServerFrame::Transcript { text } => println!("transcript: {text}"),
        ServerFrame::AgentResponse { text } => println!("agent: {text}"),
        ServerFrame::PlayAudio { audio } => println!("play_audio: {} bytes (base64)", audio.len()),
        ServerFrame::StopPlayback { .. } => println!("stop_playback"),
        ServerFrame::PlaybackResume => println!("playback_resume"),
        ServerFrame::PlaybackReset => println!("playback_reset"),
        ServerFrame::Error { message } => println!("error: {message}"),
    }
}
