//! In-flight tool execution registry with cooperative cancellation.
//!
//! This is a distinct thing from the teacher's `fae_llm::tools::registry`,
//! which is a *static* name → schema catalogue consulted once per LLM
//! request. This registry instead tracks *running* tool executions so an
//! interruption can cancel every one of them, grounded on the
//! `CancellationToken`-driven cancellation used throughout
//! `fae_llm::agent::loop_engine::AgentLoop`. Tool bodies hold only a
//! [`ToolId`] handle into this registry, never a reference back to the
//! Agent Runner, so there is no ownership cycle between tool bodies and
//! the runner (`fae::pipeline::coordinator`'s single-session ownership
//! style, not a process-wide singleton).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Opaque handle identifying one in-flight tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolId(String);

impl ToolId {
    fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-blocking, cooperative cancellation hook. Registry invocation must
/// not block; well-behaved hooks set a flag the tool body polls (e.g. a
/// `tokio_util::sync::CancellationToken::cancel`).
pub type CancelHook = Arc<dyn Fn() + Send + Sync>;

/// Debug/telemetry view of one registered tool execution.
#[derive(Clone)]
pub struct ActiveTool {
    pub id: ToolId,
    pub tool_name: String,
    pub metadata: serde_json::Value,
    pub started_at: Instant,
}

struct Entry {
    tool_name: String,
    cancel_hook: CancelHook,
    metadata: serde_json::Value,
    started_at: Instant,
}

/// Tracks in-flight tool executions for one session.
///
/// Owned by the session (never a process-wide singleton), so cancellation
/// can never leak across sessions.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Mutex<HashMap<ToolId, Entry>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly-started tool execution, returning its id.
    ///
    /// Must be called before the tool body produces any observable side
    /// effect, per the registry contract.
    pub async fn register(
        &self,
        tool_name: impl Into<String>,
        cancel_hook: CancelHook,
        metadata: serde_json::Value,
    ) -> ToolId {
        let id = ToolId::new();
        let entry = Entry {
            tool_name: tool_name.into(),
            cancel_hook,
            metadata,
            started_at: Instant::now(),
        };
        self.entries.lock().await.insert(id.clone(), entry);
        id
    }

    /// Unregister a completed (or cancelled-and-exited) tool execution.
    pub async fn unregister(&self, id: &ToolId) {
        self.entries.lock().await.remove(id);
    }

    /// Invoke the cancel hook for one specific tool, if still registered.
    pub async fn cancel(&self, id: &ToolId) {
        if let Some(entry) = self.entries.lock().await.get(id) {
            (entry.cancel_hook)();
        }
    }

    /// Invoke every currently-registered tool's cancel hook.
    ///
    /// Atomic with respect to new registrations: a registration either
    /// lands before this call takes the lock (and is cancelled here) or
    /// after it releases the lock (and is simply not part of this wave).
    pub async fn cancel_all(&self) {
        let entries = self.entries.lock().await;
        for entry in entries.values() {
            (entry.cancel_hook)();
        }
    }

    /// List currently-registered tool executions, in insertion order for
    /// debug display.
    pub async fn active(&self) -> Vec<ActiveTool> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .map(|(id, entry)| ActiveTool {
                id: id.clone(),
                tool_name: entry.tool_name.clone(),
                metadata: entry.metadata.clone(),
                started_at: entry.started_at,
            })
            .collect()
    }

    /// Number of currently-registered tool executions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
