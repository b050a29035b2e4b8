//! Pure prompt-generation helpers: merging transcripts, classifying
//! backchannels, and reconciling chat history across an interruption.
//!
//! No state beyond configuration, grounded on the teacher's
//! `append_collected_text`/whitespace-collapsing helpers in
//! `pipeline::coordinator`.

use crate::config::BackchannelConfig;
use crate::history::{ChatHistory, ChatTurn, Role};

/// Join transcript fragments into a single utterance, collapsing internal
/// whitespace runs to single spaces and trimming the ends.
pub fn merge(transcripts: &[String]) -> String {
    transcripts
        .iter()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if `utterance` should be treated as a backchannel acknowledgement
/// rather than a real input — only meaningful when applied under an
/// active interruption (§4.4 step 3: backchannel detection is never
/// applied to a fresh, non-interrupting turn).
pub fn is_backchannel(utterance: &str, config: &BackchannelConfig) -> bool {
    let normalized = utterance.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if config.set.contains(&normalized) {
        return true;
    }
    let token_count = normalized.split_whitespace().count();
    token_count <= 2 && config.set.iter().any(|bc| normalized.contains(bc.as_str()))
}

/// Reconcile the merged utterance into chat history for a new-input path.
///
/// Under interruption: drop a trailing agent turn (it was cancelled before
/// completion), then either amend the new trailing user turn or append a
/// fresh one. Outside interruption: always append a fresh user turn.
pub fn reconcile(history: &mut ChatHistory, utterance: &str, under_interruption: bool) {
    if !under_interruption {
        history.push(ChatTurn::user(utterance));
        return;
    }

    history.pop_last_if_role(Role::Agent);

    if !history.amend_last_if_role(Role::User, utterance) {
        history.push(ChatTurn::user(utterance));
    }
}
