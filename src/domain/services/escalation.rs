use crate::domain::value_objects::TaggingResult;

/// Layer 1 confidence at or above which a successful result is accepted
/// outright, without invoking the semantic layer.
pub const ACCEPT_THRESHOLD: f64 = 0.7;

/// Layer 1 confidence below which escalation always triggers.
pub const ESCALATE_THRESHOLD: f64 = 0.5;

/// Which of the two already-computed results the pipeline keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Keyword,
    Semantic,
}

/// Fast-path short-circuit: a clear-cut keyword result never pays for the
/// semantic layer. Checked before `should_escalate`, so it also wins for
/// multi-turn conversations.
pub fn should_accept(layer1: &TaggingResult) -> bool {
    layer1.is_successful() && layer1.confidence() >= ACCEPT_THRESHOLD
}

/// Escalate to the semantic layer when the conversation is multi-turn or
/// the keyword layer is unsure.
pub fn should_escalate(layer1: &TaggingResult, user_message_count: usize) -> bool {
    user_message_count > 1 || layer1.confidence() < ESCALATE_THRESHOLD
}

/// Pure selection over the two computed results; never a third re-scoring.
///
/// The semantic result wins iff it is strictly more confident, or it is
/// axis-complete while the keyword result is not.
pub fn select_result(keyword: &TaggingResult, semantic: &TaggingResult) -> Selection {
    if semantic.confidence() > keyword.confidence()
        || (semantic.is_complete() && !keyword.is_complete())
    {
        Selection::Semantic
    } else {
        Selection::Keyword
    }
}
