use crate::domain::entities::Ticket;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;
pub const MID_CONFIDENCE_CEILING: f64 = 0.7;
pub const LONG_CONVERSATION_MESSAGES: usize = 10;
pub const SHORT_MESSAGE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerCaseReason {
    LowConfidence,
    DefaultFallback,
    MissingClassification,
    NoUserMessages,
    LongConversation,
    ShortMessage,
}

impl CornerCaseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CornerCaseReason::LowConfidence => "low_confidence",
            CornerCaseReason::DefaultFallback => "default_fallback",
            CornerCaseReason::MissingClassification => "missing_classification",
            CornerCaseReason::NoUserMessages => "no_user_messages",
            CornerCaseReason::LongConversation => "long_conversation",
            CornerCaseReason::ShortMessage => "short_message",
        }
    }
}

impl fmt::Display for CornerCaseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Outcome of the corner-case predicate for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornerCaseReport {
    pub is_corner_case: bool,
    pub reasons: Vec<CornerCaseReason>,
}

impl CornerCaseReport {
    pub fn has_reason(&self, reason: CornerCaseReason) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Deterministic predicate flagging tickets whose classification is
/// unreliable. Reasons are the union of every triggered condition.
pub fn report(ticket: &Ticket) -> CornerCaseReport {
    let mut reasons = Vec::new();
    let tag = &ticket.current_tag;

    if tag.confidence < LOW_CONFIDENCE_THRESHOLD {
        reasons.push(CornerCaseReason::LowConfidence);
    }
    if tag.is_default_tag() {
        reasons.push(CornerCaseReason::DefaultFallback);
    }
    if tag.service_type.is_none() || tag.category.is_none() {
        reasons.push(CornerCaseReason::MissingClassification);
    }

    let user_messages = ticket.user_message_count();
    if user_messages == 0 {
        reasons.push(CornerCaseReason::NoUserMessages);
    }
    if user_messages > LONG_CONVERSATION_MESSAGES {
        reasons.push(CornerCaseReason::LongConversation);
    }
    if ticket.combined_user_text().trim().len() < SHORT_MESSAGE_CHARS {
        reasons.push(CornerCaseReason::ShortMessage);
    }

    CornerCaseReport {
        is_corner_case: !reasons.is_empty(),
        reasons,
    }
}

/// Severity bucket for triage stats. Low confidence or a missing axis is
/// critical, the default fallback is a warning, mid-range confidence
/// ([0.5, 0.7)) is informational.
pub fn severity(ticket: &Ticket) -> Option<Severity> {
    let tag = &ticket.current_tag;
    if tag.confidence < LOW_CONFIDENCE_THRESHOLD
        || tag.service_type.is_none()
        || tag.category.is_none()
    {
        return Some(Severity::Critical);
    }
    if tag.is_default_tag() {
        return Some(Severity::Warning);
    }
    if tag.confidence < MID_CONFIDENCE_CEILING {
        return Some(Severity::Info);
    }
    None
}

/// "Most problematic first" ordering: ascending confidence, then corner
/// cases before clean tickets, then most recently updated first.
pub fn triage_order(a: &Ticket, b: &Ticket) -> Ordering {
    a.current_tag
        .confidence
        .partial_cmp(&b.current_tag.confidence)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            let a_corner = report(a).is_corner_case;
            let b_corner = report(b).is_corner_case;
            b_corner.cmp(&a_corner)
        })
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}
