use crate::domain::entities::{Category, ServiceType};
use crate::domain::value_objects::TaggingResult;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map};

/// Per-match bonus for keywords declared later in a label's list. Later
/// keywords are hand-tuned to be more specific.
const SPECIFICITY_BONUS: f64 = 0.1;

/// Raw score to confidence multiplier for the keyword layer. Calibrated
/// independently from the semantic layer's fixed tiers.
const SCORE_TO_CONFIDENCE: f64 = 0.3;

/// Ordered trigger list for one label. Declaration order is the priority
/// order: ties between labels resolve to the first-declared one, and a
/// keyword's position within the list is its specificity rank.
struct LabelRule<L> {
    label: L,
    keywords: Vec<&'static str>,
    patterns: Vec<Regex>,
}

impl<L: Copy> LabelRule<L> {
    fn new(label: L, keywords: Vec<&'static str>) -> Self {
        let patterns = keywords
            .iter()
            .map(|kw| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw)))
                    .expect("keyword patterns are escaped literals")
            })
            .collect();
        Self {
            label,
            keywords,
            patterns,
        }
    }

    /// Match count plus specificity bonus, and the set of keywords that hit.
    fn score(&self, text: &str) -> Option<LabelScore<L>> {
        let mut score = 0.0;
        let mut matched = Vec::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            let count = pattern.find_iter(text).count();
            if count > 0 {
                score += count as f64 * (1.0 + SPECIFICITY_BONUS * index as f64);
                matched.push(self.keywords[index].to_string());
            }
        }
        if matched.is_empty() {
            return None;
        }
        Some(LabelScore {
            label: self.label,
            score,
            matched,
        })
    }
}

struct LabelScore<L> {
    label: L,
    score: f64,
    matched: Vec<String>,
}

struct AxisWinner<L> {
    label: L,
    confidence: f64,
    matched: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelMatches {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Per-label match breakdown for the explanation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordExplanation {
    pub method: &'static str,
    pub service_matches: Vec<LabelMatches>,
    pub category_matches: Vec<LabelMatches>,
}

/// Layer 1: fast, rule-based classifier over curated keyword tables.
///
/// Pure function of its tables and the input text; no I/O, always
/// deterministic. Tables are compiled once at construction and read-only
/// afterwards, so one engine can serve concurrent callers.
pub struct KeywordEngine {
    service_rules: Vec<LabelRule<ServiceType>>,
    category_rules: Vec<LabelRule<Category>>,
}

impl Default for KeywordEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordEngine {
    pub fn new() -> Self {
        let service_rules = vec![
            LabelRule::new(
                ServiceType::Flight,
                vec![
                    "flight", "flights", "airline", "airway", "airplane", "aircraft",
                    "booking reference", "pnr", "departure", "arrival", "gate",
                    "boarding", "seat", "baggage", "check-in", "terminal",
                    "pilot", "crew", "turbulence", "layover", "connecting flight",
                ],
            ),
            LabelRule::new(
                ServiceType::Hotel,
                vec![
                    "hotel", "hotels", "accommodation", "room", "rooms", "suite",
                    "reservation", "check-in", "check-out", "lobby", "reception",
                    "housekeeping", "amenities", "breakfast", "pool", "spa",
                    "concierge", "bed", "bathroom", "wifi", "parking",
                ],
            ),
            LabelRule::new(
                ServiceType::Visa,
                vec![
                    "visa", "visas", "passport", "immigration", "embassy", "consulate",
                    "application", "documents", "processing", "approval", "rejection",
                    "tourist visa", "business visa", "transit visa", "entry permit",
                    "border", "customs", "documentation",
                ],
            ),
            LabelRule::new(
                ServiceType::ESim,
                vec![
                    "esim", "e-sim", "sim", "data", "roaming", "network", "cellular",
                    "mobile data", "internet", "connectivity", "signal", "carrier",
                    "data plan", "gb", "mb", "unlimited data", "coverage",
                ],
            ),
            LabelRule::new(
                ServiceType::Wallet,
                vec![
                    "wallet", "balance", "payment", "money", "funds", "account",
                    "credit", "debit", "transaction", "transfer", "deposit",
                    "withdrawal", "refund", "charge", "billing", "invoice",
                ],
            ),
        ];

        let category_rules = vec![
            LabelRule::new(
                Category::Cancellation,
                vec![
                    "cancel", "cancelled", "cancellation", "refund", "abort",
                    "terminate", "stop", "end", "quit", "remove", "delete",
                    "void", "annul", "revoke", "withdraw booking",
                ],
            ),
            LabelRule::new(
                Category::Modify,
                vec![
                    "change", "modify", "modification", "update", "edit", "alter",
                    "adjust", "reschedule", "postpone", "move", "shift",
                    "different", "another", "switch", "transfer", "exchange",
                ],
            ),
            LabelRule::new(
                Category::TopUp,
                vec![
                    "top up", "topup", "top-up", "recharge", "reload", "add money",
                    "add funds", "deposit", "credit", "load", "refill",
                    "increase balance", "add credit",
                ],
            ),
            LabelRule::new(
                Category::Withdraw,
                vec![
                    "withdraw", "withdrawal", "cash out", "take out", "remove funds",
                    "extract", "get money", "retrieve funds", "debit",
                    "transfer out", "move money out",
                ],
            ),
            LabelRule::new(
                Category::OrderRecheck,
                vec![
                    "recheck", "re-check", "review", "verify", "confirm", "validate",
                    "double check", "examine", "inspect", "audit", "status",
                    "check order", "order status", "booking status",
                ],
            ),
            LabelRule::new(
                Category::PrePurchase,
                vec![
                    "pre-purchase", "pre purchase", "before buying", "inquiry",
                    "question", "ask", "information", "details", "help",
                    "support", "how to", "can i", "is it possible", "availability",
                ],
            ),
        ];

        Self {
            service_rules,
            category_rules,
        }
    }

    /// Classify one text against both axes. Never fails: no signal on
    /// either axis resolves to the unclassified pair at confidence 0.
    pub fn classify(&self, text: &str) -> TaggingResult {
        let text = text.to_lowercase();
        let service = axis_winner(&self.service_rules, &text);
        let category = axis_winner(&self.category_rules, &text);

        if service.is_none() && category.is_none() {
            return TaggingResult::unclassified(
                "keywords_default",
                "No keyword matches found, assigned default tags",
            )
            .with_metadata("no_matches", json!(true));
        }

        let service_confidence = service.as_ref().map_or(0.0, |w| w.confidence);
        let category_confidence = category.as_ref().map_or(0.0, |w| w.confidence);
        let overall = service_confidence.max(category_confidence);

        let mut reasons = Vec::new();
        if let Some(winner) = &service {
            reasons.push(format!(
                "Service type '{}' matched keywords: {}",
                winner.label,
                winner.matched.join(", ")
            ));
        }
        if let Some(winner) = &category {
            reasons.push(format!(
                "Category '{}' matched keywords: {}",
                winner.label,
                winner.matched.join(", ")
            ));
        }

        // Key phrases are the union over every label's matches, losing
        // labels included, in declaration order.
        let mut key_phrases: Vec<String> = Vec::new();
        for matches in collect_matches(&self.service_rules, &text)
            .into_iter()
            .chain(collect_matches(&self.category_rules, &text))
        {
            for phrase in matches.keywords {
                if !key_phrases.contains(&phrase) {
                    key_phrases.push(phrase);
                }
            }
        }

        let mut metadata = Map::new();
        metadata.insert("service_confidence".to_string(), json!(service_confidence));
        metadata.insert("category_confidence".to_string(), json!(category_confidence));

        TaggingResult::new(
            service.map(|w| w.label),
            category.map(|w| w.label),
            overall,
            "keywords",
            reasons.join("; "),
            key_phrases,
            metadata,
        )
        .expect("axis confidence is clamped into [0, 1]")
    }

    /// Per-label match lists, for operator-facing explanations.
    pub fn explain(&self, text: &str) -> KeywordExplanation {
        let text = text.to_lowercase();
        KeywordExplanation {
            method: "keywords",
            service_matches: collect_matches(&self.service_rules, &text),
            category_matches: collect_matches(&self.category_rules, &text),
        }
    }
}

/// Strictly-maximum score wins; on a tie the first-declared label keeps the
/// axis. Confidence is min(score * 0.3, 1.0).
fn axis_winner<L: Copy>(rules: &[LabelRule<L>], text: &str) -> Option<AxisWinner<L>> {
    let mut best: Option<LabelScore<L>> = None;
    for rule in rules {
        if let Some(scored) = rule.score(text) {
            match &best {
                Some(current) if scored.score <= current.score => {}
                _ => best = Some(scored),
            }
        }
    }
    best.map(|winner| AxisWinner {
        label: winner.label,
        confidence: (winner.score * SCORE_TO_CONFIDENCE).min(1.0),
        matched: winner.matched,
    })
}

fn collect_matches<L: Copy + std::fmt::Display>(
    rules: &[LabelRule<L>],
    text: &str,
) -> Vec<LabelMatches> {
    rules
        .iter()
        .filter_map(|rule| {
            rule.score(text).map(|scored| LabelMatches {
                label: scored.label.to_string(),
                keywords: scored.matched,
            })
        })
        .collect()
}
