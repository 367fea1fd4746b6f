use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Pending => write!(f, "pending"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

// Convert from string (for SQLx)
impl From<String> for TicketStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => TicketStatus::Pending,
            "closed" => TicketStatus::Closed,
            _ => TicketStatus::Open,
        }
    }
}

/// Service axis of the classification taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    Flight,
    Hotel,
    Visa,
    #[serde(rename = "eSIM")]
    ESim,
    Wallet,
    Other,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::Flight => write!(f, "Flight"),
            ServiceType::Hotel => write!(f, "Hotel"),
            ServiceType::Visa => write!(f, "Visa"),
            ServiceType::ESim => write!(f, "eSIM"),
            ServiceType::Wallet => write!(f, "Wallet"),
            ServiceType::Other => write!(f, "Other"),
        }
    }
}

impl From<String> for ServiceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Flight" => ServiceType::Flight,
            "Hotel" => ServiceType::Hotel,
            "Visa" => ServiceType::Visa,
            "eSIM" => ServiceType::ESim,
            "Wallet" => ServiceType::Wallet,
            _ => ServiceType::Other,
        }
    }
}

/// Category axis of the classification taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Cancellation,
    Modify,
    #[serde(rename = "Top Up")]
    TopUp,
    Withdraw,
    #[serde(rename = "Order Re-Check")]
    OrderRecheck,
    #[serde(rename = "Pre-Purchase")]
    PrePurchase,
    Others,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Cancellation => write!(f, "Cancellation"),
            Category::Modify => write!(f, "Modify"),
            Category::TopUp => write!(f, "Top Up"),
            Category::Withdraw => write!(f, "Withdraw"),
            Category::OrderRecheck => write!(f, "Order Re-Check"),
            Category::PrePurchase => write!(f, "Pre-Purchase"),
            Category::Others => write!(f, "Others"),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Cancellation" => Category::Cancellation,
            "Modify" => Category::Modify,
            "Top Up" => Category::TopUp,
            "Withdraw" => Category::Withdraw,
            "Order Re-Check" => Category::OrderRecheck,
            "Pre-Purchase" => Category::PrePurchase,
            _ => Category::Others,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl From<String> for Sender {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bot" => Sender::Bot,
            _ => Sender::User,
        }
    }
}

/// A single message inside a ticket's conversation. Immutable after
/// ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub ticket_id: Option<String>,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            ticket_id: None,
        }
    }

    pub fn is_user_message(&self) -> bool {
        self.sender == Sender::User
    }
}

/// The currently-accepted classification attached to a ticket.
///
/// Replaced wholesale by the merge policy, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub service_type: Option<ServiceType>,
    pub category: Option<Category>,
    pub confidence: f64,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            service_type: None,
            category: None,
            confidence: 0.0,
            method: String::new(),
            timestamp: Utc::now(),
        }
    }
}

impl Tag {
    /// Both axes classified.
    pub fn is_complete(&self) -> bool {
        self.service_type.is_some() && self.category.is_some()
    }

    /// The universal (Other, Others) safety net. Treated as low-trust
    /// regardless of its numeric confidence.
    pub fn is_default_tag(&self) -> bool {
        self.service_type == Some(ServiceType::Other) && self.category == Some(Category::Others)
    }
}

/// Aggregate root: one ticket per conversation. Owns its messages and its
/// current tag exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub current_tag: Tag,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            current_tag: Tag::default(),
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, mut message: Message) {
        message.ticket_id = Some(self.id.clone());
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn update_tag(&mut self, new_tag: Tag) {
        self.current_tag = new_tag;
        self.updated_at = Utc::now();
    }

    pub fn user_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.is_user_message()).collect()
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user_message()).count()
    }

    /// Concatenated text of all user messages, in arrival order.
    pub fn combined_user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.is_user_message())
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn should_process_for_tagging(&self) -> bool {
        self.status == TicketStatus::Open && self.user_message_count() > 0
    }
}
