use crate::domain::entities::{Tag, Ticket, TicketStatus};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::domain::services::corner_case::{self, CornerCaseReason, Severity};
use crate::infrastructure::http::middleware::error::ApiResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Confidence histogram buckets used in the corner-case dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceBuckets {
    pub very_low: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CornerCaseStats {
    pub total_tickets: usize,
    pub corner_cases: usize,
    pub by_reason: BTreeMap<String, usize>,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub confidence_buckets: ConfidenceBuckets,
}

/// One ticket in the triage queue, with the detector's verdict attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProblematicTicket {
    pub ticket_id: String,
    pub conversation_id: String,
    pub status: TicketStatus,
    pub current_tag: Tag,
    pub user_message_count: usize,
    pub reasons: Vec<CornerCaseReason>,
    pub severity: Option<Severity>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Reporting over the corner-case detector: aggregate stats and a
/// most-problematic-first triage queue.
pub struct CornerCaseService {
    repository: Arc<dyn TicketRepository>,
}

impl CornerCaseService {
    pub fn new(repository: Arc<dyn TicketRepository>) -> Self {
        Self { repository }
    }

    pub async fn stats(&self) -> ApiResult<CornerCaseStats> {
        let tickets = self.repository.list_all().await?;

        let mut by_reason: BTreeMap<String, usize> = BTreeMap::new();
        let mut corner_cases = 0;
        let mut critical = 0;
        let mut warning = 0;
        let mut info = 0;
        let mut buckets = ConfidenceBuckets {
            very_low: 0,
            low: 0,
            medium: 0,
            high: 0,
        };

        for ticket in &tickets {
            let report = corner_case::report(ticket);
            if report.is_corner_case {
                corner_cases += 1;
            }
            for reason in &report.reasons {
                *by_reason.entry(reason.as_str().to_string()).or_default() += 1;
            }
            match corner_case::severity(ticket) {
                Some(Severity::Critical) => critical += 1,
                Some(Severity::Warning) => warning += 1,
                Some(Severity::Info) => info += 1,
                None => {}
            }

            let confidence = ticket.current_tag.confidence;
            if confidence < 0.3 {
                buckets.very_low += 1;
            } else if confidence < 0.5 {
                buckets.low += 1;
            } else if confidence < 0.7 {
                buckets.medium += 1;
            } else {
                buckets.high += 1;
            }
        }

        Ok(CornerCaseStats {
            total_tickets: tickets.len(),
            corner_cases,
            by_reason,
            critical,
            warning,
            info,
            confidence_buckets: buckets,
        })
    }

    /// Corner-case tickets in triage order, truncated to `limit`.
    pub async fn problematic_tickets(&self, limit: usize) -> ApiResult<Vec<ProblematicTicket>> {
        let mut tickets = self.repository.list_all().await?;
        tickets.retain(|ticket| corner_case::report(ticket).is_corner_case);
        tickets.sort_by(corner_case::triage_order);
        tickets.truncate(limit);

        Ok(tickets.into_iter().map(|ticket| summarize(&ticket)).collect())
    }
}

fn summarize(ticket: &Ticket) -> ProblematicTicket {
    let report = corner_case::report(ticket);
    ProblematicTicket {
        ticket_id: ticket.id.clone(),
        conversation_id: ticket.conversation_id.clone(),
        status: ticket.status,
        current_tag: ticket.current_tag.clone(),
        user_message_count: ticket.user_message_count(),
        reasons: report.reasons,
        severity: corner_case::severity(ticket),
        updated_at: ticket.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, Message, Sender, ServiceType};
    use chrono::Utc;
    use std::sync::Mutex;

    struct FixedRepository {
        tickets: Mutex<Vec<Ticket>>,
    }

    impl FixedRepository {
        fn new(tickets: Vec<Ticket>) -> Self {
            Self {
                tickets: Mutex::new(tickets),
            }
        }
    }

    #[async_trait::async_trait]
    impl TicketRepository for FixedRepository {
        async fn save(&self, ticket: &Ticket) -> ApiResult<()> {
            self.tickets.lock().unwrap().push(ticket.clone());
            Ok(())
        }

        async fn get_by_id(&self, ticket_id: &str) -> ApiResult<Option<Ticket>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.id == ticket_id)
                .cloned())
        }

        async fn get_by_conversation_id(
            &self,
            conversation_id: &str,
        ) -> ApiResult<Option<Ticket>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.conversation_id == conversation_id)
                .cloned())
        }

        async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Ticket>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn count(&self, _status: Option<TicketStatus>) -> ApiResult<i64> {
            Ok(self.tickets.lock().unwrap().len() as i64)
        }

        async fn list_all(&self) -> ApiResult<Vec<Ticket>> {
            Ok(self.tickets.lock().unwrap().clone())
        }
    }

    fn ticket(conversation_id: &str, confidence: f64, text: &str) -> Ticket {
        let mut ticket = Ticket::new(conversation_id);
        ticket.add_message(Message::new(text, Sender::User));
        ticket.update_tag(Tag {
            service_type: Some(ServiceType::Flight),
            category: Some(Category::Cancellation),
            confidence,
            method: "keywords".to_string(),
            timestamp: Utc::now(),
        });
        ticket
    }

    #[tokio::test]
    async fn stats_count_reasons_and_buckets() {
        let healthy = ticket("conv-ok", 0.9, "cancel my flight booking for tomorrow");
        let shaky = ticket("conv-low", 0.2, "flight problem with my trip today");
        let mid = ticket("conv-mid", 0.6, "please change my flight reservation");

        let service = CornerCaseService::new(Arc::new(FixedRepository::new(vec![
            healthy, shaky, mid,
        ])));
        let stats = service.stats().await.unwrap();

        assert_eq!(stats.total_tickets, 3);
        assert_eq!(stats.corner_cases, 1);
        assert_eq!(stats.by_reason.get("low_confidence"), Some(&1));
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.info, 1);
        assert_eq!(stats.confidence_buckets.very_low, 1);
        assert_eq!(stats.confidence_buckets.medium, 1);
        assert_eq!(stats.confidence_buckets.high, 1);
    }

    #[tokio::test]
    async fn triage_queue_puts_lowest_confidence_first() {
        let worse = ticket("conv-worse", 0.1, "hm");
        let bad = ticket("conv-bad", 0.4, "something went wrong with my flight");
        let fine = ticket("conv-fine", 0.95, "cancel my flight booking please today");

        let service =
            CornerCaseService::new(Arc::new(FixedRepository::new(vec![fine, bad, worse])));
        let queue = service.problematic_tickets(10).await.unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].conversation_id, "conv-worse");
        assert_eq!(queue[1].conversation_id, "conv-bad");
        assert!(queue[0].reasons.contains(&CornerCaseReason::ShortMessage));
    }

    #[tokio::test]
    async fn triage_queue_respects_the_limit() {
        let tickets: Vec<Ticket> = (0..5)
            .map(|i| ticket(&format!("conv-{i}"), 0.1 + i as f64 * 0.05, "hm"))
            .collect();
        let service = CornerCaseService::new(Arc::new(FixedRepository::new(tickets)));
        let queue = service.problematic_tickets(3).await.unwrap();
        assert_eq!(queue.len(), 3);
    }
}
