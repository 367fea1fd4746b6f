use crate::domain::entities::{Category, Message, Sender, ServiceType, Tag, Ticket, TicketStatus};
use crate::domain::ports::ticket_repository::TicketRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::persistence::Database;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;

fn parse_timestamp(raw: &str) -> ApiResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApiError::Internal(format!("Malformed timestamp in database: {e}")))
}

fn ticket_from_row(row: &AnyRow) -> ApiResult<Ticket> {
    let status: String = row.try_get("status")?;
    let service_type: Option<String> = row.try_get("service_type").ok();
    let category: Option<String> = row.try_get("category").ok();
    let tag_timestamp: String = row.try_get("tag_timestamp")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Ticket {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        messages: Vec::new(),
        current_tag: Tag {
            service_type: service_type.map(ServiceType::from),
            category: category.map(Category::from),
            confidence: row.try_get("confidence")?,
            method: row.try_get("method")?,
            timestamp: parse_timestamp(&tag_timestamp)?,
        },
        status: TicketStatus::from(status),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn message_from_row(row: &AnyRow) -> ApiResult<Message> {
    let sender: String = row.try_get("sender")?;
    let timestamp: String = row.try_get("timestamp")?;
    Ok(Message {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        sender: Sender::from(sender),
        timestamp: parse_timestamp(&timestamp)?,
        ticket_id: row.try_get("ticket_id").ok(),
    })
}

impl Database {
    async fn load_messages(&self, ticket_id: &str) -> ApiResult<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, ticket_id, text, sender, timestamp
             FROM messages
             WHERE ticket_id = ?
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(message_from_row(&row)?);
        }
        Ok(messages)
    }

    async fn load_messages_for_all(&self, tickets: &mut [Ticket]) -> ApiResult<()> {
        for ticket in tickets.iter_mut() {
            ticket.messages = self.load_messages(&ticket.id).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TicketRepository for Database {
    async fn save(&self, ticket: &Ticket) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO tickets (id, conversation_id, service_type, category, confidence,
                                  method, tag_timestamp, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 service_type = excluded.service_type,
                 category = excluded.category,
                 confidence = excluded.confidence,
                 method = excluded.method,
                 tag_timestamp = excluded.tag_timestamp,
                 status = excluded.status,
                 updated_at = excluded.updated_at",
        )
        .bind(&ticket.id)
        .bind(&ticket.conversation_id)
        .bind(ticket.current_tag.service_type.map(|s| s.to_string()))
        .bind(ticket.current_tag.category.map(|c| c.to_string()))
        .bind(ticket.current_tag.confidence)
        .bind(&ticket.current_tag.method)
        .bind(ticket.current_tag.timestamp.to_rfc3339())
        .bind(ticket.status.to_string())
        .bind(ticket.created_at.to_rfc3339())
        .bind(ticket.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        // Messages are immutable: only new ones need inserting
        for message in &ticket.messages {
            sqlx::query(
                "INSERT INTO messages (id, ticket_id, text, sender, timestamp)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO NOTHING",
            )
            .bind(&message.id)
            .bind(&ticket.id)
            .bind(&message.text)
            .bind(message.sender.to_string())
            .bind(message.timestamp.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            ticket_id = %ticket.id,
            conversation_id = %ticket.conversation_id,
            "Ticket saved"
        );
        Ok(())
    }

    async fn get_by_id(&self, ticket_id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, service_type, category, confidence,
                    method, tag_timestamp, status, created_at, updated_at
             FROM tickets
             WHERE id = ?",
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut ticket = ticket_from_row(&row)?;
                ticket.messages = self.load_messages(&ticket.id).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn get_by_conversation_id(&self, conversation_id: &str) -> ApiResult<Option<Ticket>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, service_type, category, confidence,
                    method, tag_timestamp, status, created_at, updated_at
             FROM tickets
             WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut ticket = ticket_from_row(&row)?;
                ticket.messages = self.load_messages(&ticket.id).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> ApiResult<Vec<Ticket>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, service_type, category, confidence,
                    method, tag_timestamp, status, created_at, updated_at
             FROM tickets
             ORDER BY updated_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            tickets.push(ticket_from_row(&row)?);
        }
        self.load_messages_for_all(&mut tickets).await?;
        Ok(tickets)
    }

    async fn count(&self, status: Option<TicketStatus>) -> ApiResult<i64> {
        let row = match status {
            Some(status) => {
                sqlx::query("SELECT COUNT(*) as count FROM tickets WHERE status = ?")
                    .bind(status.to_string())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT COUNT(*) as count FROM tickets")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.try_get("count")?)
    }

    async fn list_all(&self) -> ApiResult<Vec<Ticket>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, service_type, category, confidence,
                    method, tag_timestamp, status, created_at, updated_at
             FROM tickets
             ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            tickets.push(ticket_from_row(&row)?);
        }
        self.load_messages_for_all(&mut tickets).await?;
        Ok(tickets)
    }
}
