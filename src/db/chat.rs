use crate::db::leads::{NewLead, insert_lead};
use crate::db::models::{ChatMessage, Conversation, ConversationStatus, Lead, MessageSender};
use crate::db::sqlite::SqlitePool;
use crate::error::CmsError;
use crate::types::pagination::{Paged, Pagination};
use chrono::Utc;
use sqlx::SqliteConnection;

#[derive(Clone)]
pub struct ChatStore {
    pool: SqlitePool,
}

/// Everything written when a visitor opens a chat.
#[derive(Debug)]
pub struct ChatOpening<'a> {
    pub visitor_name: Option<&'a str>,
    pub visitor_email: Option<&'a str>,
    pub visitor_token: &'a str,
    pub greeting: &'a str,
    pub first_message: Option<&'a str>,
    pub lead: Option<NewLead>,
}

#[derive(Debug)]
pub struct StartedChat {
    pub conversation: Conversation,
    pub messages: Vec<ChatMessage>,
    pub lead: Option<Lead>,
}

async fn insert_message(
    conn: &mut SqliteConnection,
    conversation_id: i64,
    sender: MessageSender,
    author_id: Option<i64>,
    body: &str,
) -> Result<ChatMessage, CmsError> {
    let now = Utc::now();
    let message = sqlx::query_as::<_, ChatMessage>(
        r#"INSERT INTO chat_messages (conversation_id, sender, author_id, body, created_at)
           VALUES (?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(conversation_id)
    .bind(sender)
    .bind(author_id)
    .bind(body)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query("UPDATE chat_conversations SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *conn)
        .await?;
    Ok(message)
}

impl ChatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a conversation with its greeting, the visitor's first message and
    /// the optional lead, all in one transaction.
    pub async fn start(&self, opening: ChatOpening<'_>) -> Result<StartedChat, CmsError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"INSERT INTO chat_conversations (visitor_name, visitor_email, visitor_token, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(opening.visitor_name)
        .bind(opening.visitor_email)
        .bind(opening.visitor_token)
        .bind(ConversationStatus::Open)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut messages = vec![
            insert_message(&mut tx, conversation.id, MessageSender::System, None, opening.greeting)
                .await?,
        ];
        if let Some(body) = opening.first_message {
            messages.push(
                insert_message(&mut tx, conversation.id, MessageSender::Visitor, None, body)
                    .await?,
            );
        }

        let lead = match opening.lead {
            Some(lead) => {
                let lead = NewLead {
                    message: Some(format!("Started support chat #{}", conversation.id)),
                    ..lead
                };
                Some(insert_lead(&mut tx, lead).await?)
            }
            None => None,
        };
        tx.commit().await?;

        Ok(StartedChat {
            conversation,
            messages,
            lead,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Conversation>, CmsError> {
        let row = sqlx::query_as::<_, Conversation>("SELECT * FROM chat_conversations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        status: Option<ConversationStatus>,
        window: Pagination,
    ) -> Result<Paged<Conversation>, CmsError> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_conversations WHERE COALESCE(? = status, 1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        let rows = sqlx::query_as::<_, Conversation>(
            r#"SELECT * FROM chat_conversations WHERE COALESCE(? = status, 1)
               ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?"#,
        )
        .bind(status)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(Paged::new(rows, total, window))
    }

    /// Append a message and bump the conversation's `updated_at`.
    pub async fn post(
        &self,
        conversation_id: i64,
        sender: MessageSender,
        author_id: Option<i64>,
        body: &str,
    ) -> Result<ChatMessage, CmsError> {
        let mut tx = self.pool.begin().await?;
        let message = insert_message(&mut tx, conversation_id, sender, author_id, body).await?;
        tx.commit().await?;
        Ok(message)
    }

    pub async fn messages(&self, conversation_id: i64) -> Result<Vec<ChatMessage>, CmsError> {
        let rows = sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE conversation_id = ? ORDER BY id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_status(
        &self,
        id: i64,
        status: ConversationStatus,
    ) -> Result<Option<Conversation>, CmsError> {
        let row = sqlx::query_as::<_, Conversation>(
            "UPDATE chat_conversations SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_by_status(&self, status: ConversationStatus) -> Result<i64, CmsError> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chat_conversations WHERE status = ?")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(n)
    }
}
