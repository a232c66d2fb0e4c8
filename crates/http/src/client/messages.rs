//! Chat message client methods

use super::{ExpenseClient, RequestOptions, error::ClientError};
use crate::types::{CreateMessageRequest, ListMessagesQuery, Message, Transaction};
use serde::de::IgnoredAny;

impl ExpenseClient {
    /// List the user's messages, newest first
    pub async fn list_messages(&self, query: &ListMessagesQuery) -> Result<Vec<Message>, ClientError> {
        let mut options = RequestOptions::default();
        if let Some(after) = &query.after {
            options = options.query("after", after);
        }
        if let Some(limit) = query.limit {
            options = options.query("limit", limit);
        }
        self.get("/messages", options).await
    }

    /// Send a chat message
    ///
    /// Returns the stored message together with the assistant's reply.
    pub async fn send_message(&self, content: impl Into<String>) -> Result<Vec<Message>, ClientError> {
        let body = CreateMessageRequest {
            content: content.into(),
        };
        self.post("/messages", Some(&body), RequestOptions::default())
            .await
    }

    /// Delete a message and its parsed transactions
    pub async fn delete_message(&self, id: &str) -> Result<(), ClientError> {
        let _: IgnoredAny = self
            .delete(&format!("/messages/{id}"), None::<&()>, RequestOptions::default())
            .await?;
        Ok(())
    }

    /// Transactions parsed from one message
    pub async fn list_transactions(&self, message_id: &str) -> Result<Vec<Transaction>, ClientError> {
        self.get(
            &format!("/messages/{message_id}/transactions"),
            RequestOptions::default(),
        )
        .await
    }
}
