//! Multi-turn chat sessions.
//!
//! A `ChatSession` carries the conversation history of one user so later
//! turns see earlier answers. Sessions live in a `SessionStore` keyed by
//! session id: created on first use, discarded when the session ends.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::ChatMessage;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use medassist_core::AppResult;
use std::collections::HashMap;

/// Conversation state for a single user session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    history: Vec<ChatMessage>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            history: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Number of completed user/assistant exchanges.
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    /// Send `request` with this session's history attached.
    ///
    /// The user turn and the reply are appended only when the call succeeds,
    /// so a failed dispatch leaves the conversation as it was.
    pub async fn send(
        &mut self,
        client: &dyn LlmClient,
        request: LlmRequest,
    ) -> AppResult<LlmResponse> {
        let request = request.with_history(self.history.clone());

        tracing::debug!(
            session = %self.id,
            prior_turns = self.turns(),
            "Dispatching chat turn"
        );

        let response = client.complete(&request).await?;

        self.record_turn(request.prompt, response.content.clone());
        Ok(response)
    }

    /// Like [`send`](Self::send), handing each text chunk to `on_chunk` as it arrives.
    ///
    /// A stream that breaks part-way fails the turn; text already passed to
    /// `on_chunk` is not recorded in the history.
    pub async fn send_streaming<F>(
        &mut self,
        client: &dyn LlmClient,
        request: LlmRequest,
        mut on_chunk: F,
    ) -> AppResult<LlmResponse>
    where
        F: FnMut(&str) + Send,
    {
        let request = request
            .with_history(self.history.clone())
            .with_streaming();

        tracing::debug!(
            session = %self.id,
            prior_turns = self.turns(),
            "Dispatching streaming chat turn"
        );

        let mut stream = client.stream(&request).await?;
        let mut content = String::new();
        let mut usage = LlmUsage::default();

        while let Some(result) = stream.next().await {
            let chunk = result?;

            if !chunk.content.is_empty() {
                on_chunk(&chunk.content);
                content.push_str(&chunk.content);
            }

            if chunk.done {
                usage = chunk.usage.unwrap_or_default();
                break;
            }
        }

        self.record_turn(request.prompt.clone(), content.clone());

        Ok(LlmResponse {
            content,
            model: request.model,
            usage,
            done: true,
        })
    }

    fn record_turn(&mut self, prompt: String, reply: String) {
        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(reply));
        self.last_active = Utc::now();
    }
}

/// Process-local registry of chat sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for `id`, creating it on first use.
    pub fn get_or_create(&mut self, id: &str) -> &mut ChatSession {
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::info!(session = %id, "Starting chat session");
            ChatSession::new(id)
        })
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.get(id)
    }

    /// Discard the session for `id`. Returns whether one existed.
    pub fn end(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id);
        if let Some(ref session) = removed {
            tracing::info!(session = %id, turns = session.turns(), "Ended chat session");
        }
        removed.is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
