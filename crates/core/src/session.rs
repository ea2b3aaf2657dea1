use crate::orchestrator::ManualAssistant;
use crate::traits::{ChatModel, Embedder};
use crate::{AssistantError, ChatMessage, ChatRole};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

pub const INDEX_FIRST_MESSAGE: &str =
    "The manuals have not been indexed yet. Run \"Index PDFs\" first to build the knowledge base.";

/// Anything that can turn a question into answer text for a session turn.
pub trait Answerer {
    fn answer(&self, question: &str) -> Result<String, AssistantError>;
}

impl<E, C> Answerer for ManualAssistant<E, C>
where
    E: Embedder,
    C: ChatModel,
{
    fn answer(&self, question: &str) -> Result<String, AssistantError> {
        self.ask(question).map(|answer| answer.text)
    }
}

/// One user's conversation, append-only, alive until [`ChatSession::end`].
pub struct ChatSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages: Vec::new(),
        };
        info!(session = %session.id, "chat session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Runs one question/answer turn and returns the assistant reply.
    ///
    /// Failures become the reply text so the conversation can go on. Blank
    /// questions are ignored and yield `None`.
    pub fn submit<A: Answerer + ?Sized>(
        &mut self,
        question: &str,
        answerer: &A,
    ) -> Option<&ChatMessage> {
        if question.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::new(ChatRole::User, question));

        let reply = match answerer.answer(question) {
            Ok(text) => text,
            Err(error) if error.is_not_indexed() => INDEX_FIRST_MESSAGE.to_string(),
            Err(error) => {
                warn!(session = %self.id, error = %error, "turn failed");
                format!("Could not answer: {error}")
            }
        };

        self.messages.push(ChatMessage::new(ChatRole::Assistant, reply));
        self.messages.last()
    }

    pub fn render_transcript(&self) -> String {
        let mut rendered = String::new();
        for message in &self.messages {
            rendered.push_str(&format!("[{}] {}\n\n", message.role.label(), message.text));
        }
        rendered
    }

    /// Closes the session and hands back its transcript.
    pub fn end(self) -> Vec<ChatMessage> {
        info!(
            session = %self.id,
            messages = self.messages.len(),
            duration_secs = (Utc::now() - self.started_at).num_seconds(),
            "chat session ended"
        );
        self.messages
    }
}
