//! Chat with a single agent over the `default` conversation.

use std::sync::Arc;

use log::{debug, warn};

use crate::api::{AgentApi, ApiResult, ChatMessage};
use crate::form::Notice;

pub const DEFAULT_CONVERSATION: &str = "default";

pub struct ChatSession {
    api: Arc<dyn AgentApi>,
    agent: String,
    messages: Vec<ChatMessage>,
    sending: bool,
}

impl ChatSession {
    pub fn new(api: Arc<dyn AgentApi>, agent: impl Into<String>) -> Self {
        Self {
            api,
            agent: agent.into(),
            messages: Vec::new(),
            sending: false,
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub async fn load(&mut self) -> ApiResult<()> {
        let history = self.api.chat_history(&self.agent).await?;
        self.messages = history
            .conversations
            .into_iter()
            .find(|conversation| conversation.conversation_id == DEFAULT_CONVERSATION)
            .map(|conversation| conversation.messages)
            .unwrap_or_default();
        debug!("loaded {} chat messages for {}", self.messages.len(), self.agent);
        Ok(())
    }

    /// The user's message is shown right away. On failure it stays in the
    /// transcript and the returned notice explains what went wrong.
    pub async fn send(&mut self, text: &str) -> Result<(), Notice> {
        let text = text.trim();
        if text.is_empty() || self.sending {
            return Ok(());
        }
        self.messages.push(ChatMessage {
            role: "user".into(),
            content: text.to_string(),
            ..ChatMessage::default()
        });
        self.sending = true;
        let result = self
            .api
            .send_message(&self.agent, DEFAULT_CONVERSATION, text)
            .await;
        self.sending = false;
        match result {
            Ok(response) => {
                self.messages.push(response.message);
                Ok(())
            }
            Err(err) => {
                warn!("sending message to {} failed: {}", self.agent, err);
                Err(Notice::error("Message not sent", err.user_message()))
            }
        }
    }

    pub async fn clear(&mut self) -> Result<(), Notice> {
        match self.api.clear_chat(&self.agent).await {
            Ok(()) => {
                self.messages.clear();
                Ok(())
            }
            Err(err) => {
                warn!("clearing chat for {} failed: {}", self.agent, err);
                Err(Notice::error("Could not clear chat", err.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeAgentApi};

    #[tokio::test]
    async fn send_appends_user_and_reply_with_citations() {
        let api = Arc::new(FakeAgentApi::with_agent("Bot", ""));
        let mut chat = ChatSession::new(api.clone(), "Bot");
        chat.load().await.unwrap();
        assert!(chat.messages().is_empty());

        chat.send("  hello ").await.unwrap();
        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].citations.len(), 1);

        let mut reloaded = ChatSession::new(api.clone(), "Bot");
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.messages().len(), 2);
    }

    #[tokio::test]
    async fn blank_message_is_not_sent() {
        let api = Arc::new(FakeAgentApi::with_agent("Bot", ""));
        let mut chat = ChatSession::new(api.clone(), "Bot");
        chat.send("   ").await.unwrap();
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_send_keeps_the_user_message() {
        let api = Arc::new(FakeAgentApi::new());
        let mut chat = ChatSession::new(api.clone(), "Ghost");
        let notice = chat.send("anyone?").await.unwrap_err();
        assert!(notice.is_blocking());
        assert_eq!(chat.messages().len(), 1);
        assert!(!chat.is_sending());
    }

    #[tokio::test]
    async fn clear_empties_the_transcript() {
        let api = Arc::new(FakeAgentApi::with_agent("Bot", ""));
        let mut chat = ChatSession::new(api.clone(), "Bot");
        chat.send("hi").await.unwrap();
        chat.clear().await.unwrap();
        assert!(chat.messages().is_empty());
        assert_eq!(api.count(|call| matches!(call, Call::ClearChat(_))), 1);
    }
}
