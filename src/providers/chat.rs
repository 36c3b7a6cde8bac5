use super::{ChatBackend, ChatRequest, Message, Role};
use crate::core::error::LchatError;
use crate::session::Exchange;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to retry a failed chat request and how long to wait.
pub trait RetryPolicy: Send + Sync {
    fn max_retries(&self) -> u32;

    /// Pause after failed attempt number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same pause between every attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedRetry {
    pub retries: u32,
    pub pause: Duration,
}

impl FixedRetry {
    /// Two retries, one second apart.
    pub fn standard() -> Self {
        Self {
            retries: 2,
            pause: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            pause: Duration::ZERO,
        }
    }
}

impl RetryPolicy for FixedRetry {
    fn max_retries(&self) -> u32 {
        self.retries
    }

    fn delay(&self, _attempt: u32) -> Duration {
        self.pause
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Chat completions with a fixed model, temperature and retry policy.
pub struct ChatClient {
    backend: Box<dyn ChatBackend>,
    retry: Box<dyn RetryPolicy>,
    model: String,
    temperature: f32,
}

impl ChatClient {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        retry: Box<dyn RetryPolicy>,
        model: String,
        temperature: f32,
    ) -> Self {
        Self {
            backend,
            retry,
            model,
            temperature,
        }
    }

    pub fn endpoint(&self) -> String {
        self.backend.endpoint()
    }

    /// Ask for a reply to `query` in the context of `history`.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[Exchange],
        query: &str,
    ) -> Result<String, LchatError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: build_messages(system_prompt, history, query),
        };

        let retries = self.retry.max_retries();
        let mut last = "No response".to_string();

        for attempt in 1..=retries + 1 {
            match self.backend.send(&request).await {
                Ok(response) if response.status == 200 => {
                    debug!("Chat request succeeded on attempt {}", attempt);
                    return extract_reply(&response.body);
                }
                Ok(response) => {
                    warn!(
                        "Request failed (attempt {}): HTTP {}",
                        attempt, response.status
                    );
                    last = response.status.to_string();
                }
                Err(e) => {
                    warn!("Request failed (attempt {}): {}", attempt, e);
                    last = "No response".to_string();
                }
            }

            if attempt <= retries {
                tokio::time::sleep(self.retry.delay(attempt)).await;
            }
        }

        Err(LchatError::RequestFailed { retries, last })
    }
}

/// System prompt, then every stored exchange, then the new query.
pub fn build_messages(system_prompt: &str, history: &[Exchange], query: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(Message::new(Role::System, system_prompt));
    for exchange in history {
        messages.push(Message::new(Role::User, exchange.user.as_str()));
        messages.push(Message::new(Role::Assistant, exchange.ai.as_str()));
    }
    messages.push(Message::new(Role::User, query));
    messages
}

/// Pull `choices[0].message.content` out of a completion body.
pub fn extract_reply(body: &str) -> Result<String, LchatError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| LchatError::Parse(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LchatError::Parse("No choices in API response".to_string()))?;

    choice
        .message
        .content
        .ok_or_else(|| LchatError::Parse("No content in API response".to_string()))
}
