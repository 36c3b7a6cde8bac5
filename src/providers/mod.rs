use crate::config::Settings;
use crate::core::error::LchatError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod base_client;
pub mod chat;
pub mod image;
pub mod openrouter;

pub use chat::{ChatClient, FixedRetry};
pub use image::ImageClient;
pub use openrouter::OpenRouterClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of a `chat/completions` call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<Message>,
}

/// Status and body of a completed HTTP exchange, before interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Transport for chat completions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, LchatError>;

    /// URL the requests go to, recorded in conversation logs.
    fn endpoint(&self) -> String;
}

/// Remote collaborators a command may need.
pub struct Services {
    pub chat: ChatClient,
    pub openrouter: OpenRouterClient,
    pub images: Option<ImageClient>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> Result<Self, LchatError> {
        let openrouter = OpenRouterClient::new(
            &settings.api_base_url,
            &settings.api_key,
            settings.request_timeout,
        )?;
        let chat = ChatClient::new(
            Box::new(openrouter.clone()),
            Box::new(FixedRetry::standard()),
            settings.model.clone(),
            settings.temperature,
        );
        let images = match &settings.image_api_key {
            Some(key) => Some(ImageClient::new(
                &settings.image_endpoint,
                key,
                settings.request_timeout,
            )?),
            None => None,
        };
        Ok(Self {
            chat,
            openrouter,
            images,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Backend that replays canned responses and records every request.
    ///
    /// Once the script runs out the last entry is repeated.
    #[derive(Clone, Default)]
    pub struct ScriptedBackend {
        script: Arc<Mutex<VecDeque<Option<RawResponse>>>>,
        last: Arc<Mutex<Option<RawResponse>>>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl ScriptedBackend {
        /// `None` entries simulate a network failure.
        pub fn new(script: Vec<Option<(u16, &str)>>) -> Self {
            let script = script
                .into_iter()
                .map(|entry| {
                    entry.map(|(status, body)| RawResponse {
                        status,
                        body: body.to_string(),
                    })
                })
                .collect();
            Self {
                script: Arc::new(Mutex::new(script)),
                ..Self::default()
            }
        }

        pub fn replying(content: &str) -> Self {
            let body = serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })
            .to_string();
            Self::new(vec![Some((200, &body))])
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, request: &ChatRequest) -> Result<RawResponse, LchatError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front();
            let entry = match next {
                Some(entry) => {
                    *self.last.lock().unwrap() = entry.clone();
                    entry
                }
                None => self.last.lock().unwrap().clone(),
            };
            entry.ok_or_else(|| LchatError::Network("Connection refused".to_string()))
        }

        fn endpoint(&self) -> String {
            "scripted://chat/completions".to_string()
        }
    }
}
