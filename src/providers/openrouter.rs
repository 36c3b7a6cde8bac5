use super::base_client::HttpClient;
use super::{ChatBackend, ChatRequest, RawResponse};
use crate::core::error::LchatError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ModelInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

/// OpenRouter: chat completions plus the public model catalog.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: HttpClient,
}

impl OpenRouterClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, LchatError> {
        let extra_headers = HashMap::from([
            (
                "HTTP-Referer".to_string(),
                "https://github.com/lchat/lchat".to_string(),
            ),
            ("X-Title".to_string(), "lchat".to_string()),
        ]);
        Ok(Self {
            client: HttpClient::new(
                base_url.to_string(),
                Some(api_key),
                timeout,
                Some(extra_headers),
            )?,
        })
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LchatError> {
        let response = self.client.get("models").await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LchatError::Api(format!(
                "Model listing failed ({}): {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let models: ModelsResponse =
            serde_json::from_str(&body).map_err(|e| LchatError::Parse(e.to_string()))?;
        Ok(models.data)
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, LchatError> {
        let response = self.client.post("chat/completions", request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    fn endpoint(&self) -> String {
        self.client.url("chat/completions")
    }
}

/// Catalog entries whose id contains `term`, ignoring case, in catalog order.
pub fn filter_models<'a>(models: &'a [ModelInfo], term: &str, limit: usize) -> Vec<&'a ModelInfo> {
    let needle = term.trim().to_lowercase();
    models
        .iter()
        .filter(|m| m.id.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
