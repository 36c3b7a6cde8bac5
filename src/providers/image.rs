use super::base_client::HttpClient;
use crate::core::error::LchatError;
use serde_json::{Value, json};
use std::time::Duration;

/// Best-effort client for a text-to-image endpoint.
///
/// The endpoint is expected to answer `{"url": "..."}`; nothing else about
/// its contract is assumed.
#[derive(Clone)]
pub struct ImageClient {
    client: HttpClient,
}

impl ImageClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, LchatError> {
        Ok(Self {
            client: HttpClient::new(endpoint.to_string(), Some(api_key), timeout, None)?,
        })
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, LchatError> {
        let response = self.client.post("", &json!({ "inputs": prompt })).await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(LchatError::Api(format!("Image gen failed: {}", status)));
        }

        let body: Value = serde_json::from_str(&response.text().await?)
            .map_err(|e| LchatError::Parse(e.to_string()))?;
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LchatError::Parse("No url in image response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn returns_url_from_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer img-key")
            .match_body(Matcher::Json(json!({"inputs": "a red fox"})))
            .with_status(200)
            .with_body(r#"{"url":"https://img.example/fox.png"}"#)
            .create_async()
            .await;

        let client = ImageClient::new(&server.url(), "img-key", Duration::from_secs(5)).unwrap();

        assert_eq!(
            client.generate("a red fox").await.unwrap(),
            "https://img.example/fox.png"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_reported_with_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let client = ImageClient::new(&server.url(), "k", Duration::from_secs(5)).unwrap();
        let err = client.generate("x").await.unwrap_err();

        assert_eq!(err.to_string(), "API error: Image gen failed: 503");
    }

    #[tokio::test]
    async fn missing_url_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"images":[]}"#)
            .create_async()
            .await;

        let client = ImageClient::new(&server.url(), "k", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.generate("x").await.unwrap_err(),
            LchatError::Parse(_)
        ));
    }
}
