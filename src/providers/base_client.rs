use crate::core::error::LchatError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Thin reqwest wrapper carrying the base URL and auth headers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    pub fn new(
        base_url: String,
        api_key: Option<&str>,
        timeout: Duration,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Result<Self, LchatError> {
        let client = Client::builder().timeout(timeout).build()?;
        let auth_header =
            api_key.map(|key| ("Authorization".to_string(), format!("Bearer {}", key)));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            extra_headers: extra_headers.unwrap_or_default(),
        })
    }

    /// Full URL for `path`; an empty path is the base URL itself.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn with_headers(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((name, value)) = &self.auth_header {
            request = request.header(name, value);
        }
        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }
        request
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, LchatError> {
        let request = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(payload);
        Ok(self.with_headers(request).send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<Response, LchatError> {
        let request = self.client.get(self.url(path));
        Ok(self.with_headers(request).send().await?)
    }
}
