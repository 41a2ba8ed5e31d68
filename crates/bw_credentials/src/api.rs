//! Backend client contract.
//!
//! Every Burrow service exposes its API under
//! `{scheme}{service}.{base-domain}/api`. The contract is deliberately thin:
//! a request returns the status code, an opportunistically parsed JSON body,
//! and the raw text. Flows decide what a given status means.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;

use bw_routing::Router;

use crate::error::CredentialsError;

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub status_code: u16,
    pub json_payload: Option<Value>,
    pub text: Option<String>,
}

impl ParsedResponse {
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<ParsedResponse, CredentialsError>;
    async fn post(&self, path: &str, body: Option<Value>)
        -> Result<ParsedResponse, CredentialsError>;
    async fn delete(&self, path: &str, body: Option<Value>)
        -> Result<ParsedResponse, CredentialsError>;
}

/// `reqwest`-backed client rooted at one service's API.
pub struct HttpBackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackendClient {
    /// Client for a sibling service, rooted via the router's domain state.
    pub fn for_service(router: &Router, service: &str) -> Self {
        Self::new(router.api_base_url(service))
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ParsedResponse, CredentialsError> {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        // The body is read once; JSON parsing is best-effort on top of it.
        let text = response.text().await.ok();
        let json_payload = text
            .as_deref()
            .and_then(|text| serde_json::from_str(text).ok());

        Ok(ParsedResponse {
            status_code,
            json_payload,
            text,
        })
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn get(&self, path: &str) -> Result<ParsedResponse, CredentialsError> {
        self.request(Method::GET, path, None).await
    }

    async fn post(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<ParsedResponse, CredentialsError> {
        self.request(Method::POST, path, body).await
    }

    async fn delete(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<ParsedResponse, CredentialsError> {
        self.request(Method::DELETE, path, body).await
    }
}
