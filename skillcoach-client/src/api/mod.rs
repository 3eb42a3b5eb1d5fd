//! HTTP client for the coaching backend
//!
//! [`ApiClient`] wraps a `reqwest::Client` with the resolved base URL and
//! the shared [`Session`]. Every request carries `Authorization: Bearer`
//! when a token is present. Endpoint groups live in submodules, one per
//! backend router, each adding methods to `ApiClient`.

mod admin;
mod analysis;
mod assessments;
mod auth;
mod chat;
mod plans;
mod profiles;
mod simulations;

use crate::error::{Error, Result};
use crate::session::Session;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use skillcoach_common::config::ClientConfig;
use skillcoach_common::events::EventBus;
use std::sync::Arc;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("skillcoach/", env!("CARGO_PKG_VERSION"));

/// Backend API client
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Arc<Session>,
    events: EventBus,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<Session>) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            config,
            session,
            events: EventBus::default(),
        })
    }

    /// Publish client events (uploads, polling) on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.http.get(self.url(path)).query(query);
        self.send_json(path, request).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.post(self.url(path)).json(body);
        self.send_json(path, request).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.post(self.url(path));
        self.send_json(path, request).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let request = self.http.post(self.url(path)).form(form);
        self.send_json(path, request).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let request = self.http.post(self.url(path)).multipart(form);
        self.send_json(path, request).await
    }

    pub(crate) async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.patch(self.url(path)).json(body);
        self.send_json(path, request).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.delete(self.url(path));
        self.send_json(path, request).await
    }

    /// Raw body plus its content type
    pub(crate) async fn get_bytes(&self, path: &str) -> Result<(Vec<u8>, Option<String>)> {
        let request = self.authorize(self.http.get(self.url(path))).await;
        debug!(path = %path, "GET (bytes)");
        let response = self.check(request.send().await?).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }

    async fn send_json<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        let request = self.authorize(request).await;
        debug!(path = %path, "Sending API request");
        let response = self.check(request.send().await?).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(path = %path, "Unexpected response body: {}", e);
            Error::Serialization(e)
        })
    }

    /// Map non-2xx responses to errors; a 401 also expires the session
    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body, status);

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire().await;
            return Err(Error::Unauthorized(detail));
        }

        debug!(status = status.as_u16(), detail = %detail, "API request failed");
        Err(Error::Api {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Human-readable message from a FastAPI error body.
///
/// Handles `{"detail": "text"}`, validation lists
/// (`{"detail": [{"loc": [...], "msg": "..."}]}`) and non-JSON bodies.
pub(crate) fn extract_detail(body: &str, status: StatusCode) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    match json.get("detail") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let msg = item.get("msg").and_then(Value::as_str).unwrap_or("invalid");
                let loc = item
                    .get("loc")
                    .and_then(Value::as_array)
                    .map(|parts| {
                        parts
                            .iter()
                            .map(|p| match p {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(".")
                    })
                    .unwrap_or_default();
                if loc.is_empty() {
                    msg.to_string()
                } else {
                    format!("{}: {}", loc, msg)
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => fallback(),
    }
}
