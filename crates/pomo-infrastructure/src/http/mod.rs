//! HTTP client for the persistence façade.
//!
//! Authenticates with the session cookie the façade issues at sign-in and
//! maps its status codes onto [`PomoError`]:
//!
//! | Status | Error |
//! |---|---|
//! | 400 | `Validation` (first reported field) |
//! | 401 | `Unauthorized` |
//! | 404 | `NotFound` |
//! | other non-2xx | `Server` |
//! | transport failure | `Network` |

mod dto;

use async_trait::async_trait;
use chrono::NaiveDate;
use pomo_core::error::{PomoError, Result};
use pomo_core::session::{NewSession, SessionGateway, SessionRecord, SessionUpdate};
use pomo_core::settings::{Settings, SettingsGateway};
use pomo_core::stats::{DailyStatsReport, StatsGateway};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ApiConfig;
use dto::{
    CreateSessionRequest, DailyStatsResponse, ErrorBody, SessionDto, UpdateSessionRequest,
};

/// Cookie carrying the façade session.
pub const SESSION_COOKIE: &str = "next-auth.session-token";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct HttpPomoApi {
    client: Client,
    base_url: String,
    session_token: Option<String>,
    timeout: Duration,
}

impl HttpPomoApi {
    pub fn new(base_url: impl Into<String>, session_token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a client from the `[api]` section.
    ///
    /// # Returns
    ///
    /// - `Err(PomoError::Config)`: No `base_url` configured
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let base_url = api
            .base_url
            .as_deref()
            .ok_or_else(|| PomoError::config("api.base_url is not set"))?;

        tracing::info!(
            "[HttpPomoApi] Initialized with URL: {}, session token: {}",
            base_url,
            if api.session_token.is_some() {
                "present"
            } else {
                "none"
            }
        );

        Ok(Self::new(base_url, api.session_token.clone()).with_timeout(api.timeout()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .timeout(self.timeout);
        match &self.session_token {
            Some(token) => request.header(
                reqwest::header::COOKIE,
                format!("{}={}", SESSION_COOKIE, token),
            ),
            None => request,
        }
    }

    /// Sends a request and returns the response if its status is a success.
    async fn send(
        &self,
        request: RequestBuilder,
        entity_type: &'static str,
        id: &str,
    ) -> Result<Response> {
        let response = request.send().await.map_err(map_transport_error)?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response, entity_type, id).await)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| PomoError::Serialization {
            format: "JSON".to_string(),
            message: e.to_string(),
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> PomoError {
    if err.is_timeout() {
        PomoError::network(format!("request timed out: {}", err))
    } else if err.is_decode() {
        PomoError::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    } else {
        PomoError::network(err.to_string())
    }
}

async fn error_from_response(response: Response, entity_type: &'static str, id: &str) -> PomoError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .message
        .clone()
        .or_else(|| body.error.clone())
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::BAD_REQUEST => match body.details.into_iter().next() {
            Some(detail) => PomoError::validation(detail.field, detail.message),
            None => PomoError::validation("request", message),
        },
        StatusCode::UNAUTHORIZED => PomoError::Unauthorized,
        StatusCode::NOT_FOUND => PomoError::not_found(entity_type, id),
        _ => PomoError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl SessionGateway for HttpPomoApi {
    async fn create_session(&self, new_session: &NewSession) -> Result<SessionRecord> {
        let request = self
            .request(Method::POST, "/api/sessions")
            .json(&CreateSessionRequest::from(new_session));
        let response = self.send(request, "SessionRecord", "new").await?;
        let record: SessionRecord = Self::json::<SessionDto>(response).await?.into();
        tracing::debug!("[HttpPomoApi] Created session {}", record.id);
        Ok(record)
    }

    async fn update_session(&self, id: &str, update: &SessionUpdate) -> Result<SessionRecord> {
        let request = self
            .request(Method::PUT, &format!("/api/sessions/{}", id))
            .json(&UpdateSessionRequest::from(update));
        let response = self.send(request, "SessionRecord", id).await?;
        let record: SessionRecord = Self::json::<SessionDto>(response).await?.into();
        tracing::debug!("[HttpPomoApi] Updated session {}", record.id);
        Ok(record)
    }

    async fn previous_completed_focus_session(&self) -> Result<Option<SessionRecord>> {
        let request = self.request(Method::GET, "/api/sessions/previous");
        match self.send(request, "SessionRecord", "previous").await {
            Ok(response) => Ok(Some(Self::json::<SessionDto>(response).await?.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SettingsGateway for HttpPomoApi {
    async fn get_settings(&self) -> Result<Settings> {
        let request = self.request(Method::GET, "/api/user/settings");
        let response = self.send(request, "Settings", "current").await?;
        Self::json(response).await
    }

    async fn put_settings(&self, settings: &Settings) -> Result<Settings> {
        let request = self
            .request(Method::PUT, "/api/user/settings")
            .json(settings);
        let response = self.send(request, "Settings", "current").await?;
        Self::json(response).await
    }
}

#[async_trait]
impl StatsGateway for HttpPomoApi {
    async fn daily_stats(
        &self,
        days: u32,
        reference_date: Option<NaiveDate>,
    ) -> Result<DailyStatsReport> {
        let mut path = format!("/api/stats/daily?days={}", days);
        if let Some(date) = reference_date {
            path.push_str(&format!("&date={}", date.format("%Y-%m-%d")));
        }
        let response = self
            .send(self.request(Method::GET, &path), "DailyStats", "daily")
            .await?;
        Ok(Self::json::<DailyStatsResponse>(response).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = HttpPomoApi::new("http://localhost:3000/", None);
        assert_eq!(api.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_from_config_requires_url() {
        let err = HttpPomoApi::from_config(&ApiConfig::default()).err().unwrap();
        assert!(matches!(err, PomoError::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        // Port 9 (discard) on localhost is closed in test environments
        let api = HttpPomoApi::new("http://127.0.0.1:9", Some("tok".to_string()))
            .with_timeout(Duration::from_secs(2));
        let err = api.get_settings().await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
