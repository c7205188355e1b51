use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::session::Session;
use crate::types::PredictionRecord;

/// REST client for the prediction backend.
///
/// Owns the HTTP connection pool, the session (bearer token on every
/// request), and a TTL cache for settled prediction records — those are
/// immutable once the backend has recorded the actual outcome, so caching
/// them can never serve a stale mismatch.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    prediction_cache: Cache<u64, PredictionRecord>,
}

impl ApiClient {
    /// Create a new client. `cache_ttl_minutes` bounds the prediction cache.
    pub fn new(base_url: impl Into<String>, session: Session, cache_ttl_minutes: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client init");
        let prediction_cache = Cache::builder()
            .max_capacity(2_000)
            .time_to_live(Duration::from_secs(u64::from(cache_ttl_minutes) * 60))
            .build();

        Self {
            http,
            base_url,
            session,
            prediction_cache,
        }
    }

    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }

    pub(crate) fn prediction_cache(&self) -> &Cache<u64, PredictionRecord> {
        &self.prediction_cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // -----------------------------------------------------------------------
    // Request helpers
    // -----------------------------------------------------------------------

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let body = self.send(Method::GET, path, query, None).await?;
        decode(&body)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        payload: &serde_json::Value,
    ) -> Result<T, Error> {
        let body = self.send(Method::POST, path, query, Some(payload)).await?;
        decode(&body)
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        payload: &serde_json::Value,
    ) -> Result<T, Error> {
        let body = self.send(Method::PUT, path, query, Some(payload)).await?;
        decode(&body)
    }

    /// POST where only success matters; the response body is discarded.
    pub(crate) async fn post_ok(
        &self,
        path: &str,
        query: &[(&str, String)],
        payload: Option<&serde_json::Value>,
    ) -> Result<(), Error> {
        self.send(Method::POST, path, query, payload).await.map(drop)
    }

    pub(crate) async fn delete_ok(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(), Error> {
        self.send(Method::DELETE, path, query, None).await.map(drop)
    }

    /// Issue a request; classify transport and HTTP failures per the error
    /// taxonomy and return the raw response body on success.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<&serde_json::Value>,
    ) -> Result<String, Error> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .query(query)
            .bearer_auth(self.session.bearer_token());
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(
                error_message(&body).unwrap_or_else(|| "resource no longer exists".to_owned()),
            ));
        }
        if !status.is_success() {
            return Err(Error::Network(
                error_message(&body).unwrap_or_else(|| format!("backend returned HTTP {status}")),
            ));
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Network(format!("invalid response body: {e}")))
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Network("request timed out".to_owned())
    } else {
        Error::Network(e.to_string())
    }
}

/// Extract the human-readable reason from an error response body.
///
/// The backend reports failures as `{"error": "...", "details": "..."}`;
/// either field may be absent, and some proxies return non-JSON bodies.
fn error_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        details: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.error, parsed.details) {
        (Some(error), Some(details)) => Some(format!("{error}: {details}")),
        (Some(error), None) => Some(error),
        (None, Some(details)) => Some(details),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_both_fields() {
        let body = r#"{"error": "clone failed", "details": "authentication required"}"#;
        assert_eq!(
            error_message(body).unwrap(),
            "clone failed: authentication required"
        );
    }

    #[test]
    fn error_message_single_field() {
        assert_eq!(
            error_message(r#"{"error": "bad request"}"#).unwrap(),
            "bad request"
        );
        assert_eq!(
            error_message(r#"{"details": "missing token"}"#).unwrap(),
            "missing token"
        );
    }

    #[test]
    fn error_message_falls_back_on_garbage() {
        assert!(error_message("<html>502</html>").is_none());
        assert!(error_message("{}").is_none());
    }
}
