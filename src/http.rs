//! Request wrapper every resource module goes through.
//!
//! Attaches the bearer token, serializes the body, parses JSON or text
//! responses and turns non-success statuses into [`ApiError`]s. A 401 also
//! wipes the stored session and redirects to the login route.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::config::{ClientConfig, LOGIN_ROUTE};
use crate::error::ApiError;
use crate::metrics::{REQUEST_FAILURES, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::session::{Navigator, SessionRepository};

// Request body shapes
pub enum Body {
    Empty,
    Json(Value),
    // Sent untouched, reqwest writes the boundary header
    Multipart(reqwest::multipart::Form),
}

pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionRepository>,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        // cookie provider = "credentials: include"
        let client = reqwest::Client::builder()
            .cookie_provider(session.cookie_jar())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &Arc<SessionRepository> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn request(&self, path: &str, method: Method, body: Body) -> Result<Value, ApiError> {
        REQUEST_TOTAL.inc();
        let start_time = Instant::now();

        let result = self.send(path, method.clone(), body).await;

        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        if let Err(e) = &result {
            REQUEST_FAILURES.inc();
            warn!("{} {} failed: {}", method, path, e);
        }
        result
    }

    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Body,
    ) -> Result<T, ApiError> {
        let payload = self.request(path, method, body).await?;
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(path, Method::GET, Body::Empty).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(path, Method::POST, Body::Json(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(path, Method::PUT, Body::Json(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(path, Method::PATCH, Body::Json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(path, Method::DELETE, Body::Empty).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ApiError> {
        self.request(path, Method::POST, Body::Multipart(form)).await
    }

    async fn send(&self, path: &str, method: Method, body: Body) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(form) => builder.multipart(form),
        };

        let res = builder.send().await?;
        let status = res.status();
        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = res.text().await?;
        let payload = parse_body(text, is_json);

        if status.is_success() {
            return Ok(payload);
        }

        let message = error_message(&payload, status);
        if status == StatusCode::UNAUTHORIZED {
            self.force_logout();
            return Err(ApiError::Unauthorized(message));
        }
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    // Expired or invalid session: drop it everywhere and go to login
    fn force_logout(&self) {
        if let Err(e) = self.session.clear() {
            error!("Failed to clear session after 401: {}", e);
        }
        self.navigator.redirect(LOGIN_ROUTE);
    }
}

fn parse_body(text: String, is_json: bool) -> Value {
    if !is_json {
        return Value::String(text);
    }
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}

// body.message, then body.error, then the status text
fn error_message(payload: &Value, status: StatusCode) -> String {
    ["message", "error"]
        .iter()
        .find_map(|field| payload.get(*field).and_then(Value::as_str))
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_parses_and_falls_back_to_text() {
        assert_eq!(parse_body(r#"{"ok":true}"#.into(), true), json!({"ok": true}));
        assert_eq!(parse_body("not json".into(), true), json!("not json"));
        assert_eq!(parse_body("".into(), true), Value::Null);
        assert_eq!(parse_body(r#"{"ok":true}"#.into(), false), json!(r#"{"ok":true}"#));
    }

    #[test]
    fn error_message_precedence() {
        let both = json!({"message": "Review not found", "error": "NotFound"});
        assert_eq!(error_message(&both, StatusCode::NOT_FOUND), "Review not found");

        let only_error = json!({"error": "Forbidden for clients"});
        assert_eq!(error_message(&only_error, StatusCode::FORBIDDEN), "Forbidden for clients");

        let other = json!("<html>oops</html>");
        assert_eq!(
            error_message(&other, StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
    }

    #[test]
    fn url_joins_base_and_path() {
        let config = ClientConfig {
            base_url: "http://localhost:5000/api/".into(),
            ..ClientConfig::default()
        };
        let client = HttpClient::new(
            &config,
            Arc::new(SessionRepository::in_memory()),
            Arc::new(crate::session::LoggingNavigator::new()),
        )
        .unwrap();
        assert_eq!(client.url("/artists"), "http://localhost:5000/api/artists");
        assert_eq!(client.url("artists"), "http://localhost:5000/api/artists");
    }
}
