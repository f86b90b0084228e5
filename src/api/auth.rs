use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::http::{Body, HttpClient};
use crate::models::AuthResponse;
use crate::session::Session;

#[derive(Clone)]
pub struct AuthApi {
    http: Arc<HttpClient>,
}

impl AuthApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.session().is_authenticated()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.http.session().read()
    }

    // Log in and persist token + user in both stores
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let response: AuthResponse = self
            .http
            .request_as(
                "/auth/login",
                Method::POST,
                Body::Json(json!({ "email": email, "password": password })),
            )
            .await
            .inspect_err(|e| error!("Login failed for {}: {}", email, e))?;

        let session = self.store(response)?.ok_or_else(|| {
            ApiError::Decode("Login response did not include a token".to_string())
        })?;
        info!("Logged in as {}", session.display_name());
        Ok(session)
    }

    // Registration may or may not log the user straight in
    pub async fn register(&self, payload: Value) -> Result<Value, ApiError> {
        let raw = self
            .http
            .post("/auth/register", payload)
            .await
            .inspect_err(|e| error!("Registration failed: {}", e))?;

        if let Ok(response) = serde_json::from_value::<AuthResponse>(raw.clone()) {
            self.store(response)?;
        }
        Ok(raw)
    }

    // Local session goes away even when the backend call fails
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(e) = self.http.post("/auth/logout", json!({})).await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }
        self.http.session().clear()?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Value, ApiError> {
        self.http
            .get("/auth/me")
            .await
            .inspect_err(|e| error!("Error fetching current user: {}", e))
    }

    fn store(&self, response: AuthResponse) -> Result<Option<Session>, ApiError> {
        let Some(token) = response.token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let session = Session {
            token,
            user: response.user,
        };
        self.http.session().write(&session)?;
        Ok(Some(session))
    }
}
