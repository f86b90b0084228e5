use serde_json::{Value, json};
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::BookingFilter;
use crate::query::QueryParams;

// Appointment requests between clients and artists
#[derive(Clone)]
pub struct BookingsApi {
    http: Arc<HttpClient>,
}

impl BookingsApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &BookingFilter) -> Result<Value, ApiError> {
        let path = QueryParams::new()
            .push("page", filter.page)
            .push("limit", filter.limit)
            .push("status", filter.status.as_deref())
            .append_to("/bookings");
        self.http
            .get(&path)
            .await
            .inspect_err(|e| error!("Error fetching bookings: {}", e))
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ApiError> {
        self.http
            .post("/bookings", payload)
            .await
            .inspect_err(|e| error!("Error creating booking: {}", e))
    }

    pub async fn update_status(&self, id: &str, status: &str) -> Result<Value, ApiError> {
        self.http
            .patch(&format!("/bookings/{}/status", encode(id)), json!({ "status": status }))
            .await
            .inspect_err(|e| error!("Error updating status of booking {}: {}", id, e))
    }
}
