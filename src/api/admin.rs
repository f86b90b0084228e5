use serde_json::{Value, json};
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::UserFilter;
use crate::query::QueryParams;

// Admin dashboard endpoints
#[derive(Clone)]
pub struct AdminApi {
    http: Arc<HttpClient>,
}

impl AdminApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn dashboard_stats(&self) -> Result<Value, ApiError> {
        self.http
            .get("/admin/stats")
            .await
            .inspect_err(|e| error!("Error fetching dashboard stats: {}", e))
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Value, ApiError> {
        let path = QueryParams::new()
            .push("page", filter.page)
            .push("limit", filter.limit)
            .push("role", filter.role.as_deref())
            .push("status", filter.status.as_deref())
            .append_to("/admin/users");
        self.http
            .get(&path)
            .await
            .inspect_err(|e| error!("Error fetching users: {}", e))
    }

    pub async fn update_user_status(&self, id: &str, status: &str) -> Result<Value, ApiError> {
        self.http
            .patch(&format!("/admin/users/{}/status", encode(id)), json!({ "status": status }))
            .await
            .inspect_err(|e| error!("Error updating status of user {}: {}", id, e))
    }

    pub async fn delete_user(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/admin/users/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error deleting user {}: {}", id, e))
    }
}
