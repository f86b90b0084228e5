use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::ClientFilter;
use crate::query::QueryParams;

#[derive(Clone)]
pub struct ClientsApi {
    http: Arc<HttpClient>,
}

impl ClientsApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &ClientFilter) -> Result<Value, ApiError> {
        let path = QueryParams::new()
            .push("page", filter.page)
            .push("limit", filter.limit)
            .push("status", filter.status.as_deref())
            .push("search", filter.search.as_deref())
            .append_to("/clients");
        self.http
            .get(&path)
            .await
            .inspect_err(|e| error!("Error fetching clients: {}", e))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .get(&format!("/clients/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error fetching client {}: {}", id, e))
    }

    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        self.http
            .put(&format!("/clients/{}", encode(id)), payload)
            .await
            .inspect_err(|e| error!("Error updating client {}: {}", id, e))
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/clients/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error deleting client {}: {}", id, e))
    }
}
