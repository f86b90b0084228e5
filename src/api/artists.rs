use serde_json::{Value, json};
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::ArtistFilter;
use crate::query::QueryParams;

#[derive(Clone)]
pub struct ArtistsApi {
    http: Arc<HttpClient>,
}

// "/artists?page=..&limit=.." with unset filters left out
pub fn list_path(filter: &ArtistFilter) -> String {
    QueryParams::new()
        .push("page", filter.page)
        .push("limit", filter.limit)
        .push("status", filter.status.as_deref())
        .push("style", filter.style.as_deref())
        .push("location", filter.location.as_deref())
        .push("search", filter.search.as_deref())
        .append_to("/artists")
}

impl ArtistsApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &ArtistFilter) -> Result<Value, ApiError> {
        self.http
            .get(&list_path(filter))
            .await
            .inspect_err(|e| error!("Error fetching artists: {}", e))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .get(&format!("/artists/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error fetching artist {}: {}", id, e))
    }

    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        self.http
            .put(&format!("/artists/{}", encode(id)), payload)
            .await
            .inspect_err(|e| error!("Error updating artist {}: {}", id, e))
    }

    // Admin: approve / suspend / reject
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Value, ApiError> {
        self.http
            .patch(&format!("/artists/{}/status", encode(id)), json!({ "status": status }))
            .await
            .inspect_err(|e| error!("Error updating status of artist {}: {}", id, e))
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/artists/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error deleting artist {}: {}", id, e))
    }

    pub async fn upload_avatar(
        &self,
        id: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ApiError> {
        self.http
            .post_multipart(&format!("/artists/{}/avatar", encode(id)), form)
            .await
            .inspect_err(|e| error!("Error uploading avatar for artist {}: {}", id, e))
    }
}
