use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use super::{CommentBackend, Engagement, LikeBackend};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::{Comment, LikeStatus, PortfolioFilter};
use crate::query::QueryParams;

#[derive(Clone)]
pub struct PortfolioApi {
    http: Arc<HttpClient>,
    engagement: Engagement,
}

impl PortfolioApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        let engagement = Engagement::portfolio(Arc::clone(&http));
        Self { http, engagement }
    }

    pub fn engagement(&self) -> &Engagement {
        &self.engagement
    }

    pub async fn list(&self, filter: &PortfolioFilter) -> Result<Value, ApiError> {
        let path = QueryParams::new()
            .push("page", filter.page)
            .push("limit", filter.limit)
            .push("artistId", filter.artist_id.as_deref())
            .push("category", filter.category.as_deref())
            .append_to("/portfolio");
        self.http
            .get(&path)
            .await
            .inspect_err(|e| error!("Error fetching portfolio: {}", e))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .get(&format!("/portfolio/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error fetching portfolio item {}: {}", id, e))
    }

    // Image + metadata as one multipart form, built by the caller
    pub async fn upload(&self, form: reqwest::multipart::Form) -> Result<Value, ApiError> {
        self.http
            .post_multipart("/portfolio", form)
            .await
            .inspect_err(|e| error!("Error uploading portfolio item: {}", e))
    }

    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        self.http
            .put(&format!("/portfolio/{}", encode(id)), payload)
            .await
            .inspect_err(|e| error!("Error updating portfolio item {}: {}", id, e))
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/portfolio/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error deleting portfolio item {}: {}", id, e))
    }

    pub async fn like(&self, id: &str) -> Result<Value, ApiError> {
        self.engagement.like(id).await
    }

    pub async fn unlike(&self, id: &str) -> Result<Value, ApiError> {
        self.engagement.unlike(id).await
    }

    pub async fn like_status(&self, id: &str) -> Result<LikeStatus, ApiError> {
        self.engagement.like_status(id).await
    }

    pub async fn batch_like_status(&self, ids: &[String]) -> Result<HashMap<String, bool>, ApiError> {
        self.engagement.batch_like_status(ids).await
    }

    pub async fn comments(&self, id: &str) -> Result<Vec<Comment>, ApiError> {
        self.engagement.comments(id).await
    }

    pub async fn add_comment(&self, id: &str, text: &str) -> Result<Comment, ApiError> {
        self.engagement.add_comment(id, text).await
    }
}
