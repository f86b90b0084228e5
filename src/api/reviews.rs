use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use super::{CommentBackend, Engagement, LikeBackend};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::{Comment, LikeStatus, ReviewFilter};
use crate::query::QueryParams;

#[derive(Clone)]
pub struct ReviewsApi {
    http: Arc<HttpClient>,
    engagement: Engagement,
}

pub fn list_path(filter: &ReviewFilter) -> String {
    QueryParams::new()
        .push("page", filter.page)
        .push("limit", filter.limit)
        .push("status", filter.status.as_deref())
        .push("artistId", filter.artist_id.as_deref())
        .push("rating", filter.rating)
        .append_to("/reviews")
}

impl ReviewsApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        let engagement = Engagement::reviews(Arc::clone(&http));
        Self { http, engagement }
    }

    // Like/comment backend handed to the optimistic holders
    pub fn engagement(&self) -> &Engagement {
        &self.engagement
    }

    pub async fn list(&self, filter: &ReviewFilter) -> Result<Value, ApiError> {
        self.http
            .get(&list_path(filter))
            .await
            .inspect_err(|e| error!("Error fetching reviews: {}", e))
    }

    pub async fn get(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .get(&format!("/reviews/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error fetching review {}: {}", id, e))
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ApiError> {
        self.http
            .post("/reviews", payload)
            .await
            .inspect_err(|e| error!("Error creating review: {}", e))
    }

    // Moderation: approved / rejected / pending
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Value, ApiError> {
        self.http
            .patch(&format!("/reviews/{}/status", encode(id)), json!({ "status": status }))
            .await
            .inspect_err(|e| error!("Error updating status of review {}: {}", id, e))
    }

    pub async fn delete(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/reviews/{}", encode(id)))
            .await
            .inspect_err(|e| error!("Error deleting review {}: {}", id, e))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_path_uses_backend_key_names() {
        let filter = ReviewFilter {
            page: Some(1),
            artist_id: Some("a7".into()),
            rating: Some(5),
            ..Default::default()
        };
        assert_eq!(list_path(&filter), "/reviews?page=1&artistId=a7&rating=5");
    }
}
