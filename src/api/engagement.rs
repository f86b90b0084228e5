use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use urlencoding::encode;

use super::{CommentBackend, LikeBackend};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::{BatchLikeStatus, Comment, CommentEnvelope, CommentList, LikeStatus};

/// Likes and comments for one resource collection.
///
/// Reviews and portfolio items expose the same endpoint layout under their
/// own prefix: `/{resource}/{id}/like`, `/{resource}/{id}/like-status`,
/// `/{resource}/like-status/batch` and `/{resource}/{id}/comments`.
#[derive(Clone)]
pub struct Engagement {
    http: Arc<HttpClient>,
    resource: &'static str,
    label: &'static str,
}

impl Engagement {
    pub fn new(http: Arc<HttpClient>, resource: &'static str, label: &'static str) -> Self {
        Self {
            http,
            resource,
            label,
        }
    }

    pub fn reviews(http: Arc<HttpClient>) -> Self {
        Self::new(http, "reviews", "review")
    }

    pub fn portfolio(http: Arc<HttpClient>) -> Self {
        Self::new(http, "portfolio", "portfolio item")
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

#[async_trait]
impl LikeBackend for Engagement {
    async fn like(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .post(&format!("/{}/{}/like", self.resource, encode(id)), json!({}))
            .await
            .inspect_err(|e| error!("Error liking {} {}: {}", self.label, id, e))
    }

    async fn unlike(&self, id: &str) -> Result<Value, ApiError> {
        self.http
            .delete(&format!("/{}/{}/like", self.resource, encode(id)))
            .await
            .inspect_err(|e| error!("Error unliking {} {}: {}", self.label, id, e))
    }

    async fn like_status(&self, id: &str) -> Result<LikeStatus, ApiError> {
        let payload = self
            .http
            .get(&format!("/{}/{}/like-status", self.resource, encode(id)))
            .await
            .inspect_err(|e| error!("Error checking like status for {} {}: {}", self.label, id, e))?;
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn batch_like_status(&self, ids: &[String]) -> Result<HashMap<String, bool>, ApiError> {
        let payload = self
            .http
            .post(
                &format!("/{}/like-status/batch", self.resource),
                json!({ "ids": ids }),
            )
            .await
            .inspect_err(|e| {
                error!("Error checking batch like status for {} {} ids: {}", ids.len(), self.label, e)
            })?;
        let batch: BatchLikeStatus =
            serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(batch.statuses)
    }
}

#[async_trait]
impl CommentBackend for Engagement {
    async fn comments(&self, id: &str) -> Result<Vec<Comment>, ApiError> {
        let payload = self
            .http
            .get(&format!("/{}/{}/comments", self.resource, encode(id)))
            .await
            .inspect_err(|e| error!("Error fetching comments for {} {}: {}", self.label, id, e))?;
        let list: CommentList =
            serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(list.into_vec())
    }

    async fn add_comment(&self, id: &str, text: &str) -> Result<Comment, ApiError> {
        let payload = self
            .http
            .post(
                &format!("/{}/{}/comments", self.resource, encode(id)),
                json!({ "text": text }),
            )
            .await
            .inspect_err(|e| error!("Error adding comment to {} {}: {}", self.label, id, e))?;
        let envelope: CommentEnvelope =
            serde_json::from_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(envelope.into_comment())
    }
}
