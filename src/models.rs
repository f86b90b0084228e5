use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Like state of a single review / portfolio item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    #[serde(default)]
    pub like_count: u64,
}

// Batch endpoint response: {"statuses": {"<id>": true}}
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchLikeStatus {
    #[serde(default)]
    pub statuses: HashMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_photo: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    // Only ever true for the local placeholder
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optimistic: bool,
}

// Comment list endpoints answer either a bare array or {"comments": [...]}
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentList {
    Bare(Vec<Comment>),
    Wrapped { comments: Vec<Comment> },
}

impl CommentList {
    pub fn into_vec(self) -> Vec<Comment> {
        match self {
            CommentList::Bare(list) => list,
            CommentList::Wrapped { comments } => comments,
        }
    }
}

// Single comment endpoints answer either the comment or {"comment": {...}}
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentEnvelope {
    Wrapped { comment: Comment },
    Bare(Comment),
}

impl CommentEnvelope {
    pub fn into_comment(self) -> Comment {
        match self {
            CommentEnvelope::Wrapped { comment } => comment,
            CommentEnvelope::Bare(comment) => comment,
        }
    }
}

// Login / register response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ArtistFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub style: Option<String>,
    pub location: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub artist_id: Option<String>,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub artist_id: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comment_accepts_mongo_style_id() {
        let comment: Comment = serde_json::from_value(json!({
            "_id": "c42",
            "text": "Clean linework",
            "authorName": "Sam",
            "createdAt": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(comment.id, "c42");
        assert!(!comment.is_optimistic);
    }

    #[test]
    fn comment_list_accepts_both_shapes() {
        let bare: CommentList =
            serde_json::from_value(json!([{"id": "c1", "text": "a"}])).unwrap();
        let wrapped: CommentList =
            serde_json::from_value(json!({"comments": [{"id": "c1", "text": "a"}, {"id": "c2", "text": "b"}]}))
                .unwrap();
        assert_eq!(bare.into_vec().len(), 1);
        assert_eq!(wrapped.into_vec().len(), 2);
    }

    #[test]
    fn like_status_count_defaults_to_zero() {
        let status: LikeStatus = serde_json::from_value(json!({"liked": true})).unwrap();
        assert_eq!(status, LikeStatus { liked: true, like_count: 0 });
    }
}
