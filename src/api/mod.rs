//! One module per backend resource. Every function maps onto a single
//! endpoint, logs what failed and hands the original error back.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::models::{Comment, LikeStatus};

pub mod admin;
pub mod artists;
pub mod auth;
pub mod bookings;
pub mod clients;
pub mod engagement;
pub mod portfolio;
pub mod reviews;

pub use admin::AdminApi;
pub use artists::ArtistsApi;
pub use auth::AuthApi;
pub use bookings::BookingsApi;
pub use clients::ClientsApi;
pub use engagement::Engagement;
pub use portfolio::PortfolioApi;
pub use reviews::ReviewsApi;

// Like endpoints of a likeable resource (reviews, portfolio items)
#[async_trait]
pub trait LikeBackend: Send + Sync {
    async fn like(&self, id: &str) -> Result<Value, ApiError>;
    async fn unlike(&self, id: &str) -> Result<Value, ApiError>;
    async fn like_status(&self, id: &str) -> Result<LikeStatus, ApiError>;
    async fn batch_like_status(&self, ids: &[String]) -> Result<HashMap<String, bool>, ApiError>;
}

// Comment endpoints of a commentable resource
#[async_trait]
pub trait CommentBackend: Send + Sync {
    async fn comments(&self, id: &str) -> Result<Vec<Comment>, ApiError>;
    async fn add_comment(&self, id: &str, text: &str) -> Result<Comment, ApiError>;
}
