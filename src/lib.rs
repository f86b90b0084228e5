//! Client for the artist portfolio platform API: authenticated requests,
//! per-resource endpoint wrappers, a like-status cache and optimistic
//! like/comment state.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod models;
pub mod optimistic;
pub mod query;
pub mod session;

pub use client::PortfolioClient;
pub use config::ClientConfig;
pub use error::ApiError;
