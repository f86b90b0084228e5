use std::sync::Arc;

use crate::api::{
    AdminApi, ArtistsApi, AuthApi, BookingsApi, ClientsApi, Engagement, PortfolioApi, ReviewsApi,
};
use crate::cache::BatchStatusCache;
use crate::config::{ClientConfig, default_storage_path};
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::optimistic::{CommentThread, LikeToggle};
use crate::session::{LoggingNavigator, Navigator, SessionRepository};

// Everything a caller needs, wired to one session and one HTTP client
pub struct PortfolioClient {
    pub config: ClientConfig,
    pub http: Arc<HttpClient>,
    pub session: Arc<SessionRepository>,
    pub auth: AuthApi,
    pub artists: ArtistsApi,
    pub clients: ClientsApi,
    pub reviews: ReviewsApi,
    pub portfolio: PortfolioApi,
    pub admin: AdminApi,
    pub bookings: BookingsApi,
    // Separate caches, review and portfolio ids may overlap
    pub review_likes: Arc<BatchStatusCache>,
    pub portfolio_likes: Arc<BatchStatusCache>,
}

impl PortfolioClient {
    // Session persisted to the configured (or default) storage file
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let path = config.storage_path.clone().unwrap_or_else(default_storage_path);
        let session = Arc::new(SessionRepository::with_file(path));
        Self::with_parts(config, session, Arc::new(LoggingNavigator::new()))
    }

    pub fn with_parts(
        config: ClientConfig,
        session: Arc<SessionRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = Arc::new(HttpClient::new(&config, Arc::clone(&session), navigator)?);

        Ok(Self {
            auth: AuthApi::new(Arc::clone(&http)),
            artists: ArtistsApi::new(Arc::clone(&http)),
            clients: ClientsApi::new(Arc::clone(&http)),
            reviews: ReviewsApi::new(Arc::clone(&http)),
            portfolio: PortfolioApi::new(Arc::clone(&http)),
            admin: AdminApi::new(Arc::clone(&http)),
            bookings: BookingsApi::new(Arc::clone(&http)),
            review_likes: Arc::new(BatchStatusCache::new(config.cache.clone())),
            portfolio_likes: Arc::new(BatchStatusCache::new(config.cache.clone())),
            http,
            session,
            config,
        })
    }

    pub fn review_like(&self, review_id: &str) -> LikeToggle<Engagement> {
        LikeToggle::new(
            review_id,
            Arc::new(self.reviews.engagement().clone()),
            Arc::clone(&self.session),
        )
        .with_cache(Arc::clone(&self.review_likes))
        .with_error_clear_delay(self.config.error_clear_delay)
    }

    pub fn portfolio_like(&self, item_id: &str) -> LikeToggle<Engagement> {
        LikeToggle::new(
            item_id,
            Arc::new(self.portfolio.engagement().clone()),
            Arc::clone(&self.session),
        )
        .with_cache(Arc::clone(&self.portfolio_likes))
        .with_error_clear_delay(self.config.error_clear_delay)
    }

    pub fn review_comments(&self, review_id: &str) -> CommentThread<Engagement> {
        CommentThread::new(
            review_id,
            Arc::new(self.reviews.engagement().clone()),
            Arc::clone(&self.session),
        )
        .with_error_clear_delay(self.config.error_clear_delay)
    }

    pub fn portfolio_comments(&self, item_id: &str) -> CommentThread<Engagement> {
        CommentThread::new(
            item_id,
            Arc::new(self.portfolio.engagement().clone()),
            Arc::clone(&self.session),
        )
        .with_error_clear_delay(self.config.error_clear_delay)
    }
}
