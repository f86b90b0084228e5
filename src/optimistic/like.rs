use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Optimistic, OptimisticCommand, TransientError, schedule_error_clear};
use crate::api::LikeBackend;
use crate::cache::BatchStatusCache;
use crate::error::ApiError;
use crate::metrics::OPTIMISTIC_ROLLBACKS;
use crate::models::LikeStatus;
use crate::session::SessionRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeFlag {
    #[default]
    Unknown,
    Liked,
    NotLiked,
}

impl LikeFlag {
    pub fn is_liked(self) -> bool {
        self == LikeFlag::Liked
    }
}

impl From<bool> for LikeFlag {
    fn from(liked: bool) -> Self {
        if liked { LikeFlag::Liked } else { LikeFlag::NotLiked }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LikeState {
    pub flag: LikeFlag,
    pub count: u64,
    // Button spinner, only set while the flip itself is happening
    pub loading: bool,
    // Requests still outstanding
    pub in_flight: u32,
    pub error: TransientError,
    // Last state the server agreed with, and the toggle that produced it
    settled: (LikeFlag, u64),
    settled_seq: u64,
    // (seq, liking) for every unanswered toggle
    pending: Vec<(u64, bool)>,
    seq: u64,
}

impl LikeState {
    fn new(flag: LikeFlag, count: u64) -> Self {
        let mut state = Self {
            settled: (flag, count),
            ..Default::default()
        };
        state.refresh();
        state
    }

    pub fn is_liked(&self) -> bool {
        self.flag.is_liked()
    }

    // An optimistic update is outstanding
    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }

    fn settle_flag(&mut self, flag: LikeFlag) {
        if self.settled.0 == LikeFlag::Unknown {
            self.settled.0 = flag;
            self.refresh();
        }
    }

    fn settle_count(&mut self, count: u64) {
        self.settled.1 = count;
        self.refresh();
    }

    // Visible state is the settled state with the newest unanswered toggle on top
    fn refresh(&mut self) {
        let (flag, count) = self.settled;
        let latest = self
            .pending
            .iter()
            .filter(|(seq, _)| *seq > self.settled_seq)
            .max_by_key(|(seq, _)| *seq);
        (self.flag, self.count) = match latest {
            Some(&(_, liking)) => (liking.into(), counted(flag, count, liking)),
            None => (flag, count),
        };
        self.in_flight = self.pending.len() as u32;
    }
}

// Count once the like is set to `liking`, starting from `flag`
fn counted(flag: LikeFlag, count: u64, liking: bool) -> u64 {
    match (flag.is_liked(), liking) {
        (false, true) => count + 1,
        (true, false) => count.saturating_sub(1),
        _ => count,
    }
}

fn error_slot(state: &mut LikeState) -> &mut TransientError {
    &mut state.error
}

// One like/unlike request
#[derive(Debug, Default)]
struct ToggleLike {
    seq: u64,
    liking: bool,
}

impl OptimisticCommand for ToggleLike {
    type State = LikeState;
    type Output = ();

    fn apply(&mut self, state: &mut LikeState) {
        self.liking = !state.is_liked();
        state.seq += 1;
        self.seq = state.seq;
        state.pending.push((self.seq, self.liking));
        state.refresh();
    }

    fn confirm(&mut self, state: &mut LikeState, _output: ()) {
        state.pending.retain(|(seq, _)| *seq != self.seq);
        // An older success arriving late does not override a newer one
        if self.seq > state.settled_seq {
            let (flag, count) = state.settled;
            state.settled = (self.liking.into(), counted(flag, count, self.liking));
            state.settled_seq = self.seq;
        }
        state.refresh();
    }

    fn rollback(&mut self, state: &mut LikeState) {
        state.pending.retain(|(seq, _)| *seq != self.seq);
        state.refresh();
    }
}

/// Like button state for one review or portfolio item.
///
/// `toggle` flips the visible state right away and runs the request in the
/// background. A failed request takes its flip back out and leaves an
/// error that clears itself after `error_clear_delay`.
pub struct LikeToggle<B: LikeBackend + 'static> {
    id: String,
    backend: Arc<B>,
    session: Arc<SessionRepository>,
    cache: Option<Arc<BatchStatusCache>>,
    state: Arc<Mutex<LikeState>>,
    resolved: AtomicBool,
    // Count supplied by the caller, the batch lookup only knows the flag
    count_known: bool,
    error_clear_delay: Duration,
}

impl<B: LikeBackend + 'static> LikeToggle<B> {
    pub fn new(id: impl Into<String>, backend: Arc<B>, session: Arc<SessionRepository>) -> Self {
        Self {
            id: id.into(),
            backend,
            session,
            cache: None,
            state: Arc::new(Mutex::new(LikeState::default())),
            resolved: AtomicBool::new(false),
            count_known: false,
            error_clear_delay: Duration::from_secs(3),
        }
    }

    // Status already known from the list payload, no lookup needed
    pub fn with_status(mut self, status: LikeStatus) -> Self {
        *self.state.lock() = LikeState::new(status.liked.into(), status.like_count);
        self.resolved.store(true, Ordering::SeqCst);
        self.count_known = true;
        self
    }

    // Count known from the list payload, the liked flag is still looked up
    pub fn with_count(mut self, count: u64) -> Self {
        self.state.lock().settle_count(count);
        self.count_known = true;
        self
    }

    // Flag lookups for a known count go through the batch cache, successful toggles clear it
    pub fn with_cache(mut self, cache: Arc<BatchStatusCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_error_clear_delay(mut self, delay: Duration) -> Self {
        self.error_clear_delay = delay;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> LikeState {
        self.state.lock().clone()
    }

    pub fn is_liked(&self) -> bool {
        self.state.lock().is_liked()
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.message().map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.state.lock().error.dismiss();
    }

    /// Resolve the initial like status. Runs at most once per holder.
    ///
    /// The batch cache is used when the count is already known, otherwise
    /// the single-status endpoint fills in both flag and count.
    pub async fn ensure_status(&self) -> Result<(), ApiError> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(cache) = self.cache.as_ref().filter(|_| self.count_known) {
            let statuses = cache
                .check_batch_status_cached(self.backend.as_ref(), &[self.id.as_str()])
                .await?;
            let liked = statuses.get(&self.id).copied().unwrap_or(false);
            self.state.lock().settle_flag(liked.into());
            return Ok(());
        }

        let status = self.backend.like_status(&self.id).await?;
        let mut state = self.state.lock();
        if state.settled.0 == LikeFlag::Unknown {
            state.settled.1 = status.like_count;
            state.settle_flag(status.liked.into());
        }
        Ok(())
    }

    /// Flip the like and send the request in the background.
    ///
    /// The returned handle resolves once the request has been confirmed or
    /// rolled back.
    pub fn toggle(&self) -> Result<JoinHandle<()>, ApiError> {
        if !self.session.is_authenticated() {
            info!("Like on {} rejected, not logged in", self.id);
            return Err(ApiError::NotAuthenticated);
        }

        let mut op = Optimistic::new(ToggleLike::default());
        let liking = {
            let mut state = self.state.lock();
            state.loading = true;
            op.apply(&mut state);
            state.loading = false;
            op.command().liking
        };
        debug!("Optimistic {} on {}", if liking { "like" } else { "unlike" }, self.id);

        let id = self.id.clone();
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let cache = self.cache.clone();
        let delay = self.error_clear_delay;

        Ok(tokio::spawn(async move {
            let result = if liking {
                backend.like(&id).await
            } else {
                backend.unlike(&id).await
            };

            match result {
                Ok(_) => {
                    op.confirm(&mut state.lock(), ());
                    if let Some(cache) = cache {
                        cache.clear();
                    }
                }
                Err(e) => {
                    warn!("Rolling back {} on {}: {}", if liking { "like" } else { "unlike" }, id, e);
                    OPTIMISTIC_ROLLBACKS.inc();
                    let generation = {
                        let mut guard = state.lock();
                        op.rollback(&mut guard);
                        let action = if liking { "like" } else { "unlike" };
                        guard.error.set(format!("Failed to {}: {}", action, e))
                    };
                    schedule_error_clear(state, error_slot, generation, delay);
                }
            }
        }))
    }
}
