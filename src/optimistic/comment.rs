use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Optimistic, OptimisticCommand, TransientError, schedule_error_clear};
use crate::api::CommentBackend;
use crate::error::ApiError;
use crate::metrics::OPTIMISTIC_ROLLBACKS;
use crate::models::Comment;
use crate::session::{Session, SessionRepository};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentState {
    pub comments: Vec<Comment>,
    pub input: String,
    pub loading: bool,
    pub error: TransientError,
}

fn error_slot(state: &mut CommentState) -> &mut TransientError {
    &mut state.error
}

// Placeholder comment in the list until the server answers
#[derive(Debug)]
struct AddComment {
    placeholder: Comment,
}

impl AddComment {
    fn new(session: &Session, text: String) -> Self {
        Self {
            placeholder: Comment {
                id: format!("temp-{}", Uuid::new_v4()),
                text,
                author_name: session.display_name(),
                author_photo: session.photo(),
                created_at: Utc::now(),
                is_optimistic: true,
            },
        }
    }
}

impl OptimisticCommand for AddComment {
    type State = CommentState;
    type Output = Comment;

    fn apply(&mut self, state: &mut CommentState) {
        state.comments.push(self.placeholder.clone());
        state.input.clear();
    }

    fn confirm(&mut self, state: &mut CommentState, saved: Comment) {
        let temp_id = &self.placeholder.id;
        if let Some(slot) = state.comments.iter_mut().find(|c| &c.id == temp_id) {
            *slot = saved;
        } else if !state.comments.iter().any(|c| c.id == saved.id) {
            // List was reloaded while the request was in flight
            state.comments.push(saved);
        }
    }

    fn rollback(&mut self, state: &mut CommentState) {
        let temp_id = &self.placeholder.id;
        state.comments.retain(|c| &c.id != temp_id);
    }
}

/// Comment list and input box for one review or portfolio item.
pub struct CommentThread<B: CommentBackend + 'static> {
    id: String,
    backend: Arc<B>,
    session: Arc<SessionRepository>,
    state: Arc<Mutex<CommentState>>,
    error_clear_delay: Duration,
}

impl<B: CommentBackend + 'static> CommentThread<B> {
    pub fn new(id: impl Into<String>, backend: Arc<B>, session: Arc<SessionRepository>) -> Self {
        Self {
            id: id.into(),
            backend,
            session,
            state: Arc::new(Mutex::new(CommentState::default())),
            error_clear_delay: Duration::from_secs(3),
        }
    }

    pub fn with_error_clear_delay(mut self, delay: Duration) -> Self {
        self.error_clear_delay = delay;
        self
    }

    pub fn state(&self) -> CommentState {
        self.state.lock().clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().comments.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().comments.is_empty()
    }

    pub fn input(&self) -> String {
        self.state.lock().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().input = text.into();
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.message().map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.state.lock().error.dismiss();
    }

    // Opening the thread: the server list replaces whatever is held locally
    pub async fn load(&self) -> Result<(), ApiError> {
        self.state.lock().loading = true;
        let result = self.backend.comments(&self.id).await;

        let mut state = self.state.lock();
        state.loading = false;
        match result {
            Ok(comments) => {
                debug!("Loaded {} comments for {}", comments.len(), self.id);
                state.comments = comments;
                Ok(())
            }
            Err(e) => {
                let generation = state.error.set(format!("Failed to load comments: {}", e));
                drop(state);
                schedule_error_clear(Arc::clone(&self.state), error_slot, generation, self.error_clear_delay);
                Err(e)
            }
        }
    }

    /// Post the current input.
    ///
    /// The placeholder is in the list and the input is cleared before this
    /// returns; the handle resolves once the server answered.
    pub fn submit(&self) -> Result<JoinHandle<()>, ApiError> {
        let session = self.session.read().ok_or(ApiError::NotAuthenticated)?;

        let (mut op, text) = {
            let mut state = self.state.lock();
            let text = state.input.trim().to_string();
            if text.is_empty() {
                return Err(ApiError::Validation("Comment cannot be empty".to_string()));
            }
            let mut op = Optimistic::new(AddComment::new(&session, text.clone()));
            op.apply(&mut state);
            (op, text)
        };

        let id = self.id.clone();
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        let delay = self.error_clear_delay;

        Ok(tokio::spawn(async move {
            match backend.add_comment(&id, &text).await {
                Ok(saved) => {
                    op.confirm(&mut state.lock(), saved);
                }
                Err(e) => {
                    warn!("Removing optimistic comment on {}: {}", id, e);
                    OPTIMISTIC_ROLLBACKS.inc();
                    let generation = {
                        let mut guard = state.lock();
                        op.rollback(&mut guard);
                        guard.error.set(format!("Failed to add comment: {}", e))
                    };
                    schedule_error_clear(state, error_slot, generation, delay);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeComments {
        fail: AtomicBool,
        fail_load: AtomicBool,
    }

    fn comment(id: &str, text: &str) -> Comment {
        Comment {
            id: id.into(),
            text: text.into(),
            author_name: "Lee".into(),
            author_photo: None,
            created_at: Utc::now(),
            is_optimistic: false,
        }
    }

    #[async_trait::async_trait]
    impl CommentBackend for FakeComments {
        async fn comments(&self, _id: &str) -> Result<Vec<Comment>, ApiError> {
            if self.fail_load.load(Ordering::SeqCst) {
                return Err(ApiError::Network("offline".into()));
            }
            Ok(vec![comment("c1", "first"), comment("c2", "second")])
        }

        async fn add_comment(&self, _id: &str, text: &str) -> Result<Comment, ApiError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Http {
                    status: 400,
                    message: "Comment rejected".into(),
                });
            }
            Ok(Comment {
                author_name: "Ana (server)".into(),
                ..comment("c99", text)
            })
        }
    }

    fn logged_in() -> Arc<SessionRepository> {
        let repo = SessionRepository::in_memory();
        repo.write(&Session {
            token: "t0k3n".into(),
            user: json!({"name": "Ana", "profileImage": "https://cdn/ana.png"}),
        })
        .unwrap();
        Arc::new(repo)
    }

    async fn loaded_thread(backend: Arc<FakeComments>) -> CommentThread<FakeComments> {
        let thread = CommentThread::new("p1", backend, logged_in());
        thread.load().await.unwrap();
        thread
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_then_server_comment() {
        let thread = loaded_thread(Arc::new(FakeComments::default())).await;
        thread.set_input("  Love the shading  ");

        let handle = thread.submit().unwrap();
        let comments = thread.comments();
        assert_eq!(comments.len(), 3);
        let placeholder = &comments[2];
        assert!(placeholder.is_optimistic);
        assert!(placeholder.id.starts_with("temp-"));
        assert_eq!(placeholder.text, "Love the shading");
        assert_eq!(placeholder.author_name, "Ana");
        assert_eq!(placeholder.author_photo.as_deref(), Some("https://cdn/ana.png"));
        assert_eq!(comments.iter().filter(|c| c.is_optimistic).count(), 1);
        assert!(thread.input().is_empty());

        handle.await.unwrap();
        let comments = thread.comments();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[2].id, "c99");
        assert!(!comments[2].is_optimistic);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_removes_placeholder() {
        let backend = Arc::new(FakeComments::default());
        backend.fail.store(true, Ordering::SeqCst);
        let thread = loaded_thread(backend).await;
        thread.set_input("nice");

        let handle = thread.submit().unwrap();
        assert_eq!(thread.len(), 3);

        handle.await.unwrap();
        assert_eq!(thread.len(), 2);
        assert!(thread.comments().iter().all(|c| !c.is_optimistic));
        assert!(thread.error().unwrap().contains("Comment rejected"));

        tokio::time::sleep(Duration::from_secs(3) + Duration::from_millis(1)).await;
        assert!(thread.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_rejected() {
        let thread = loaded_thread(Arc::new(FakeComments::default())).await;
        thread.set_input("   ");

        let err = thread.submit().unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(thread.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn logged_out_submit_is_rejected() {
        let thread = CommentThread::new(
            "p1",
            Arc::new(FakeComments::default()),
            Arc::new(SessionRepository::in_memory()),
        );
        thread.set_input("hello");

        assert_eq!(thread.submit().unwrap_err(), ApiError::NotAuthenticated);
        assert!(thread.is_empty());
        assert_eq!(thread.input(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn load_replaces_local_list() {
        let thread = loaded_thread(Arc::new(FakeComments::default())).await;
        thread.set_input("extra");
        thread.submit().unwrap().await.unwrap();
        assert_eq!(thread.len(), 3);

        thread.load().await.unwrap();
        let ids: Vec<String> = thread.comments().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_error_clears_itself() {
        let backend = Arc::new(FakeComments::default());
        backend.fail_load.store(true, Ordering::SeqCst);
        let thread = CommentThread::new("p1", backend, logged_in());

        assert!(thread.load().await.is_err());
        assert!(!thread.state().loading);
        assert!(thread.error().unwrap().contains("Failed to load comments"));

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert!(thread.error().is_some());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(thread.error().is_none());
    }
}
