//! Application state shared by all handlers.

use std::sync::Arc;

use crate::session::SessionRegistry;
use crate::store::{ProfileStore, ReviewStateStore, SessionStore};
use crate::study::StudyService;
use crate::tracker::ProgressTracker;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub tracker: ProgressTracker,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    /// One study service (and running session) per learner
    pub learners: Arc<SessionRegistry<StudyService>>,
}

impl AppState {
    /// Build the state around a single store serving every boundary.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: ReviewStateStore + SessionStore + ProfileStore + 'static,
    {
        Self {
            tracker: ProgressTracker::new(store.clone(), store.clone()),
            sessions: store.clone(),
            profiles: store,
            learners: Arc::new(SessionRegistry::default()),
        }
    }

    /// Run `f` against the learner's study service, creating it on first use.
    pub fn with_learner<R>(&self, user_id: &str, f: impl FnOnce(&mut StudyService) -> R) -> R {
        self.learners.with_entry(
            user_id,
            || {
                StudyService::new(
                    user_id,
                    self.tracker.clone(),
                    self.sessions.clone(),
                    self.profiles.clone(),
                )
            },
            f,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProgressRecord, ReviewStrategy, SessionRecord, SessionUpdate, UserProfile};
    use crate::error::StoreError;
    use crate::store::{MemoryStore, ProfilePreferenceSource};
    use chrono::{DateTime, Utc};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Store whose progress reads for "slow" wait until released
    struct GatedStore {
        inner: MemoryStore,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ReviewStateStore for GatedStore {
        fn get(&self, user_id: &str, word_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
            if user_id == "slow" {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            ReviewStateStore::get(&self.inner, user_id, word_id)
        }

        fn put(&self, record: &ProgressRecord) -> Result<(), StoreError> {
            self.inner.put(record)
        }

        fn query_due(
            &self,
            user_id: &str,
            due_before: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<ProgressRecord>, StoreError> {
            self.inner.query_due(user_id, due_before, limit)
        }

        fn list_by_user(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
            ReviewStateStore::list_by_user(&self.inner, user_id)
        }
    }

    impl SessionStore for GatedStore {
        fn create(&self, session: &SessionRecord) -> Result<String, StoreError> {
            self.inner.create(session)
        }

        fn update(&self, session_id: &str, update: &SessionUpdate) -> Result<(), StoreError> {
            self.inner.update(session_id, update)
        }

        fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
            SessionStore::get(&self.inner, session_id)
        }

        fn list_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
            SessionStore::list_by_user(&self.inner, user_id, limit)
        }
    }

    impl ProfilePreferenceSource for GatedStore {
        fn get_review_strategy(&self, user_id: &str) -> Result<ReviewStrategy, StoreError> {
            self.inner.get_review_strategy(user_id)
        }
    }

    impl ProfileStore for GatedStore {
        fn get_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
            self.inner.get_profile(user_id)
        }

        fn set_review_strategy(&self, user_id: &str, strategy: ReviewStrategy) -> Result<(), StoreError> {
            self.inner.set_review_strategy(user_id, strategy)
        }

        fn increment_sessions_completed(&self, user_id: &str) -> Result<u32, StoreError> {
            self.inner.increment_sessions_completed(user_id)
        }
    }

    #[test]
    fn test_slow_learner_does_not_hold_up_others() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryStore::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let state = AppState::new(store);

        let slow = {
            let state = state.clone();
            thread::spawn(move || {
                state.with_learner("slow", |learner| learner.record_answer("kuca", true, Utc::now()))
            })
        };
        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let fast = {
            let state = state.clone();
            thread::spawn(move || {
                let due = state.with_learner("fast", |learner| learner.get_due_words(Utc::now(), 10));
                done_tx.send(due.words.len()).unwrap();
            })
        };
        let finished = done_rx.recv_timeout(Duration::from_secs(5));

        release_tx.send(()).unwrap();
        assert!(slow.join().unwrap().is_ok());
        fast.join().unwrap();

        assert_eq!(finished, Ok(0));
    }
}
