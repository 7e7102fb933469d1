//! Session list index.
//!
//! Maintains the user-ordered list of workout sessions. Order is significant
//! and reorderable by position, distinct from the alphabetic sort applied to
//! the catalog. Every mutation persists the whole ordered list in one store
//! transaction before the in-memory mirror is updated.

use chrono::NaiveDate;

use crate::{
    CreateError, Exercise, LoadError, Name, ReorderError, StorageError, UpdateError,
    catalog::LoadState, log_on_error,
    observer::{ObserverID, ObserverRegistry},
};

pub trait SessionRepository {
    fn read_sessions(&self) -> Result<Vec<Session>, StorageError>;
    /// Replaces the persisted session list in a single transaction.
    fn write_sessions(&self, sessions: &[Session]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: Name,
    pub info: String,
    /// Exercises copied into the session. Editing them never mutates the
    /// catalog originals.
    pub exercises: Vec<Exercise>,
    pub seconds_elapsed: u64,
    pub completed: Option<NaiveDate>,
}

pub struct SessionList<R> {
    repository: R,
    sessions: Vec<Session>,
    state: LoadState,
    observers: ObserverRegistry,
}

impl<R: SessionRepository> SessionList<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            sessions: Vec::new(),
            state: LoadState::default(),
            observers: ObserverRegistry::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Populates the mirror from the store. Idempotent.
    pub fn load(&mut self) -> Result<(), LoadError> {
        if self.state == LoadState::Loaded {
            return Ok(());
        }

        self.sessions = log_on_error!(self.repository.read_sessions(), "read", "sessions")?;
        self.state = LoadState::Loaded;

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    #[must_use]
    pub fn position(&self, name: &Name) -> Option<usize> {
        self.sessions.iter().position(|s| s.name == *name)
    }

    /// Appends a session. Fails with a conflict if the name is taken.
    pub fn create(&mut self, session: Session) -> Result<(), CreateError> {
        if self.position(&session.name).is_some() {
            return Err(CreateError::Conflict);
        }

        let mut next = self.sessions.clone();
        next.push(session);
        self.commit(next, "create")?;

        Ok(())
    }

    /// Replaces the session currently named `current`. A rename keeps the
    /// session at its position in the user-visible order.
    pub fn update(&mut self, current: &Name, session: Session) -> Result<(), UpdateError> {
        let index = self.position(current).ok_or(UpdateError::NotFound)?;

        if *current != session.name && self.position(&session.name).is_some() {
            return Err(UpdateError::Conflict);
        }

        let mut next = self.sessions.clone();
        next[index] = session;
        self.commit(next, "update")?;

        Ok(())
    }

    /// Positional insert for drag-and-drop reorder. One past the end is
    /// permitted.
    pub fn insert(&mut self, index: usize, session: Session) -> Result<(), ReorderError> {
        if index > self.sessions.len() {
            return Err(ReorderError::OutOfRange);
        }

        let mut next = self.sessions.clone();
        next.insert(index, session);
        self.commit(next, "insert")?;

        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Session, ReorderError> {
        if index >= self.sessions.len() {
            return Err(ReorderError::OutOfRange);
        }

        let mut next = self.sessions.clone();
        let removed = next.remove(index);
        self.commit(next, "remove")?;

        Ok(removed)
    }

    pub fn replace(&mut self, index: usize, session: Session) -> Result<(), ReorderError> {
        if index >= self.sessions.len() {
            return Err(ReorderError::OutOfRange);
        }

        let mut next = self.sessions.clone();
        next[index] = session;
        self.commit(next, "replace")?;

        Ok(())
    }

    /// Comma-joined names of the session's exercises that still resolve in
    /// the catalog. Read-only; dangling references are left untouched (see
    /// [`SessionList::reconcile_dangling`]).
    #[must_use]
    pub fn info_text(&self, index: usize, in_catalog: impl Fn(&Name) -> bool) -> Option<String> {
        let session = self.sessions.get(index)?;
        Some(
            session
                .exercises
                .iter()
                .filter(|e| in_catalog(&e.name))
                .map(|e| e.name.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Prunes session-exercise references that no longer resolve in the
    /// catalog and persists the result. Returns the number of pruned
    /// references.
    pub fn reconcile_dangling(
        &mut self,
        in_catalog: impl Fn(&Name) -> bool,
    ) -> Result<usize, UpdateError> {
        let mut next = self.sessions.clone();
        let mut pruned = 0;

        for session in &mut next {
            let before = session.exercises.len();
            session.exercises.retain(|e| in_catalog(&e.name));
            pruned += before - session.exercises.len();
        }

        if pruned == 0 {
            return Ok(0);
        }

        self.commit(next, "reconcile")?;

        Ok(pruned)
    }

    pub fn register_observer(&mut self, observer: Box<dyn Fn()>) -> ObserverID {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverID) {
        self.observers.unregister(id);
    }

    pub fn set_active_observer(&mut self, id: Option<ObserverID>) {
        self.observers.set_active(id);
    }

    fn commit(&mut self, next: Vec<Session>, action: &'static str) -> Result<(), StorageError> {
        match self.repository.write_sessions(&next) {
            Ok(()) => {
                self.sessions = next;
                self.observers.notify_stale();
                Ok(())
            }
            Err(err) => {
                match err {
                    StorageError::Unavailable => {
                        log::debug!("failed to {action} session: {err}");
                    }
                    _ => log::error!("failed to {action} session: {err}"),
                }
                Err(err)
            }
        }
    }
}
