// 🗂️ Sessions - One isolated person registry per browser session
//
// Each session owns its own PersonRegistry. Nothing is shared between
// sessions. A request holds the store lock for one whole event, so events of a
// session never interleave.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::calculator::{compute, BudgetInputs, BudgetResult};
use crate::error::{AppResult, BudgetError};
use crate::person::PersonRegistry;

pub type SessionId = Uuid;

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub registry: PersonRegistry,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            registry: PersonRegistry::new(),
            created_at: now,
            last_seen: now,
        }
    }

    /// Combine the submitted form values with this session's live person payments
    ///
    /// Whatever personal_payments the form carried are replaced: the registry is authoritative.
    pub fn snapshot(&self, form: &BudgetInputs) -> BudgetInputs {
        BudgetInputs {
            personal_payments: self.registry.list_payments(),
            ..form.clone()
        }
    }

    pub fn calculate(&self, form: &BudgetInputs) -> BudgetResult {
        compute(&self.snapshot(form))
    }

    fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_seen > timeout
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Idle timeout for a minute count. Zero, negative and out-of-range counts are rejected.
pub fn idle_timeout(minutes: i64) -> AppResult<Duration> {
    if minutes <= 0 {
        return Err(BudgetError::Config(
            "session_idle_minutes must be positive".to_string(),
        ));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| BudgetError::Config("session_idle_minutes out of range".to_string()))
}

// ============================================================================
// SESSION STORE
// ============================================================================

/// Cloneable handle to every live session
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        SessionStore {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn with_idle_minutes(minutes: i64) -> AppResult<Self> {
        Ok(Self::new(idle_timeout(minutes)?))
    }

    /// Start a new session. Idle sessions are swept first.
    pub fn create(&self) -> SessionId {
        self.sweep_idle_at(Utc::now());

        let session = Session::new();
        let id = session.id;

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(id, session);
        tracing::info!(session_id = %id, live = sessions.len(), "session created");
        id
    }

    /// Tear a session down. Returns whether it existed.
    pub fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let removed = sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, live = sessions.len(), "session closed");
        }
        removed
    }

    /// Run one event against a session with exclusive access
    pub fn with_session<F, R>(&self, id: SessionId, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(&id)
            .ok_or(BudgetError::SessionNotFound(id))?;

        session.last_seen = Utc::now();
        Ok(f(session))
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every session idle at `now`. Returns how many were dropped.
    pub fn sweep_idle_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        let timeout = self.idle_timeout;
        sessions.retain(|_, session| !session.is_idle(now, timeout));

        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, live = sessions.len(), "idle sessions swept");
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonField;

    fn store() -> SessionStore {
        SessionStore::with_idle_minutes(120).unwrap()
    }

    #[test]
    fn test_create_and_remove_session() {
        let store = store();
        let id = store.create();

        assert!(store.contains(id));
        assert_eq!(store.count(), 1);

        assert!(store.remove(id));
        assert!(!store.contains(id));
        assert!(!store.remove(id));
    }

    #[test]
    fn test_unknown_session_is_error() {
        let store = store();
        let missing = Uuid::new_v4();

        let err = store.with_session(missing, |s| s.registry.len()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store();
        let a = store.create();
        let b = store.create();

        store
            .with_session(a, |s| {
                let id = s.registry.add_person();
                s.registry.update_field(id, PersonField::MonthlyPayment(300.0));
            })
            .unwrap();

        let a_payments = store.with_session(a, |s| s.registry.list_payments()).unwrap();
        let b_payments = store.with_session(b, |s| s.registry.list_payments()).unwrap();

        assert_eq!(a_payments, vec![300.0]);
        assert!(b_payments.is_empty());
    }

    #[test]
    fn test_person_ids_are_per_session() {
        let store = store();
        let a = store.create();
        let b = store.create();

        let first_a = store.with_session(a, |s| s.registry.add_person()).unwrap();
        store.with_session(a, |s| s.registry.add_person()).unwrap();
        let first_b = store.with_session(b, |s| s.registry.add_person()).unwrap();

        assert_eq!(first_a, first_b);
    }

    #[test]
    fn test_snapshot_uses_registry_payments() {
        let mut session = Session::new();
        let p1 = session.registry.add_person();
        let p2 = session.registry.add_person();
        session.registry.update_field(p1, PersonField::MonthlyPayment(200.0));
        session.registry.update_field(p2, PersonField::MonthlyPayment(100.0));

        let form = BudgetInputs {
            salary: 3000.0,
            // Stale client-side list is ignored
            personal_payments: vec![9999.0],
            ..Default::default()
        };

        let snapshot = session.snapshot(&form);
        assert_eq!(snapshot.personal_payments, vec![200.0, 100.0]);
        assert_eq!(snapshot.salary, 3000.0);

        let result = session.calculate(&form);
        assert_eq!(result.personal_total, 300.0);
        assert_eq!(result.balance_current, 2700.0);
    }

    #[test]
    fn test_idle_timeout_bounds() {
        assert_eq!(idle_timeout(30).unwrap(), Duration::minutes(30));
        assert!(idle_timeout(0).is_err());
        assert!(idle_timeout(-5).is_err());
        assert!(matches!(idle_timeout(i64::MAX), Err(BudgetError::Config(_))));
    }

    #[test]
    fn test_sweep_drops_only_idle_sessions() {
        let store = SessionStore::with_idle_minutes(30).unwrap();
        let stale = store.create();
        let fresh = store.create();

        // Touch `fresh` so both have a last_seen close to now
        store.with_session(fresh, |_| ()).unwrap();

        // Nothing is idle right now
        assert_eq!(store.sweep_idle_at(Utc::now()), 0);

        // Backdate the stale one
        {
            let mut sessions = store.sessions.write().unwrap();
            sessions.get_mut(&stale).unwrap().last_seen = Utc::now() - Duration::minutes(31);
        }

        assert_eq!(store.sweep_idle_at(Utc::now()), 1);
        assert!(!store.contains(stale));
        assert!(store.contains(fresh));
    }

    #[test]
    fn test_clones_share_sessions() {
        let store = store();
        let handle = store.clone();
        let id = store.create();

        assert!(handle.contains(id));
        handle.remove(id);
        assert!(!store.contains(id));
    }
}
