//! Session registry — per-session state keyed by session id, with idle
//! eviction.
//!
//! The map lock is held only for lookup, insert and eviction. Each entry
//! has its own async mutex, held by the session's task while it processes
//! a message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct Slot<T> {
    state: Arc<Mutex<T>>,
    last_active: DateTime<Utc>,
}

/// Maps session id → state.
pub struct SessionRegistry<T> {
    slots: RwLock<HashMap<String, Slot<T>>>,
}

impl<T: Default> SessionRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the state for `session_id`, creating it if absent. Marks the
    /// session active.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<T>> {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        let slot = slots.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Session state created");
            Slot {
                state: Arc::new(Mutex::new(T::default())),
                last_active: now,
            }
        });
        slot.last_active = now;
        Arc::clone(&slot.state)
    }

    /// Get the state without creating or touching it.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<T>>> {
        let slots = self.slots.read().await;
        slots.get(session_id).map(|slot| Arc::clone(&slot.state))
    }

    /// Drop the state for `session_id`. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.slots.write().await.remove(session_id).is_some()
    }

    /// Remove entries idle for longer than `max_age`. Returns the count.
    pub async fn evict_idle(&self, max_age: Duration) -> usize {
        self.evict_idle_at(Utc::now(), max_age).await
    }

    /// `evict_idle` against an explicit clock.
    pub async fn evict_idle_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let max_age =
            chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| now.signed_duration_since(slot.last_active) <= max_age);
        before - slots.len()
    }

    pub async fn last_active(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let slots = self.slots.read().await;
        slots.get(session_id).map(|slot| slot.last_active)
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

impl<T: Default> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
