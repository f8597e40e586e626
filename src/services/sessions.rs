use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::Session;

/// In-memory session cache keyed by (phone, business). Sessions live for
/// the lifetime of the process; there is no eviction. Each session is
/// wrapped in its own mutex so concurrent turns for different keys never
/// contend, and turns for the same key cannot race on field writes.
pub struct SessionStore {
    inner: Mutex<HashMap<(String, i64), Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// At most one session ever exists for a key, even when two first-touch
    /// calls race: the map lock serializes the insert.
    pub fn get_or_create(&self, phone: &str, business_id: i64) -> Arc<Mutex<Session>> {
        let mut sessions = self.inner.lock().unwrap();
        sessions
            .entry((phone.to_string(), business_id))
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(phone, business_id))))
            .clone()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
