//! Default request headers shared by every call of a client.
//!
//! # Design
//! The store always carries two entries: the fixed identity header
//! `X-Requested-With: XMLHttpRequest`, which can be neither changed nor
//! removed, and `Accept: application/json`, which can be changed but not
//! removed. Those rules guard the live store only. Every call works on an
//! owned `snapshot()`; per-call overrides and content-type writes touch the
//! snapshot and never flow back into the store.
//!
//! Header names compare ASCII case-insensitively, as on the wire.

use tracing::{debug, warn};

pub const X_REQUESTED_WITH: &str = "X-Requested-With";
pub const X_REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
pub const ACCEPT: &str = "Accept";
pub const ACCEPT_JSON: &str = "application/json";

/// Ordered default headers with two protected entries.
#[derive(Debug, Clone)]
pub struct HeaderStore {
    entries: Vec<(String, String)>,
}

impl Default for HeaderStore {
    fn default() -> Self {
        Self {
            entries: vec![
                (X_REQUESTED_WITH.to_string(), X_REQUESTED_WITH_VALUE.to_string()),
                (ACCEPT.to_string(), ACCEPT_JSON.to_string()),
            ],
        }
    }
}

impl HeaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite a default header.
    ///
    /// Writes to `X-Requested-With` are ignored.
    pub fn set(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case(X_REQUESTED_WITH) {
            warn!(header = name, "ignoring write to fixed identity header");
            return;
        }
        upsert(&mut self.entries, name, value);
    }

    /// Remove a default header.
    ///
    /// Removing `X-Requested-With` or `Accept` is a no-op.
    pub fn remove(&mut self, name: &str) {
        if name.eq_ignore_ascii_case(X_REQUESTED_WITH) || name.eq_ignore_ascii_case(ACCEPT) {
            debug!(header = name, "protected header kept");
            return;
        }
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Owned copy of the current entries, in insertion order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries.clone()
    }
}

/// Apply per-call header overrides to a snapshot. No entry is protected here.
pub fn merge(snapshot: &mut Vec<(String, String)>, overrides: &[(&str, &str)]) {
    for (name, value) in overrides {
        upsert(snapshot, name, value);
    }
}

fn upsert(entries: &mut Vec<(String, String)>, name: &str, value: &str) {
    match entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some((_, v)) => *v = value.to_string(),
        None => entries.push((name.to_string(), value.to_string())),
    }
}
