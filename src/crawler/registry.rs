//! In-memory task-state registry.
//!
//! Authoritative for "is this session allowed to keep running". Entries are
//! process-lifetime only: a restart loses them, and with them the in-process
//! speed timers — a resumed session starts its speed accounting from a fresh
//! basis. That is intentional; the session row in storage remains the source
//! of truth for everything that must survive a restart.

use crate::types::{SessionId, Status};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

/// Transient per-session run state
#[derive(Clone, Debug)]
pub struct RunState {
    /// Status mirror of the session row, authoritative for continuation checks
    pub status: Status,
    /// Wall-clock anchor for detail-phase speed accounting
    pub detail_started: Option<Instant>,
    /// Articles crawled by this in-process run
    pub crawled_in_session: u64,
}

impl RunState {
    /// Fresh state for a newly started or resumed session
    pub fn running() -> Self {
        Self {
            status: Status::Running,
            detail_started: None,
            crawled_in_session: 0,
        }
    }
}

/// Registry of live crawl tasks, keyed by session ID
///
/// One mutex guards the whole map: pause/resume requests and the running
/// task race on single-key read-modify-writes, and a registry-wide lock is
/// sufficient at this scale. No eviction — entries live until the process
/// exits.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    states: Mutex<HashMap<SessionId, RunState>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the state for a session
    pub fn set(&self, id: SessionId, state: RunState) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(id, state);
        }
    }

    /// Get a snapshot of a session's state
    pub fn get(&self, id: SessionId) -> Option<RunState> {
        self.states.lock().ok().and_then(|s| s.get(&id).cloned())
    }

    /// Whether the session exists and is currently running
    pub fn is_running(&self, id: SessionId) -> bool {
        self.states
            .lock()
            .ok()
            .and_then(|s| s.get(&id).map(|state| state.status == Status::Running))
            .unwrap_or(false)
    }

    /// Unconditionally set a session's status, keeping its timers
    pub fn set_status(&self, id: SessionId, status: Status) {
        if let Ok(mut states) = self.states.lock() {
            states.entry(id).or_insert_with(RunState::running).status = status;
        }
    }

    /// Atomically transition a session from `from` to `to`
    ///
    /// Returns false when the entry is absent or not in `from` — the caller
    /// treats that as a precondition failure. This is the single check that
    /// keeps "pause just requested" and "task about to start next batch"
    /// from racing.
    pub fn transition(&self, id: SessionId, from: Status, to: Status) -> bool {
        let Ok(mut states) = self.states.lock() else {
            return false;
        };
        match states.get_mut(&id) {
            Some(state) if state.status == from => {
                state.status = to;
                true
            }
            _ => false,
        }
    }

    /// Record the detail-phase start anchor and reset the session counter
    pub fn mark_detail_started(&self, id: SessionId, at: Instant) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(&id) {
                state.detail_started = Some(at);
                state.crawled_in_session = 0;
            }
        }
    }

    /// Update the crawled-in-session counter
    pub fn set_crawled(&self, id: SessionId, crawled: u64) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(&id) {
                state.crawled_in_session = crawled;
            }
        }
    }

    /// IDs of all sessions currently running (for graceful shutdown)
    pub fn running_ids(&self) -> Vec<SessionId> {
        self.states
            .lock()
            .map(|states| {
                states
                    .iter()
                    .filter(|(_, state)| state.status == Status::Running)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }
}
