use std::sync::Arc;
use std::time::Duration;

/// Snapshot emitted each time a session reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub sessions_done: u64,
    pub sessions_total: u64,
    pub outcomes_total: u64,
    pub failures_total: u64,
    pub elapsed: Duration,
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
