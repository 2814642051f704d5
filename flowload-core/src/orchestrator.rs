use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::config::Target;
use crate::error::Result;
use crate::http::HttpCapability;
use crate::outcome::{Outcome, SessionEnd, SessionResult, Stage};
use crate::progress::{ProgressFn, ProgressUpdate};
use crate::user_data::generate_user;
use crate::workflow::WorkflowRunner;

/// How sessions ended, counted across the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub completed: u64,
    pub failed_at_register: u64,
    pub failed_at_login: u64,
}

impl SessionTally {
    fn add(&mut self, end: SessionEnd) {
        match end {
            SessionEnd::Completed => self.completed += 1,
            SessionEnd::FailedAt(Stage::Register) => self.failed_at_register += 1,
            SessionEnd::FailedAt(_) => self.failed_at_login += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.completed + self.failed_at_register + self.failed_at_login
    }
}

/// Flat, unordered outcomes of every session in a run.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub outcomes: Vec<Outcome>,
    pub sessions: SessionTally,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    sessions_done: AtomicU64,
    outcomes_total: AtomicU64,
    failures_total: AtomicU64,
}

/// Runs `users` independent sessions concurrently and waits for all of them.
///
/// With `concurrency == None` every session starts immediately; otherwise at most
/// `concurrency` sessions are in flight. Each session returns its own `SessionResult`,
/// which are only merged after the join, so the order of `outcomes` is unspecified.
pub async fn run_sessions(
    client: Arc<dyn HttpCapability>,
    target: Arc<Target>,
    users: u64,
    concurrency: Option<usize>,
    progress: Option<ProgressFn>,
) -> Result<RunResults> {
    tracing::info!(users, concurrency = ?concurrency, "starting sessions");

    let limiter = concurrency.map(|n| Arc::new(Semaphore::new(n.min(Semaphore::MAX_PERMITS))));
    let counters = Arc::new(Counters::default());
    let started = Instant::now();

    // Credentials exist before any request goes out.
    let users_data: Vec<_> = (0..users).map(|i| (i, generate_user(i))).collect();

    let mut handles = Vec::with_capacity(users_data.len());
    for (user_index, creds) in users_data {
        let client = client.clone();
        let target = target.clone();
        let limiter = limiter.clone();
        let counters = counters.clone();
        let progress = progress.clone();

        handles.push(tokio::spawn(async move {
            let _permit = match limiter {
                Some(limiter) => Some(limiter.acquire_owned().await?),
                None => None,
            };

            let session = WorkflowRunner::new(&*client, &target, user_index, creds)
                .run()
                .await;

            let done = counters.sessions_done.fetch_add(1, Ordering::Relaxed) + 1;
            let outcomes = counters
                .outcomes_total
                .fetch_add(session.outcomes.len() as u64, Ordering::Relaxed)
                + session.outcomes.len() as u64;
            let failures = counters
                .failures_total
                .fetch_add(session.failures(), Ordering::Relaxed)
                + session.failures();

            if let Some(progress) = &progress {
                progress(ProgressUpdate {
                    sessions_done: done,
                    sessions_total: users,
                    outcomes_total: outcomes,
                    failures_total: failures,
                    elapsed: started.elapsed(),
                });
            }

            Ok::<SessionResult, crate::Error>(session)
        }));
    }

    let mut results = RunResults::default();
    for handle in handles {
        let session = handle.await??;
        results.sessions.add(session.end);
        results.outcomes.extend(session.outcomes);
    }
    results.elapsed = started.elapsed();

    tracing::info!(
        sessions = results.sessions.total(),
        completed = results.sessions.completed,
        outcomes = results.outcomes.len(),
        elapsed = ?results.elapsed,
        "all sessions finished"
    );

    Ok(results)
}
