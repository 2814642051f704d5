use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Response code recorded when no HTTP response was obtained at all.
pub const TRANSPORT_ERROR_CODE: u16 = 500;

/// Phase of the fixed user workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Register,
    Login,
    EndpointCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

/// A single observed result of one network call.
///
/// `token` is only ever set on a successful login, and `error_detail` is set iff the
/// call failed. The constructors are the only way to build an `Outcome`, which keeps
/// both rules true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    stage: Stage,
    endpoint: Arc<str>,
    status: Status,
    elapsed: Duration,
    response_code: u16,
    token: Option<String>,
    error_detail: Option<String>,
}

impl Outcome {
    pub fn success(stage: Stage, endpoint: Arc<str>, response_code: u16, elapsed: Duration) -> Self {
        Self {
            stage,
            endpoint,
            status: Status::Success,
            elapsed,
            response_code,
            token: None,
            error_detail: None,
        }
    }

    pub fn login_success(
        endpoint: Arc<str>,
        response_code: u16,
        elapsed: Duration,
        token: String,
    ) -> Self {
        Self {
            token: Some(token),
            ..Self::success(Stage::Login, endpoint, response_code, elapsed)
        }
    }

    /// A response was received but its status was not the expected success code.
    pub fn protocol_failure(
        stage: Stage,
        endpoint: Arc<str>,
        response_code: u16,
        body: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            stage,
            endpoint,
            status: Status::Failure,
            elapsed,
            response_code,
            token: None,
            error_detail: Some(body),
        }
    }

    /// No response was obtained (connect error, timeout, unreadable body).
    pub fn transport_failure(
        stage: Stage,
        endpoint: Arc<str>,
        err: &dyn fmt::Display,
        elapsed: Duration,
    ) -> Self {
        Self {
            stage,
            endpoint,
            status: Status::Failure,
            elapsed,
            response_code: TRANSPORT_ERROR_CODE,
            token: None,
            error_detail: Some(err.to_string()),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn response_code(&self) -> u16 {
        self.response_code
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}

/// Where a session's workflow stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEnd {
    Completed,
    FailedAt(Stage),
}

/// Ordered outcomes of one simulated user's (possibly truncated) workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub user_index: u64,
    pub end: SessionEnd,
    pub outcomes: Vec<Outcome>,
}

impl SessionResult {
    pub fn failures(&self) -> u64 {
        self.outcomes.iter().filter(|o| !o.is_success()).count() as u64
    }
}
