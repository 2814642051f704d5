use crate::config::Target;
use crate::http::HttpCapability;
use crate::outcome::{Outcome, SessionEnd, SessionResult, Stage};
use crate::steps;
use crate::user_data::UserCredentials;

/// Per-user workflow state.
///
/// `Registering -> LoggingIn -> CallingEndpoints -> Done`, leaving early to `FailedAt` when
/// register or login does not succeed. Endpoint calls never short-circuit each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Registering,
    LoggingIn,
    CallingEndpoints { token: String },
    Done,
    FailedAt(Stage),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FailedAt(_))
    }

    fn end(&self) -> Option<SessionEnd> {
        match self {
            Self::Done => Some(SessionEnd::Completed),
            Self::FailedAt(stage) => Some(SessionEnd::FailedAt(*stage)),
            _ => None,
        }
    }
}

/// Drives one simulated user through register, login and the authenticated endpoints.
pub struct WorkflowRunner<'a> {
    client: &'a dyn HttpCapability,
    target: &'a Target,
    user_index: u64,
    creds: UserCredentials,
}

impl<'a> WorkflowRunner<'a> {
    pub fn new(
        client: &'a dyn HttpCapability,
        target: &'a Target,
        user_index: u64,
        creds: UserCredentials,
    ) -> Self {
        Self {
            client,
            target,
            user_index,
            creds,
        }
    }

    pub async fn run(self) -> SessionResult {
        let mut outcomes = Vec::with_capacity(2 + self.target.endpoints.len());
        let mut state = SessionState::Registering;

        while !state.is_terminal() {
            state = self.advance(state, &mut outcomes).await;
        }

        let end = state.end().unwrap_or(SessionEnd::Completed);
        tracing::debug!(user = self.user_index, ?end, outcomes = outcomes.len(), "session finished");

        SessionResult {
            user_index: self.user_index,
            end,
            outcomes,
        }
    }

    async fn advance(&self, state: SessionState, outcomes: &mut Vec<Outcome>) -> SessionState {
        match state {
            SessionState::Registering => {
                let out = steps::register(self.client, self.target, &self.creds).await;
                let next = if out.outcome.is_success() {
                    SessionState::LoggingIn
                } else {
                    SessionState::FailedAt(Stage::Register)
                };
                self.record(out.outcome, outcomes);
                next
            }
            SessionState::LoggingIn => {
                let out = steps::login(self.client, self.target, &self.creds).await;
                let next = match out.token {
                    Some(token) if out.outcome.is_success() => {
                        SessionState::CallingEndpoints { token }
                    }
                    _ => SessionState::FailedAt(Stage::Login),
                };
                self.record(out.outcome, outcomes);
                next
            }
            SessionState::CallingEndpoints { token } => {
                for route in &self.target.endpoints {
                    let outcome = steps::call_endpoint(self.client, self.target, route, &token).await;
                    self.record(outcome, outcomes);
                }
                SessionState::Done
            }
            terminal @ (SessionState::Done | SessionState::FailedAt(_)) => terminal,
        }
    }

    fn record(&self, outcome: Outcome, outcomes: &mut Vec<Outcome>) {
        tracing::debug!(
            user = self.user_index,
            stage = %outcome.stage(),
            endpoint = outcome.endpoint(),
            status = %outcome.status(),
            code = outcome.response_code(),
            elapsed = ?outcome.elapsed(),
            "step outcome"
        );
        outcomes.push(outcome);
    }
}
