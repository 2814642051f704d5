#![forbid(unsafe_code)]

mod config;
mod error;
mod http;
mod orchestrator;
mod outcome;
mod outputs;
mod progress;
mod report;
mod steps;
mod user_data;
mod workflow;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_ENDPOINTS, DEFAULT_LOGIN_PATH, DEFAULT_REGISTER_PATH, DEFAULT_USERS,
    LoadConfig, LoadOverrides, Route, Target,
};
pub use error::{Error, Result};
pub use http::{HttpCapability, ResponseFuture};
pub use orchestrator::{RunResults, SessionTally, run_sessions};
pub use outcome::{Outcome, SessionEnd, SessionResult, Stage, Status, TRANSPORT_ERROR_CODE};
pub use outputs::{render_analytics, render_results, write_results_file};
pub use progress::{ProgressFn, ProgressUpdate};
pub use report::{
    AggregateReport, EndpointSeries, ErrorPoint, LatencyPercentiles, StageSummary, summarize,
};
pub use steps::{ENDPOINT_SUCCESS_CODE, LOGIN_SUCCESS_CODE, REGISTER_SUCCESS_CODE, StepOutput};
pub use user_data::{PASSWORD, UserCredentials, generate_user, generate_user_with};
pub use workflow::{SessionState, WorkflowRunner};

pub use flowload_http::{HttpClient, HttpRequest, HttpResponse};
