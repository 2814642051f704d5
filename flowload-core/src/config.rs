use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use flowload_http::join_url;
use tokio::sync::Semaphore;

use super::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REGISTER_PATH: &str = "/api/v1/auth/register";
pub const DEFAULT_LOGIN_PATH: &str = "/api/v1/auth/login";
pub const DEFAULT_ENDPOINTS: &[&str] = &["/api/v1/profile/me", "/api/v1/auth/get-me"];
pub const DEFAULT_USERS: u64 = 100;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Fully resolved, validated run configuration. Read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub base_url: String,
    pub register_path: String,
    pub login_path: String,
    pub endpoints: Vec<String>,
    pub users: u64,

    /// Maximum number of sessions in flight. `None` starts every session at once.
    pub concurrency: Option<usize>,

    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            register_path: DEFAULT_REGISTER_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            users: DEFAULT_USERS,
            concurrency: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Partial configuration from one source (config file, CLI flags).
#[derive(Debug, Clone, Default)]
pub struct LoadOverrides {
    pub base_url: Option<String>,
    pub register_path: Option<String>,
    pub login_path: Option<String>,
    pub endpoints: Option<Vec<String>>,
    pub users: Option<u64>,
    pub concurrency: Option<usize>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl LoadConfig {
    /// Layers `file` over the defaults and `cli` over both, then validates the result.
    pub fn resolve(file: LoadOverrides, cli: LoadOverrides) -> Result<Self> {
        let d = Self::default();

        let cfg = Self {
            base_url: cli.base_url.or(file.base_url).unwrap_or(d.base_url),
            register_path: cli
                .register_path
                .or(file.register_path)
                .unwrap_or(d.register_path),
            login_path: cli.login_path.or(file.login_path).unwrap_or(d.login_path),
            endpoints: cli.endpoints.or(file.endpoints).unwrap_or(d.endpoints),
            users: cli.users.or(file.users).unwrap_or(d.users),
            concurrency: cli.concurrency.or(file.concurrency).or(d.concurrency),
            request_timeout: cli
                .request_timeout
                .or(file.request_timeout)
                .unwrap_or(d.request_timeout),
            connect_timeout: cli
                .connect_timeout
                .or(file.connect_timeout)
                .unwrap_or(d.connect_timeout),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|_| Error::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::InvalidBaseUrl(self.base_url.clone()));
        }

        // Stage partitions match on exact paths, so every route must be unique.
        let mut seen = HashSet::new();
        for path in [&self.register_path, &self.login_path]
            .into_iter()
            .chain(self.endpoints.iter())
        {
            if !path.starts_with('/') {
                return Err(Error::InvalidPath(path.clone()));
            }
            if !seen.insert(path.as_str()) {
                return Err(Error::DuplicatePath(path.clone()));
            }
        }

        if self.endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        if self.users == 0 {
            return Err(Error::InvalidUsers);
        }
        if self
            .concurrency
            .is_some_and(|n| n == 0 || n > Semaphore::MAX_PERMITS)
        {
            return Err(Error::InvalidConcurrency);
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidTimeout("requestTimeout"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::InvalidTimeout("connectTimeout"));
        }

        Ok(())
    }
}

/// Endpoint identity plus its absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: Arc<str>,
    pub url: String,
}

impl Route {
    fn new(base_url: &str, path: &str) -> Self {
        Self {
            path: Arc::from(path),
            url: join_url(base_url, path),
        }
    }
}

/// Resolved routes of the target service, shared read-only by all sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub register: Route,
    pub login: Route,
    pub endpoints: Vec<Route>,
    pub request_timeout: Duration,
}

impl Target {
    pub fn from_config(cfg: &LoadConfig) -> Self {
        Self {
            register: Route::new(&cfg.base_url, &cfg.register_path),
            login: Route::new(&cfg.base_url, &cfg.login_path),
            endpoints: cfg
                .endpoints
                .iter()
                .map(|p| Route::new(&cfg.base_url, p))
                .collect(),
            request_timeout: cfg.request_timeout,
        }
    }

    /// Stage an endpoint identity belongs to, by exact match on the configured paths.
    pub fn stage_of(&self, endpoint: &str) -> Option<super::Stage> {
        if endpoint == &*self.register.path {
            Some(super::Stage::Register)
        } else if endpoint == &*self.login.path {
            Some(super::Stage::Login)
        } else if self.endpoints.iter().any(|r| &*r.path == endpoint) {
            Some(super::Stage::EndpointCall)
        } else {
            None
        }
    }
}
