#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use flowload_core::{
    HttpCapability, HttpRequest, HttpResponse, LoadConfig, LoadOverrides, ResponseFuture, Target,
};

pub type Responder =
    dyn Fn(&HttpRequest) -> flowload_http::Result<HttpResponse> + Send + Sync + 'static;

/// In-memory `HttpCapability` answering each request through a closure and recording it.
///
/// With a delay set, each response is held open for that long so concurrent sessions overlap,
/// and the highest number of simultaneously pending requests is tracked.
pub struct ScriptedHttp {
    responder: Box<Responder>,
    seen: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedHttp {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> flowload_http::Result<HttpResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::build(responder, None)
    }

    pub fn with_delay(
        delay: Duration,
        responder: impl Fn(&HttpRequest) -> flowload_http::Result<HttpResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::build(responder, Some(delay))
    }

    fn build(
        responder: impl Fn(&HttpRequest) -> flowload_http::Result<HttpResponse> + Send + Sync + 'static,
        delay: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl HttpCapability for ScriptedHttp {
    fn send(&self, req: HttpRequest) -> ResponseFuture<'_> {
        let res = (self.responder)(&req);
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(req);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        Box::pin(async move {
            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => tokio::task::yield_now().await,
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            res
        })
    }
}

pub fn reply(status: u16, body: &str) -> flowload_http::Result<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: Bytes::from(body.to_string()),
        elapsed: Duration::from_millis(1),
    })
}

pub fn token_body(token: &str) -> String {
    format!(r#"{{"data":{{"token":"{token}"}}}}"#)
}

pub fn path_of(req: &HttpRequest) -> String {
    url::Url::parse(&req.url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}

pub fn body_json(req: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(&req.body).unwrap_or_default()
}

pub fn target() -> Arc<Target> {
    let cfg = LoadConfig::resolve(
        LoadOverrides::default(),
        LoadOverrides {
            base_url: Some("http://service.test".to_string()),
            ..LoadOverrides::default()
        },
    )
    .unwrap_or_else(|e| panic!("invalid test config: {e}"));
    Arc::new(Target::from_config(&cfg))
}

/// Happy-path service: register 201 with token "abc", login 200 with token "xyz", endpoints 200.
pub fn healthy_service(req: &HttpRequest) -> flowload_http::Result<HttpResponse> {
    match path_of(req).as_str() {
        "/api/v1/auth/register" => reply(201, &token_body("abc")),
        "/api/v1/auth/login" => reply(200, &token_body("xyz")),
        _ => reply(200, r#"{"data":{}}"#),
    }
}
