use std::future::Future;
use std::pin::Pin;

use flowload_http::{HttpClient, HttpRequest, HttpResponse};

pub type ResponseFuture<'a> =
    Pin<Box<dyn Future<Output = flowload_http::Result<HttpResponse>> + Send + 'a>>;

/// Sends one request and returns status, body and elapsed time.
///
/// Implementations must return `Ok` for every HTTP status and reserve `Err` for transport
/// failures (no response obtained). A single instance is shared by all sessions of a run.
pub trait HttpCapability: Send + Sync {
    fn send(&self, req: HttpRequest) -> ResponseFuture<'_>;
}

impl HttpCapability for HttpClient {
    fn send(&self, req: HttpRequest) -> ResponseFuture<'_> {
        Box::pin(self.request(req))
    }
}
