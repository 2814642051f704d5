use std::time::Duration;

use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
    /// Time from dispatching the request until the full body was read.
    pub elapsed: Duration,
}

impl HttpResponse {
    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: http::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self::get_owned(url.to_string())
    }

    pub fn get_owned(url: String) -> Self {
        Self {
            method: http::Method::GET,
            url,
            headers: Vec::new(),
            body: Bytes::new(),
            timeout: None,
        }
    }

    pub fn post(url: &str, body: Bytes) -> Self {
        Self::post_owned(url.to_string(), body)
    }

    pub fn post_owned(url: String, body: Bytes) -> Self {
        Self {
            method: http::Method::POST,
            url,
            headers: Vec::new(),
            body,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_headers_and_timeout() {
        let req = HttpRequest::get("http://localhost/api/v1/profile/me")
            .with_header("Authorization", "Bearer abc")
            .with_timeout(Some(Duration::from_secs(2)));

        assert_eq!(req.method, http::Method::GET);
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
        assert_eq!(req.timeout, Some(Duration::from_secs(2)));
        assert!(req.body.is_empty());
    }

    #[test]
    fn body_text_is_lossy() {
        let res = HttpResponse {
            status: 400,
            body: Bytes::from_static(b"bad \xff request"),
            elapsed: Duration::ZERO,
        };
        assert!(res.body_text().contains('\u{FFFD}'));
        assert!(res.body_text().starts_with("bad "));
    }
}
