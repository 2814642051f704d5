use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use flowload_http::{HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::config::{Route, Target};
use crate::http::HttpCapability;
use crate::outcome::{Outcome, Stage};
use crate::user_data::UserCredentials;

pub const REGISTER_SUCCESS_CODE: u16 = 201;
pub const LOGIN_SUCCESS_CODE: u16 = 200;
pub const ENDPOINT_SUCCESS_CODE: u16 = 200;

const MISSING_TOKEN: &str = "login response did not contain `data.token`";

/// Outcome of a step plus the auth token the response carried, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub outcome: Outcome,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    identity: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: Option<String>,
}

fn extract_token(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<TokenEnvelope>(body)
        .ok()?
        .data?
        .token
        .filter(|t| !t.is_empty())
}

enum Exchange {
    Expected(HttpResponse),
    Failed(Outcome),
}

/// Sends `req` once and folds anything but `expected` into a failure outcome.
async fn exchange(
    client: &dyn HttpCapability,
    stage: Stage,
    endpoint: &Arc<str>,
    req: HttpRequest,
    expected: u16,
) -> Exchange {
    let started = Instant::now();
    match client.send(req).await {
        Ok(res) if res.status == expected => Exchange::Expected(res),
        Ok(res) => Exchange::Failed(Outcome::protocol_failure(
            stage,
            endpoint.clone(),
            res.status,
            res.body_text(),
            res.elapsed,
        )),
        Err(err) => {
            tracing::warn!(%stage, endpoint = %endpoint, kind = %err.transport_error_kind(), error = %err, "transport error");
            Exchange::Failed(Outcome::transport_failure(
                stage,
                endpoint.clone(),
                &err,
                started.elapsed(),
            ))
        }
    }
}

fn json_post(route: &Route, target: &Target, body: Vec<u8>) -> HttpRequest {
    HttpRequest::post(&route.url, Bytes::from(body))
        .with_header("accept", "application/json")
        .with_header("content-type", "application/json")
        .with_timeout(Some(target.request_timeout))
}

fn encode_failure(stage: Stage, route: &Route, err: &serde_json::Error) -> StepOutput {
    StepOutput {
        outcome: Outcome::transport_failure(stage, route.path.clone(), err, Default::default()),
        token: None,
    }
}

/// POSTs the full credential payload; success is `201 Created`.
pub async fn register(
    client: &dyn HttpCapability,
    target: &Target,
    creds: &UserCredentials,
) -> StepOutput {
    let route = &target.register;
    let body = match serde_json::to_vec(creds) {
        Ok(b) => b,
        Err(err) => return encode_failure(Stage::Register, route, &err),
    };

    let req = json_post(route, target, body);
    match exchange(client, Stage::Register, &route.path, req, REGISTER_SUCCESS_CODE).await {
        Exchange::Failed(outcome) => StepOutput {
            outcome,
            token: None,
        },
        Exchange::Expected(res) => StepOutput {
            outcome: Outcome::success(Stage::Register, route.path.clone(), res.status, res.elapsed),
            token: extract_token(&res.body),
        },
    }
}

/// POSTs `{identity, password}`; success is `200 OK` with a token in `data.token`.
///
/// A 200 without a token is recorded as a failure: nothing after login can run without one.
pub async fn login(
    client: &dyn HttpCapability,
    target: &Target,
    creds: &UserCredentials,
) -> StepOutput {
    let route = &target.login;
    let payload = LoginPayload {
        identity: &creds.email,
        password: &creds.password,
    };
    let body = match serde_json::to_vec(&payload) {
        Ok(b) => b,
        Err(err) => return encode_failure(Stage::Login, route, &err),
    };

    let req = json_post(route, target, body);
    match exchange(client, Stage::Login, &route.path, req, LOGIN_SUCCESS_CODE).await {
        Exchange::Failed(outcome) => StepOutput {
            outcome,
            token: None,
        },
        Exchange::Expected(res) => match extract_token(&res.body) {
            Some(token) => StepOutput {
                outcome: Outcome::login_success(
                    route.path.clone(),
                    res.status,
                    res.elapsed,
                    token.clone(),
                ),
                token: Some(token),
            },
            None => StepOutput {
                outcome: Outcome::protocol_failure(
                    Stage::Login,
                    route.path.clone(),
                    res.status,
                    MISSING_TOKEN.to_string(),
                    res.elapsed,
                ),
                token: None,
            },
        },
    }
}

/// GETs one authenticated endpoint with a bearer token; success is `200 OK`.
pub async fn call_endpoint(
    client: &dyn HttpCapability,
    target: &Target,
    route: &Route,
    token: &str,
) -> Outcome {
    let req = HttpRequest::get(&route.url)
        .with_header("accept", "application/json")
        .with_header("authorization", format!("Bearer {token}"))
        .with_timeout(Some(target.request_timeout));

    match exchange(client, Stage::EndpointCall, &route.path, req, ENDPOINT_SUCCESS_CODE).await {
        Exchange::Failed(outcome) => outcome,
        Exchange::Expected(res) => {
            Outcome::success(Stage::EndpointCall, route.path.clone(), res.status, res.elapsed)
        }
    }
}
