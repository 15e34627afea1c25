//! Scripted transport used by the layer tests.

use super::{Request, Response, Service};
use crate::Result;
use ohno::app_err;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Replays a fixed sequence of outcomes and records every request it receives.
///
/// Clones share the script and the record.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<Response>>>>,
    seen: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Result<Response>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            seen: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl Service<Request> for ScriptedTransport {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        self.seen.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(app_err!("script exhausted")))
    }
}

pub fn ok(body: &'static str) -> Result<Response> {
    Ok(Response::new(StatusCode::OK).with_body(body))
}

pub fn status(status: u16) -> Result<Response> {
    Ok(Response::new(StatusCode::from_u16(status).unwrap()))
}

/// Answers by exact path and query; unknown routes get a GitHub-style `404`.
#[derive(Clone, Debug, Default)]
pub struct RoutedTransport {
    routes: Arc<HashMap<String, (u16, &'static str)>>,
    seen: Arc<Mutex<Vec<Request>>>,
}

impl RoutedTransport {
    pub fn route(mut self, path_and_query: &str, status: u16, body: &'static str) -> Self {
        let _ = Arc::make_mut(&mut self.routes).insert(path_and_query.to_string(), (status, body));
        self
    }

    pub fn paths(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(path_and_query).collect()
    }
}

fn path_and_query(request: &Request) -> String {
    let url = request.url();
    url.query().map_or_else(|| url.path().to_string(), |q| format!("{}?{q}", url.path()))
}

impl Service<Request> for RoutedTransport {
    type Out = Result<Response>;

    async fn execute(&self, request: Request) -> Self::Out {
        let key = path_and_query(&request);
        self.seen.lock().unwrap().push(request);
        let (code, body) = self.routes.get(&key).copied().unwrap_or((404, r#"{"message":"Not Found"}"#));
        Ok(Response::new(StatusCode::from_u16(code).unwrap()).with_body(body))
    }
}
