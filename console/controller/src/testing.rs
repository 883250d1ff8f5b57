use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::transport::{ApiRequest, BackendResponse, Method, Transport};

#[derive(Clone)]
enum Reply {
    Respond(BackendResponse),
    Fail(String),
    Hold(Arc<Notify>, BackendResponse),
}

/// In-memory backend that replays scripted replies per route and records
/// every request it sees. The last reply of a route repeats forever;
/// unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Reply::Respond(BackendResponse::new(status, body.to_string())))
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.push(method, path, Reply::Respond(BackendResponse::new(status, body)))
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::Fail(message.to_string()))
    }

    /// Replies only once `gate` is notified.
    pub fn hold(&self, method: Method, path: &str, gate: Arc<Notify>, status: u16, body: Value) -> &Self {
        self.push(
            method,
            path,
            Reply::Hold(gate, BackendResponse::new(status, body.to_string())),
        )
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests as `"METHOD /path"` strings, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| format!("{} {}", request.method, request.path()))
            .collect()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    fn next_reply(&self, method: Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<BackendResponse> {
        let method = request.method;
        let path = request.path();
        self.requests.lock().push(request);

        match self.next_reply(method, &path) {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            Some(Reply::Hold(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Ok(BackendResponse::new(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}
