use barq_shared::{
    ConsoleError, DeployRequest, ExecutionLog, FunctionSummary, InvocationResult, InvokeRequest,
    PerformanceMetrics, RuntimeCatalogResponse,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error_message::ErrorMessage;
use crate::transport::{ApiRequest, BackendResponse, Transport};

const FUNCTIONS: &str = "functions";

/// Typed access to the backend's function endpoints.
///
/// Every method maps transport failures to `ConsoleError::Transport` and
/// non-success statuses to the error variant of its operation.
#[derive(Clone)]
pub struct FunctionsClient {
    transport: Arc<dyn Transport>,
}

// `output` is a string on the wire, but older backends returned whatever
// the handler produced.
#[derive(Deserialize)]
struct RawInvocation {
    #[serde(default)]
    output: Value,
    #[serde(default)]
    performance: Option<Value>,
}

impl FunctionsClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn list_runtimes(&self) -> Result<RuntimeCatalogResponse, ConsoleError> {
        let response = self.send(ApiRequest::get([FUNCTIONS, "runtimes"])).await?;
        if !response.is_success() {
            return Err(ConsoleError::CatalogUnavailable(failure_text(&response)));
        }
        decode(&response, "runtime catalog")
    }

    pub async fn deploy(&self, request: &DeployRequest) -> Result<(), ConsoleError> {
        let body = serde_json::to_value(request)
            .map_err(|e| ConsoleError::Transport(format!("failed to encode deploy request: {}", e)))?;
        let response = self.send(ApiRequest::post([FUNCTIONS, ""], body)).await?;
        if !response.is_success() {
            return Err(ConsoleError::Deploy(failure_text(&response)));
        }
        Ok(())
    }

    /// Succeeds only if the function is deployed.
    pub async fn check_exists(&self, func_id: &str) -> Result<(), ConsoleError> {
        let response = self.send(ApiRequest::get([FUNCTIONS, func_id])).await?;
        if response.is_not_found() {
            return Err(ConsoleError::FunctionNotFound(func_id.to_string()));
        }
        if !response.is_success() {
            return Err(ConsoleError::Lookup(failure_text(&response)));
        }
        Ok(())
    }

    pub async fn invoke(&self, func_id: &str, event: Value) -> Result<InvocationResult, ConsoleError> {
        let body = serde_json::to_value(InvokeRequest { event })
            .map_err(|e| ConsoleError::Transport(format!("failed to encode invoke request: {}", e)))?;
        let response = self
            .send(ApiRequest::post([FUNCTIONS, func_id, "invoke"], body))
            .await?;
        if !response.is_success() {
            return Err(ConsoleError::Invocation(failure_text(&response)));
        }

        let raw: RawInvocation = decode(&response, "invocation result")?;
        let output = match raw.output {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let performance = raw.performance.and_then(|value| parse_performance(func_id, value));

        Ok(InvocationResult { output, performance })
    }

    pub async fn list_functions(&self) -> Result<Vec<FunctionSummary>, ConsoleError> {
        let response = self.send(ApiRequest::get([FUNCTIONS, ""])).await?;
        if !response.is_success() {
            return Err(ConsoleError::Lookup(failure_text(&response)));
        }
        decode(&response, "function list")
    }

    pub async fn function_logs(&self, func_id: &str) -> Result<Vec<ExecutionLog>, ConsoleError> {
        let response = self.send(ApiRequest::get([FUNCTIONS, func_id, "logs"])).await?;
        if response.is_not_found() {
            return Err(ConsoleError::FunctionNotFound(func_id.to_string()));
        }
        if !response.is_success() {
            return Err(ConsoleError::Lookup(failure_text(&response)));
        }
        decode(&response, "execution logs")
    }

    async fn send(&self, request: ApiRequest) -> Result<BackendResponse, ConsoleError> {
        let method = request.method;
        let path = request.path();
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ConsoleError::Transport(format!("{:#}", e)))?;
        debug!("{} {} returned {}", method, path, response.status);
        Ok(response)
    }
}

fn failure_text(response: &BackendResponse) -> String {
    ErrorMessage::extract(response.status, &response.body).into_text()
}

fn decode<T: DeserializeOwned>(response: &BackendResponse, what: &str) -> Result<T, ConsoleError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ConsoleError::Transport(format!("malformed {} response: {}", what, e)))
}

fn parse_performance(func_id: &str, value: Value) -> Option<PerformanceMetrics> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!("Ignoring malformed performance metrics for {}: {}", func_id, e);
            None
        }
    }
}
