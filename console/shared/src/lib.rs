use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod errors;
pub mod language;
pub mod limits;

pub use errors::*;
pub use language::*;
pub use limits::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    CatalogLoad,
    Deploy,
    Invoke,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CatalogLoad => "catalog load",
            Operation::Deploy => "deploy",
            Operation::Invoke => "invoke",
        };
        f.write_str(name)
    }
}

/// A backend-supported execution environment, e.g. `python3.11`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RuntimeDescriptor {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub category: String,
}

/// Body of `GET /functions/runtimes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeCatalogResponse {
    pub runtimes: Vec<RuntimeDescriptor>,
    #[serde(default)]
    pub default: String,
}

/// Body of `POST /functions/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployRequest {
    pub func_id: String,
    pub runtime: String,
    pub entrypoint: String,
    pub code: String,
}

/// Body of `POST /functions/{func_id}/invoke`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvokeRequest {
    pub event: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Cold,
    Warm,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionType::Cold => f.write_str("cold"),
            ExecutionType::Warm => f.write_str("warm"),
        }
    }
}

/// Timing reported by the backend for one invocation.
///
/// `cold_start_ms` and `container_id` depend on the backend and are
/// frequently absent, even for cold executions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub execution_type: ExecutionType,
    #[serde(
        rename = "cold_start_time_ms",
        alias = "cold_start_ms",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cold_start_ms: Option<f64>,
    #[serde(rename = "execution_time_ms", alias = "execution_ms")]
    pub execution_ms: f64,
    #[serde(rename = "total_time_ms", alias = "total_ms")]
    pub total_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl PerformanceMetrics {
    /// Labelled values for display, skipping whatever the backend left out.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("execution", self.execution_type.to_string())];
        if let Some(cold_start) = self.cold_start_ms {
            fields.push(("cold start", format!("{:.1} ms", cold_start)));
        }
        fields.push(("execution time", format!("{:.1} ms", self.execution_ms)));
        fields.push(("total time", format!("{:.1} ms", self.total_ms)));
        if let Some(container_id) = &self.container_id {
            fields.push(("container", container_id.clone()));
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResult {
    pub output: String,
    pub performance: Option<PerformanceMetrics>,
}

/// Registry entry for a deployed function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionSummary {
    #[serde(rename = "_id", alias = "func_id")]
    pub func_id: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub entrypoint: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One recorded execution of a function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionLog {
    #[serde(rename = "_id", alias = "log_id")]
    pub log_id: String,
    pub func_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub event: serde_json::Value,
    #[serde(default)]
    pub success: bool,
}
