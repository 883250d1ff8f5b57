use anyhow::Result as AnyResult;
use barq_shared::{
    ConsoleError, EditorLanguage, ExecutionLog, FunctionSummary, InvocationResult, Operation,
    OperationId, RuntimeDescriptor,
};
use metrics::{Counter, Histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogLoader, CatalogState, RuntimeCatalog},
    client::FunctionsClient,
    config::ConsoleConfig,
    draft::DraftStore,
    events::{ConsoleEvent, EventSink},
    guard::{InFlight, InFlightGuard, OperationKey},
    transport::{HttpTransport, Transport},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub id: OperationId,
    pub func_id: String,
    pub runtime: String,
}

struct ConsoleMetrics {
    deploys: Counter,
    deploy_failures: Counter,
    invocations: Counter,
    invocation_failures: Counter,
    invoke_duration: Histogram,
}

impl ConsoleMetrics {
    fn new() -> Self {
        Self {
            deploys: metrics::counter!("barq_console_deploys_total"),
            deploy_failures: metrics::counter!("barq_console_deploy_failures_total"),
            invocations: metrics::counter!("barq_console_invocations_total"),
            invocation_failures: metrics::counter!("barq_console_invocation_failures_total"),
            invoke_duration: metrics::histogram!("barq_console_invoke_duration_ms"),
        }
    }
}

/// Drives one editing session: the draft, the runtime catalog, and the
/// deploy/invoke round trips against the backend.
///
/// Every operation reports its progress to the event sink as `Loading`,
/// then `Deployed`/`Invoked`/`Failed`, then `Idle`, and returns the same
/// outcome to the caller. Failures never poison the session.
pub struct FunctionConsole {
    draft: DraftStore,
    catalog: Arc<CatalogLoader>,
    client: FunctionsClient,
    in_flight: InFlight,
    events: Arc<dyn EventSink>,
    metrics: ConsoleMetrics,
}

impl FunctionConsole {
    pub fn new(client: FunctionsClient, catalog: Arc<CatalogLoader>, events: Arc<dyn EventSink>) -> Self {
        Self {
            draft: DraftStore::new(),
            catalog,
            client,
            in_flight: InFlight::new(),
            events,
            metrics: ConsoleMetrics::new(),
        }
    }

    pub fn with_transport(transport: Arc<dyn Transport>, events: Arc<dyn EventSink>) -> Self {
        let client = FunctionsClient::new(transport);
        let catalog = Arc::new(CatalogLoader::new(client.clone()));
        Self::new(client, catalog, events)
    }

    pub fn from_config(config: &ConsoleConfig, events: Arc<dyn EventSink>) -> AnyResult<Self> {
        info!("Using Barq API at {}", config.api_url);
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport, events))
    }

    pub fn draft(&self) -> &DraftStore {
        &self.draft
    }

    pub fn catalog_state(&self) -> CatalogState {
        self.catalog.state()
    }

    pub fn is_loading(&self, operation: Operation) -> bool {
        match operation {
            Operation::CatalogLoad => matches!(self.catalog.state(), CatalogState::Loading),
            _ => self.in_flight.is_loading(operation),
        }
    }

    pub fn editor_language(&self) -> EditorLanguage {
        self.draft.snapshot().editor_language()
    }

    /// Loads the runtime catalog and, if the draft has no runtime yet,
    /// selects the catalog default. A failure is published as a warning
    /// and leaves the runtime unset.
    pub async fn load_catalog(&self) -> Result<Arc<RuntimeCatalog>, ConsoleError> {
        let id = OperationId::new();
        self.events.publish(ConsoleEvent::Loading {
            id,
            operation: Operation::CatalogLoad,
        });

        let result = self.catalog.load().await;
        match &result {
            Ok(catalog) => {
                if let Some(default) = catalog.default_runtime() {
                    self.draft.default_runtime(default);
                }
                self.events.publish(ConsoleEvent::CatalogReady {
                    runtimes: catalog.len(),
                    selected: self.draft.runtime().map(|runtime| runtime.value),
                });
            }
            Err(e) => self.events.publish(ConsoleEvent::CatalogWarning { message: e.message() }),
        }

        self.events.publish(ConsoleEvent::Idle {
            id,
            operation: Operation::CatalogLoad,
        });
        result
    }

    pub fn select_runtime(&self, value: &str) -> Result<RuntimeDescriptor, ConsoleError> {
        let catalog = self
            .catalog
            .catalog()
            .ok_or_else(|| ConsoleError::Validation("runtime catalog not loaded".to_string()))?;
        self.draft.select_runtime(&catalog, value)
    }

    /// Deploys the current draft. The draft is never modified.
    pub async fn deploy(&self) -> Result<DeployOutcome, ConsoleError> {
        let guard = self.acquire(OperationKey::Deploy)?;
        let id = guard.id();
        self.begin(id, Operation::Deploy);
        self.metrics.deploys.increment(1);

        let result = self.run_deploy(id).await;
        drop(guard);

        self.finish(id, Operation::Deploy, &result, |outcome| ConsoleEvent::Deployed {
            id,
            func_id: outcome.func_id.clone(),
        });
        result
    }

    /// Invokes the draft's function with the draft's test event.
    pub async fn invoke(&self) -> Result<InvocationResult, ConsoleError> {
        let draft = self.draft.snapshot();
        self.invoke_function(&draft.name, &draft.test_event).await
    }

    /// Parses the event, confirms the function is deployed, then invokes it.
    pub async fn invoke_function(&self, func_id: &str, test_event_json: &str) -> Result<InvocationResult, ConsoleError> {
        let guard = self.acquire(OperationKey::Invoke(func_id.to_string()))?;
        let id = guard.id();
        self.begin(id, Operation::Invoke);
        self.metrics.invocations.increment(1);

        let started = Instant::now();
        let result = self.run_invoke(id, func_id, test_event_json).await;
        drop(guard);

        if result.is_ok() {
            self.metrics
                .invoke_duration
                .record(started.elapsed().as_secs_f64() * 1000.0);
        }
        self.finish(id, Operation::Invoke, &result, |output| ConsoleEvent::Invoked {
            id,
            func_id: func_id.to_string(),
            result: output.clone(),
        });
        result
    }

    pub async fn list_functions(&self) -> Result<Vec<FunctionSummary>, ConsoleError> {
        let functions = self.client.list_functions().await?;
        debug!("Backend reports {} deployed functions", functions.len());
        Ok(functions)
    }

    pub async fn function_logs(&self, func_id: &str) -> Result<Vec<ExecutionLog>, ConsoleError> {
        let logs = self.client.function_logs(func_id).await?;
        debug!("Fetched {} execution logs for {}", logs.len(), func_id);
        Ok(logs)
    }

    async fn run_deploy(&self, id: OperationId) -> Result<DeployOutcome, ConsoleError> {
        let request = self.draft.snapshot().deploy_request()?;
        info!("Deploying {} on {} [{}]", request.func_id, request.runtime, id);

        self.client.deploy(&request).await?;

        Ok(DeployOutcome {
            id,
            func_id: request.func_id,
            runtime: request.runtime,
        })
    }

    async fn run_invoke(&self, id: OperationId, func_id: &str, test_event_json: &str) -> Result<InvocationResult, ConsoleError> {
        if func_id.trim().is_empty() {
            return Err(ConsoleError::Validation("function name required".to_string()));
        }
        let event = parse_event(test_event_json)?;

        debug!("Checking that {} is deployed [{}]", func_id, id);
        self.client.check_exists(func_id).await?;

        info!("Invoking {} [{}]", func_id, id);
        self.client.invoke(func_id, event).await
    }

    fn acquire(&self, key: OperationKey) -> Result<InFlightGuard, ConsoleError> {
        let operation = key.operation();
        self.in_flight
            .try_acquire(key, OperationId::new())
            .inspect_err(|_| debug!("Rejected overlapping {}", operation))
    }

    fn begin(&self, id: OperationId, operation: Operation) {
        self.events.publish(ConsoleEvent::Loading { id, operation });
    }

    fn finish<T>(
        &self,
        id: OperationId,
        operation: Operation,
        result: &Result<T, ConsoleError>,
        on_success: impl FnOnce(&T) -> ConsoleEvent,
    ) {
        match result {
            Ok(value) => self.events.publish(on_success(value)),
            Err(error) => {
                match operation {
                    Operation::Deploy => self.metrics.deploy_failures.increment(1),
                    Operation::Invoke => self.metrics.invocation_failures.increment(1),
                    Operation::CatalogLoad => {}
                }
                warn!("{} {} failed: {}", operation, id, error);
                self.events.publish(ConsoleEvent::Failed {
                    id,
                    operation,
                    error: error.clone(),
                });
            }
        }
        self.events.publish(ConsoleEvent::Idle { id, operation });
    }
}

/// Parses a test event. The backend only accepts JSON objects.
pub fn parse_event(text: &str) -> Result<Value, ConsoleError> {
    match serde_json::from_str::<Value>(text) {
        Ok(event @ Value::Object(_)) => Ok(event),
        Ok(other) => Err(ConsoleError::InvalidEvent(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ConsoleError::InvalidEvent(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
