use barq_shared::{ConsoleError, RuntimeCatalogResponse, RuntimeDescriptor};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::FunctionsClient;

/// The runtimes the backend accepts, in backend order, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCatalog {
    runtimes: Vec<RuntimeDescriptor>,
    default: Option<String>,
}

impl RuntimeCatalog {
    pub fn from_response(response: RuntimeCatalogResponse) -> Self {
        let mut seen = HashSet::new();
        let runtimes: Vec<RuntimeDescriptor> = response
            .runtimes
            .into_iter()
            .filter(|runtime| seen.insert(runtime.value.clone()))
            .collect();

        let default = if runtimes.iter().any(|r| r.value == response.default) {
            Some(response.default)
        } else {
            if !response.default.is_empty() {
                warn!(
                    "Catalog default '{}' is not an offered runtime, using the first entry",
                    response.default
                );
            }
            runtimes.first().map(|r| r.value.clone())
        };

        Self { runtimes, default }
    }

    pub fn runtimes(&self) -> &[RuntimeDescriptor] {
        &self.runtimes
    }

    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }

    pub fn find(&self, value: &str) -> Option<&RuntimeDescriptor> {
        self.runtimes.iter().find(|r| r.value == value)
    }

    pub fn default_runtime(&self) -> Option<&RuntimeDescriptor> {
        self.default.as_deref().and_then(|value| self.find(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Uninitialized,
    Loading,
    Ready(Arc<RuntimeCatalog>),
    Failed(ConsoleError),
}

/// Fetches the runtime catalog at most once.
///
/// Concurrent callers wait on the single fetch. A failure is remembered
/// and returned from then on; retrying needs a fresh loader.
pub struct CatalogLoader {
    client: FunctionsClient,
    state: RwLock<CatalogState>,
    fetch: Mutex<()>,
}

impl CatalogLoader {
    pub fn new(client: FunctionsClient) -> Self {
        Self {
            client,
            state: RwLock::new(CatalogState::Uninitialized),
            fetch: Mutex::new(()),
        }
    }

    pub fn state(&self) -> CatalogState {
        self.state.read().clone()
    }

    pub fn catalog(&self) -> Option<Arc<RuntimeCatalog>> {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => Some(catalog.clone()),
            _ => None,
        }
    }

    pub async fn load(&self) -> Result<Arc<RuntimeCatalog>, ConsoleError> {
        let _fetch = self.fetch.lock().await;
        if let Some(settled) = self.settled() {
            debug!("Runtime catalog already settled");
            return settled;
        }

        *self.state.write() = CatalogState::Loading;
        let outcome = self.client.list_runtimes().await;

        let (state, result) = match outcome {
            Ok(response) => {
                let catalog = Arc::new(RuntimeCatalog::from_response(response));
                info!("Loaded {} runtimes", catalog.len());
                (CatalogState::Ready(catalog.clone()), Ok(catalog))
            }
            Err(e) => {
                warn!("Runtime catalog load failed: {}", e);
                (CatalogState::Failed(e.clone()), Err(e))
            }
        };
        *self.state.write() = state;
        result
    }

    fn settled(&self) -> Option<Result<Arc<RuntimeCatalog>, ConsoleError>> {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => Some(Ok(catalog.clone())),
            CatalogState::Failed(e) => Some(Err(e.clone())),
            CatalogState::Uninitialized | CatalogState::Loading => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::Method;
    use serde_json::json;

    fn descriptor(value: &str, label: &str) -> RuntimeDescriptor {
        RuntimeDescriptor {
            value: value.into(),
            label: label.into(),
            category: "interpreted".into(),
        }
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let catalog = RuntimeCatalog::from_response(RuntimeCatalogResponse {
            runtimes: vec![
                descriptor("python3.11", "Python 3.11"),
                descriptor("nodejs20.x", "Node.js 20.x"),
                descriptor("python3.11", "Python 3.11 (again)"),
            ],
            default: "nodejs20.x".into(),
        });

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("python3.11").unwrap().label, "Python 3.11");
        assert_eq!(catalog.default_runtime().unwrap().value, "nodejs20.x");
    }

    #[test]
    fn test_unknown_default_falls_back_to_first() {
        let catalog = RuntimeCatalog::from_response(RuntimeCatalogResponse {
            runtimes: vec![descriptor("go1.x", "Go 1.x"), descriptor("ruby3.2", "Ruby 3.2")],
            default: "cobol".into(),
        });
        assert_eq!(catalog.default_runtime().unwrap().value, "go1.x");

        let empty = RuntimeCatalog::from_response(RuntimeCatalogResponse {
            runtimes: vec![],
            default: "python3.11".into(),
        });
        assert!(empty.is_empty());
        assert!(empty.default_runtime().is_none());
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Get,
            "/functions/runtimes",
            200,
            json!({
                "runtimes": [{ "value": "python3.11", "label": "Python 3.11", "category": "python" }],
                "default": "python3.11",
            }),
        );
        let loader = CatalogLoader::new(FunctionsClient::new(transport.clone()));
        assert_eq!(loader.state(), CatalogState::Uninitialized);

        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.request_count(), 1);
        assert!(matches!(loader.state(), CatalogState::Ready(_)));
    }

    #[tokio::test]
    async fn test_failure_is_sticky() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Get,
            "/functions/runtimes",
            503,
            json!({ "detail": "registry offline" }),
        );
        let loader = CatalogLoader::new(FunctionsClient::new(transport.clone()));

        let err = loader.load().await.unwrap_err();
        assert_eq!(err, ConsoleError::CatalogUnavailable("registry offline".into()));

        assert_eq!(loader.load().await.unwrap_err(), err);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(loader.state(), CatalogState::Failed(err));
        assert!(loader.catalog().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Get,
            "/functions/runtimes",
            200,
            json!({ "runtimes": [{ "value": "go1.x", "label": "Go 1.x" }], "default": "go1.x" }),
        );
        let loader = Arc::new(CatalogLoader::new(FunctionsClient::new(transport.clone())));

        let loads = (0..8).map(|_| {
            let loader = loader.clone();
            async move { loader.load().await }
        });
        let results = futures::future::join_all(loads).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_a_transport_error() {
        let transport = ScriptedTransport::new();
        transport.respond_raw(Method::Get, "/functions/runtimes", 200, "<html>");
        let loader = CatalogLoader::new(FunctionsClient::new(transport));

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Transport(_)));
    }
}
