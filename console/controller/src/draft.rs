use barq_shared::{
    clamp_memory_mb, clamp_timeout_sec, language_of, ConsoleError, DeployRequest, EditorLanguage,
    RuntimeDescriptor, DEFAULT_MEMORY_MB, DEFAULT_TIMEOUT_SEC,
};
use parking_lot::RwLock;

use crate::catalog::RuntimeCatalog;

const DEFAULT_NAME: &str = "my-function";
const DEFAULT_ENTRYPOINT: &str = "main";
const DEFAULT_TEST_EVENT: &str = "{\n  \"name\": \"Barq\"\n}";
const DEFAULT_SOURCE: &str = "def main(event):\n    name = event.get(\"name\", \"World\")\n    return f\"Hello {name}!\"\n";

/// The function being edited. Only `DraftStore` hands out mutable access.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDraft {
    pub name: String,
    pub runtime: Option<RuntimeDescriptor>,
    pub entrypoint: String,
    pub source_code: String,
    pub memory_mb: u32,
    pub timeout_sec: u32,
    pub test_event: String,
}

impl Default for FunctionDraft {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            runtime: None,
            entrypoint: DEFAULT_ENTRYPOINT.to_string(),
            source_code: DEFAULT_SOURCE.to_string(),
            memory_mb: DEFAULT_MEMORY_MB,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            test_event: DEFAULT_TEST_EVENT.to_string(),
        }
    }
}

impl FunctionDraft {
    /// Builds the deploy payload, or says which precondition is unmet.
    pub fn deploy_request(&self) -> Result<DeployRequest, ConsoleError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| ConsoleError::Validation("runtime required".to_string()))?;
        if self.name.trim().is_empty() {
            return Err(ConsoleError::Validation("function name required".to_string()));
        }

        Ok(DeployRequest {
            func_id: self.name.clone(),
            runtime: runtime.value.clone(),
            entrypoint: self.entrypoint.clone(),
            code: self.source_code.clone(),
        })
    }

    pub fn editor_language(&self) -> EditorLanguage {
        self.runtime
            .as_ref()
            .map(|runtime| language_of(&runtime.value))
            .unwrap_or(EditorLanguage::Python)
    }
}

#[derive(Debug, Default)]
pub struct DraftStore {
    draft: RwLock<FunctionDraft>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: FunctionDraft) -> Self {
        Self {
            draft: RwLock::new(draft),
        }
    }

    pub fn snapshot(&self) -> FunctionDraft {
        self.draft.read().clone()
    }

    pub fn name(&self) -> String {
        self.draft.read().name.clone()
    }

    pub fn runtime(&self) -> Option<RuntimeDescriptor> {
        self.draft.read().runtime.clone()
    }

    pub fn test_event(&self) -> String {
        self.draft.read().test_event.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.draft.write().name = name.into();
    }

    pub fn set_entrypoint(&self, entrypoint: impl Into<String>) {
        self.draft.write().entrypoint = entrypoint.into();
    }

    pub fn set_source_code(&self, source_code: impl Into<String>) {
        self.draft.write().source_code = source_code.into();
    }

    pub fn set_test_event(&self, test_event: impl Into<String>) {
        self.draft.write().test_event = test_event.into();
    }

    /// Returns the value actually stored after clamping.
    pub fn set_memory_mb(&self, memory_mb: u32) -> u32 {
        let memory_mb = clamp_memory_mb(memory_mb);
        self.draft.write().memory_mb = memory_mb;
        memory_mb
    }

    /// Returns the value actually stored after clamping.
    pub fn set_timeout_sec(&self, timeout_sec: u32) -> u32 {
        let timeout_sec = clamp_timeout_sec(timeout_sec);
        self.draft.write().timeout_sec = timeout_sec;
        timeout_sec
    }

    /// Selects a runtime offered by `catalog`.
    pub fn select_runtime(&self, catalog: &RuntimeCatalog, value: &str) -> Result<RuntimeDescriptor, ConsoleError> {
        let runtime = catalog
            .find(value)
            .cloned()
            .ok_or_else(|| ConsoleError::Validation(format!("unknown runtime '{}'", value)))?;
        self.draft.write().runtime = Some(runtime.clone());
        Ok(runtime)
    }

    /// Fills in the runtime only if none is chosen yet. Returns the runtime
    /// the draft ends up with.
    pub fn default_runtime(&self, runtime: &RuntimeDescriptor) -> RuntimeDescriptor {
        let mut draft = self.draft.write();
        draft.runtime.get_or_insert_with(|| runtime.clone()).clone()
    }
}
