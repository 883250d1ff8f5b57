use barq_shared::{ConsoleError, Operation, OperationId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// What a single-flight slot protects: the one draft being deployed, or a
/// function being invoked by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKey {
    Deploy,
    Invoke(String),
}

impl OperationKey {
    pub fn operation(&self) -> Operation {
        match self {
            OperationKey::Deploy => Operation::Deploy,
            OperationKey::Invoke(_) => Operation::Invoke,
        }
    }
}

/// Registry of operations currently waiting on the backend.
#[derive(Clone, Default)]
pub struct InFlight {
    active: Arc<DashMap<OperationKey, OperationId>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key` for `id`, failing if another run holds it. The slot is
    /// released when the returned guard is dropped.
    pub fn try_acquire(&self, key: OperationKey, id: OperationId) -> Result<InFlightGuard, ConsoleError> {
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => Err(ConsoleError::OperationInProgress(key.operation())),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(InFlightGuard {
                    key,
                    id,
                    active: self.active.clone(),
                })
            }
        }
    }

    pub fn is_active(&self, key: &OperationKey) -> bool {
        self.active.contains_key(key)
    }

    /// The `loading` flag of an operation: true while any run of it is in flight.
    pub fn is_loading(&self, operation: Operation) -> bool {
        self.active.iter().any(|entry| entry.key().operation() == operation)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

pub struct InFlightGuard {
    key: OperationKey,
    id: OperationId,
    active: Arc<DashMap<OperationKey, OperationId>>,
}

impl InFlightGuard {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.active.remove_if(&self.key, |_, holder| *holder == id);
    }
}
