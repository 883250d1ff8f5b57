use barq_shared::{ConsoleError, InvocationResult, Operation, OperationId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// State transitions published to whatever renders the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Loading {
        id: OperationId,
        operation: Operation,
    },
    Idle {
        id: OperationId,
        operation: Operation,
    },
    CatalogReady {
        runtimes: usize,
        selected: Option<String>,
    },
    /// The catalog could not be fetched; the form stays usable.
    CatalogWarning {
        message: String,
    },
    Deployed {
        id: OperationId,
        func_id: String,
    },
    Invoked {
        id: OperationId,
        func_id: String,
        result: InvocationResult,
    },
    Failed {
        id: OperationId,
        operation: Operation,
        error: ConsoleError,
    },
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: ConsoleEvent);
}

/// Forwards events over an unbounded channel.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ConsoleEvent>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConsoleEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: ConsoleEvent) {
        // A dropped receiver just means nobody is rendering anymore.
        if self.sender.send(event).is_err() {
            debug!("Console event receiver closed");
        }
    }
}

/// Logs events instead of rendering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Loading { id, operation } => debug!("{} {} started", operation, id),
            ConsoleEvent::Idle { id, operation } => debug!("{} {} finished", operation, id),
            ConsoleEvent::CatalogReady { runtimes, selected } => {
                info!("Runtime catalog ready: {} runtimes, selected {:?}", runtimes, selected)
            }
            ConsoleEvent::CatalogWarning { message } => warn!("Runtime catalog unavailable: {}", message),
            ConsoleEvent::Deployed { func_id, .. } => info!("Function {} deployed", func_id),
            ConsoleEvent::Invoked { func_id, result, .. } => {
                info!(
                    "Function {} invoked ({} bytes of output, {})",
                    func_id,
                    result.output.len(),
                    result
                        .performance
                        .as_ref()
                        .map(|p| p.execution_type.to_string())
                        .unwrap_or_else(|| "no metrics".to_string())
                )
            }
            ConsoleEvent::Failed { operation, error, .. } => warn!("{} failed: {}", operation, error),
        }
    }
}
