pub mod catalog;
pub mod client;
pub mod config;
pub mod console;
pub mod draft;
pub mod error_message;
pub mod events;
pub mod guard;
pub mod transport;

pub use catalog::{CatalogLoader, CatalogState, RuntimeCatalog};
pub use client::FunctionsClient;
pub use config::ConsoleConfig;
pub use console::{parse_event, DeployOutcome, FunctionConsole};
pub use draft::{DraftStore, FunctionDraft};
pub use error_message::ErrorMessage;
pub use events::{ChannelSink, ConsoleEvent, EventSink, TracingSink};
pub use guard::{InFlight, InFlightGuard, OperationKey};
pub use transport::{ApiRequest, BackendResponse, HttpTransport, Method, Transport};

#[cfg(test)]
mod testing;
