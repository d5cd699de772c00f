//! Backend module - registry, credentials, payload construction, dispatch

pub mod credentials;
pub mod dispatcher;
pub mod payload;
pub mod registry;
pub mod stream;

// Re-export the types that make up the dispatch surface
pub use dispatcher::{Dispatcher, InferenceResult};
pub use payload::{build_request, Attachment, OutboundRequest};
pub use registry::{BackendDescriptor, Modality, ServiceRegistry, DEFAULT_API_BASE};
pub use stream::{StreamBridge, StreamEvent, StreamTerminator, STREAM_COMPLETED};
