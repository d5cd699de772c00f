//! Inference Gateway
//!
//! A Rust gateway that forwards a single user prompt (optionally with an
//! attached image or audio file) to one of several third-party
//! chat-completion backends, normalizing each backend's request and response
//! shapes into one uniform envelope. Supports buffered and streamed
//! delivery.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::{Dispatcher, ServiceRegistry};

/// Application state shared across all handlers. Everything here is
/// immutable after startup, so concurrent requests need no locks.
pub struct AppState {
    pub settings: config::Settings,
    pub registry: Arc<ServiceRegistry>,
    pub dispatcher: Dispatcher,
}
