//! Service registry mapping each chat-completion provider to its endpoint,
//! per-modality model names, and display metadata

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{AppError, Result};

/// Fallback endpoint for services whose descriptor carries no `apiBase`
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/chat/completions";

/// Content kind of a call, determining which model is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Image => write!(f, "image"),
            Modality::Audio => write!(f, "audio"),
        }
    }
}

/// Static description of one backend service. Loaded once at startup and
/// shared read-only across all in-flight requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDescriptor {
    /// Full chat-completions endpoint URL; `None` means [`DEFAULT_API_BASE`]
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub text_model: Option<String>,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default)]
    pub audio_model: Option<String>,
    pub display_name: String,
    pub logo: String,
}

impl BackendDescriptor {
    /// Endpoint URL for outbound calls
    pub fn endpoint(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Model registered for the given modality. An empty string counts as
    /// unset so a half-filled registry file cannot select a blank model.
    pub fn model_for(&self, modality: Modality) -> Option<&str> {
        let model = match modality {
            Modality::Text => self.text_model.as_deref(),
            Modality::Image => self.vision_model.as_deref(),
            Modality::Audio => self.audio_model.as_deref(),
        };
        model.filter(|m| !m.is_empty())
    }
}

/// Registry of all configured backend services
pub struct ServiceRegistry {
    services: HashMap<String, BackendDescriptor>,
}

impl ServiceRegistry {
    /// Build a registry from descriptors already in hand
    pub fn new(services: HashMap<String, BackendDescriptor>) -> Self {
        Self { services }
    }

    /// Parse a registry from its JSON file contents
    pub fn from_json(content: &str) -> Result<Self> {
        let services: HashMap<String, BackendDescriptor> =
            serde_json::from_str(content).map_err(|e| {
                AppError::Config(config::ConfigError::Message(format!(
                    "Failed to parse services config: {}",
                    e
                )))
            })?;
        Ok(Self::new(services))
    }

    /// Load the registry from a JSON file on disk
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to read services config {}: {}",
                path.as_ref().display(),
                e
            )))
        })?;

        let registry = Self::from_json(&content)?;
        for (name, descriptor) in &registry.services {
            info!(service = %name, endpoint = %descriptor.endpoint(), "Registered service");
        }
        Ok(registry)
    }

    /// Look up a service descriptor by identifier
    pub fn get(&self, service: &str) -> Option<&BackendDescriptor> {
        self.services.get(service)
    }

    /// Model registered for a (service, modality) pair
    pub fn model_for(&self, service: &str, modality: Modality) -> Option<&str> {
        self.get(service).and_then(|d| d.model_for(modality))
    }

    /// Registered service identifiers, sorted for stable listings
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
