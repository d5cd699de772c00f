//! API request and response models

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::backend::{Attachment, Modality};

/// Inference request form fields. Submitted identically for buffered and
/// streaming calls; the `streaming` flag alone selects the delivery mode.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    /// Target service identifier
    #[serde(default)]
    pub service: String,

    /// The user prompt
    #[serde(default)]
    pub prompt: String,

    /// Base64-encoded attachment payload
    #[serde(default)]
    pub file_base64: Option<String>,

    /// Attachment file extension, e.g. "png" or "mp3"
    #[serde(default)]
    pub file_extension: Option<String>,

    /// Attachment kind: "image" or "audio"
    #[serde(default)]
    pub file_type: Option<String>,

    /// "true" enables streaming delivery; any other value is buffered
    #[serde(default)]
    pub streaming: Option<String>,
}

impl InferRequest {
    pub fn is_streaming(&self) -> bool {
        self.streaming.as_deref() == Some("true")
    }

    /// Construct the attachment, if any. Present only when `fileBase64` is
    /// non-empty and the kind is recognized; anything else is a text-only
    /// call.
    pub fn attachment(&self) -> Option<Attachment> {
        let base64 = self.file_base64.as_deref().filter(|s| !s.is_empty())?;

        let kind = match self.file_type.as_deref() {
            Some("image") => Modality::Image,
            Some("audio") => Modality::Audio,
            other => {
                warn!(file_type = ?other, "Unrecognized attachment type, treating call as text-only");
                return None;
            }
        };

        Some(Attachment {
            kind,
            extension: self.file_extension.clone().unwrap_or_default(),
            base64: base64.to_string(),
        })
    }
}

/// One registered service, with its display metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub name: String,
    pub display_name: String,
    pub logo: String,
}

/// Service listing response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServicesResponse {
    pub services: Vec<ServiceEntry>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: usize,
}
