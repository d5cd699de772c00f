//! Outbound request construction: model selection by modality, message
//! content assembly, and authentication headers

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::backend::credentials;
use crate::backend::registry::{Modality, ServiceRegistry};
use crate::error::{AppError, Result};

/// A file the caller attached to the prompt, already base64-encoded
#[derive(Debug, Clone)]
pub struct Attachment {
    /// `Image` or `Audio`; a text "attachment" does not exist
    pub kind: Modality,
    pub extension: String,
    pub base64: String,
}

impl Attachment {
    /// Render the attachment as a `data:` URI embeddable in a content part
    pub fn data_uri(&self) -> String {
        format!("data:{}/{};base64,{}", self.kind, self.extension, self.base64)
    }
}

/// Reference to an embedded media payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
}

/// One element of a multi-part message content list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: MediaRef },
    AudioUrl { audio_url: MediaRef },
}

/// Message content: a plain string for text-only calls, or an ordered
/// text + media pair when a file is attached
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Chat message in the outbound body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// JSON body of the outbound chat-completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

/// Fully assembled outbound request, immutable once built. Passing this by
/// value into the dispatcher keeps the dispatcher free of per-call state.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub service: String,
    pub endpoint: String,
    pub headers: HeaderMap,
    pub body: ChatRequestBody,
}

impl OutboundRequest {
    pub fn model(&self) -> &str {
        &self.body.model
    }

    pub fn is_streaming(&self) -> bool {
        self.body.stream
    }
}

/// Build the outbound request for one inference call.
///
/// Validation happens here, before any network activity: the service must be
/// registered, a model must exist for the attachment's modality, and the
/// prompt must be non-empty. The credential is resolved as part of header
/// construction, so a missing key also fails before the wire.
pub fn build_request(
    registry: &ServiceRegistry,
    service: &str,
    prompt: &str,
    attachment: Option<&Attachment>,
    streaming: bool,
) -> Result<OutboundRequest> {
    let descriptor = registry
        .get(service)
        .ok_or_else(|| AppError::ServiceNotFound(service.to_string()))?;

    let modality = attachment.map(|a| a.kind).unwrap_or(Modality::Text);
    let model = descriptor
        .model_for(modality)
        .ok_or_else(|| AppError::UnsupportedModel {
            service: service.to_string(),
            modality: modality.to_string(),
        })?
        .to_string();

    if prompt.trim().is_empty() {
        return Err(AppError::InvalidPrompt);
    }

    let content = match attachment {
        None => MessageContent::Text(prompt.to_string()),
        Some(attachment) => {
            let media = MediaRef {
                url: attachment.data_uri(),
            };
            let media_part = match attachment.kind {
                Modality::Audio => ContentPart::AudioUrl { audio_url: media },
                _ => ContentPart::ImageUrl { image_url: media },
            };
            MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                media_part,
            ])
        }
    };

    let api_key = credentials::resolve(service)?;
    let headers = auth_headers(&api_key)?;

    Ok(OutboundRequest {
        service: service.to_string(),
        endpoint: descriptor.endpoint().to_string(),
        headers,
        body: ChatRequestBody {
            model,
            stream: streaming,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
        },
    })
}

/// Bearer authorization plus JSON content type
fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|e| AppError::Internal(format!("API key is not a valid header value: {}", e)))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);

    Ok(headers)
}
