//! Outbound call dispatch and the normalized result envelope

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::backend::payload::OutboundRequest;
use crate::backend::registry::BackendDescriptor;
use crate::backend::stream::StreamBridge;
use crate::error::{AppError, Result};

/// Normalized output envelope, identical for every backend. One instance
/// per buffered call, success or error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResult {
    /// Completion text, or the backend's error message
    pub result: String,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model: String,
    /// Elapsed seconds from just before the outbound call to the full reply
    pub time_taken: f64,
    pub service: String,
    pub display_name: String,
    pub logo: String,
}

/// Backend reply, parsed leniently: providers report failures either as a
/// non-2xx status or as an `error` object inside a 200 body, and some omit
/// `usage` entirely.
#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    error: Option<ReplyError>,
    #[serde(default)]
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyUsage {
    #[serde(default)]
    total_tokens: u64,
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Owns the outbound call lifecycle. Holds no per-call state, so one
/// instance serves all concurrent requests.
pub struct Dispatcher {
    client: Client,
}

impl Dispatcher {
    /// Create a dispatcher with a shared HTTP client.
    ///
    /// No request timeout is set: timeout behavior is left to the transport
    /// defaults, so a hanging backend is only bounded by connection-level
    /// limits.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Issue the call, await the complete reply, and fold every outcome into
    /// one [`InferenceResult`]. Transport faults never escape this method.
    pub async fn dispatch_buffered(
        &self,
        request: &OutboundRequest,
        descriptor: &BackendDescriptor,
    ) -> InferenceResult {
        debug!(
            service = %request.service,
            endpoint = %request.endpoint,
            model = %request.model(),
            "Sending chat completion request"
        );

        let started = Instant::now();
        match self.send(request).await {
            Ok(reply) => {
                let elapsed = started.elapsed();
                info!(
                    service = %request.service,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Backend reply received"
                );
                normalize_reply(reply, request, descriptor, elapsed)
            }
            Err(e) => {
                let elapsed = started.elapsed();
                warn!(service = %request.service, error = %e, "Chat completion call failed");
                transport_error(request, descriptor, elapsed, &e.to_string())
            }
        }
    }

    /// Open a streaming call, handing the connection to a [`StreamBridge`]
    pub fn dispatch_stream(&self, request: OutboundRequest) -> StreamBridge {
        StreamBridge::open(request)
    }

    async fn send(&self, request: &OutboundRequest) -> std::result::Result<ChatReply, reqwest::Error> {
        let response = self
            .client
            .post(&request.endpoint)
            .headers(request.headers.clone())
            .json(&request.body)
            .send()
            .await?;

        // Parse the body regardless of status: an error JSON on a 4xx/5xx is
        // a backend-reported outcome, not a transport fault.
        response.json::<ChatReply>().await
    }
}

fn normalize_reply(
    reply: ChatReply,
    request: &OutboundRequest,
    descriptor: &BackendDescriptor,
    elapsed: Duration,
) -> InferenceResult {
    if let Some(error) = reply.error {
        return envelope(request, descriptor, elapsed, error.message, ReplyUsage::default());
    }

    match reply.choices.into_iter().next() {
        Some(choice) => {
            let usage = reply.usage.unwrap_or_default();
            envelope(request, descriptor, elapsed, choice.message.content, usage)
        }
        None => transport_error(
            request,
            descriptor,
            elapsed,
            "reply carried neither choices nor an error object",
        ),
    }
}

fn transport_error(
    request: &OutboundRequest,
    descriptor: &BackendDescriptor,
    elapsed: Duration,
    detail: &str,
) -> InferenceResult {
    envelope(
        request,
        descriptor,
        elapsed,
        format!("[Error from {}] {}", request.service, detail),
        ReplyUsage::default(),
    )
}

fn envelope(
    request: &OutboundRequest,
    descriptor: &BackendDescriptor,
    elapsed: Duration,
    result: String,
    usage: ReplyUsage,
) -> InferenceResult {
    InferenceResult {
        result,
        total_tokens: usage.total_tokens,
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        model: request.model().to_string(),
        time_taken: elapsed.as_secs_f64(),
        service: request.service.clone(),
        display_name: descriptor.display_name.clone(),
        logo: descriptor.logo.clone(),
    }
}
