//! Stream bridge: drains a backend's chunked reply on a dedicated worker
//! and re-exposes it to synchronous callers as a pull-based sequence

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{Receiver, SyncSender};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::backend::payload::OutboundRequest;

/// `status` value of the synthesized terminal event
pub const STREAM_COMPLETED: &str = "completed";

/// Synthesized final event marking end-of-stream. Not part of the backend's
/// own stream; its envelope shape (a JSON object with a `status` field) is
/// what distinguishes it from raw passthrough chunks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamTerminator {
    pub status: String,
    pub model: String,
    /// Elapsed seconds up to the last chunk plus terminator construction
    pub time_taken: f64,
}

/// One event pulled from the bridge
#[derive(Debug)]
pub enum StreamEvent {
    /// Bytes exactly as the backend delivered them, order preserved
    Chunk(Vec<u8>),
    /// Emitted exactly once, after the backend stream is exhausted,
    /// even when zero chunks arrived or the transport failed mid-stream
    Done(StreamTerminator),
}

/// Pull-based view of one streaming call.
///
/// The underlying transport delivers chunks asynchronously; the bridge hides
/// that behind a plain [`Iterator`]. Each stream gets its own worker thread
/// driving a current-thread runtime, so one stream's pulls never block
/// another's. The hand-off channel is a rendezvous: the worker advances only
/// when the caller pulls, which is the sole backpressure mechanism.
///
/// Dropping the bridge before exhaustion disconnects the channel; the worker
/// observes the failed send and releases the backend connection.
pub struct StreamBridge {
    rx: Receiver<StreamEvent>,
}

impl StreamBridge {
    /// Issue the streaming call and return the consumable sequence.
    /// Does not block: the connection is established on the worker.
    pub fn open(request: OutboundRequest) -> Self {
        // Capacity 1 leaves room for the terminator when the worker thread
        // itself cannot be spawned.
        let (tx, rx) = std::sync::mpsc::sync_channel(1);

        let spawned = thread::Builder::new()
            .name(format!("stream-{}", request.service))
            .spawn({
                let tx = tx.clone();
                move || run_stream(request, tx)
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn stream worker");
            let _ = tx.try_send(StreamEvent::Done(StreamTerminator {
                status: STREAM_COMPLETED.to_string(),
                model: String::new(),
                time_taken: 0.0,
            }));
        }

        Self { rx }
    }
}

impl Iterator for StreamBridge {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().ok()
    }
}

/// Worker body: connect, forward chunks, then always offer the terminator.
fn run_stream(request: OutboundRequest, tx: SyncSender<StreamEvent>) {
    let model = request.model().to_string();
    let started = Instant::now();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();

    match runtime {
        Ok(runtime) => runtime.block_on(drain_chunks(&request, &tx)),
        Err(e) => error!(service = %request.service, error = %e, "Failed to build stream runtime"),
    }

    // The send fails only when the consumer is already gone, in which case
    // nobody is owed a terminator.
    let _ = tx.send(StreamEvent::Done(StreamTerminator {
        status: STREAM_COMPLETED.to_string(),
        model,
        time_taken: started.elapsed().as_secs_f64(),
    }));
}

/// Forward every chunk in arrival order. Returning from this function drops
/// the response and with it the backend connection.
async fn drain_chunks(request: &OutboundRequest, tx: &SyncSender<StreamEvent>) {
    // One client per stream: its connection lives exactly as long as the drain.
    let client = match Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            error!(service = %request.service, error = %e, "Failed to create stream client");
            return;
        }
    };

    let response = client
        .post(&request.endpoint)
        .headers(request.headers.clone())
        .json(&request.body)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            warn!(service = %request.service, error = %e, "Streaming call failed to connect");
            return;
        }
    };

    let mut chunks = response.bytes_stream();
    while let Some(next) = chunks.next().await {
        match next {
            Ok(bytes) => {
                if tx.send(StreamEvent::Chunk(bytes.to_vec())).is_err() {
                    debug!(service = %request.service, "Stream consumer went away, releasing connection");
                    return;
                }
            }
            Err(e) => {
                warn!(service = %request.service, error = %e, "Stream interrupted");
                return;
            }
        }
    }
}
