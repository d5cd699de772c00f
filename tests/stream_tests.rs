//! Stream bridge integration tests against a mock backend

use infer_gateway::backend::{
    build_request, BackendDescriptor, Dispatcher, OutboundRequest, ServiceRegistry, StreamEvent,
    STREAM_COMPLETED,
};
use std::collections::HashMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn streaming_request(service: &str, endpoint: &str) -> OutboundRequest {
    std::env::set_var(format!("{}_API_KEY", service.to_uppercase()), "sk-test");
    let mut services = HashMap::new();
    services.insert(
        service.to_string(),
        BackendDescriptor {
            api_base: Some(endpoint.to_string()),
            text_model: Some("stream-model".to_string()),
            vision_model: None,
            audio_model: None,
            display_name: "Stream Service".to_string(),
            logo: "stream.png".to_string(),
        },
    );
    let registry = ServiceRegistry::new(services);
    build_request(&registry, service, "stream me", None, true).unwrap()
}

/// Consume the bridge off the async runtime, the way the route layer does
async fn collect_events(request: OutboundRequest) -> Vec<StreamEvent> {
    let bridge = Dispatcher::new().unwrap().dispatch_stream(request);
    tokio::task::spawn_blocking(move || bridge.collect()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chunks_pass_through_in_order_then_one_terminator() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n\
                data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n\n\
                data: {\"choices\":[{\"delta\":{\"content\":\"C\"}}]}\n\n\
                data: [DONE]\n\n";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.uri());
    let events = collect_events(streaming_request("stream_order", &endpoint)).await;

    assert!(events.len() >= 2, "expected at least one chunk plus the terminator");

    // Every event except the last is a raw chunk; concatenated they equal
    // the backend body byte-for-byte.
    let mut forwarded = Vec::new();
    for event in &events[..events.len() - 1] {
        match event {
            StreamEvent::Chunk(bytes) => forwarded.extend_from_slice(bytes),
            StreamEvent::Done(_) => panic!("terminator arrived before the stream was exhausted"),
        }
    }
    assert_eq!(forwarded, body.as_bytes());

    match events.last().unwrap() {
        StreamEvent::Done(terminator) => {
            assert_eq!(terminator.status, STREAM_COMPLETED);
            assert_eq!(terminator.model, "stream-model");
            assert!(terminator.time_taken >= 0.0);
        }
        StreamEvent::Chunk(_) => panic!("stream did not end with a terminator"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_stream_still_yields_exactly_one_terminator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.uri());
    let events = collect_events(streaming_request("stream_empty", &endpoint)).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], StreamEvent::Done(t) if t.status == STREAM_COMPLETED));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transport_failure_still_terminates_cleanly() {
    // Nothing listens on port 1; the caller must still get an end marker.
    let events =
        collect_events(streaming_request("stream_refused", "http://127.0.0.1:1/v1/chat/completions"))
            .await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Done(terminator) => {
            assert_eq!(terminator.status, STREAM_COMPLETED);
            assert_eq!(terminator.model, "stream-model");
        }
        StreamEvent::Chunk(_) => panic!("expected only the terminator"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoning_the_bridge_does_not_hang() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: chunk\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let endpoint = format!("{}/v1/chat/completions", server.uri());
    let request = streaming_request("stream_abandon", &endpoint);

    tokio::task::spawn_blocking(move || {
        let mut bridge = Dispatcher::new().unwrap().dispatch_stream(request);
        let first = bridge.next();
        assert!(first.is_some());
        // Dropping the bridge here disconnects the worker mid-stream.
    })
    .await
    .unwrap();
}

#[test]
fn terminator_serializes_camel_case_with_status() {
    let terminator = infer_gateway::backend::StreamTerminator {
        status: STREAM_COMPLETED.to_string(),
        model: "stream-model".to_string(),
        time_taken: 1.25,
    };
    let value = serde_json::to_value(&terminator).unwrap();
    assert_eq!(value["status"], "completed");
    assert_eq!(value["model"], "stream-model");
    assert_eq!(value["timeTaken"], 1.25);
}
