//! End-to-end tests for streaming dispatch and emulation

mod harness;

use futures_util::StreamExt;
use harness::mock_provider::MockProvider;
use prism_config::Config;
use prism_core::{CallOverrides, RequestContext};
use prism_llm::GatewayState;
use prism_llm::types::{ResponseStreamEvent, ResponsesRequest};

fn request(model: &str) -> ResponsesRequest {
    serde_json::from_value(serde_json::json!({
        "model": model,
        "input": "hello",
        "stream": true
    }))
    .unwrap()
}

fn state_for(provider_type: &str, mock_base: &str) -> GatewayState {
    let raw = format!(
        r#"
        [providers.mock]
        type = "{provider_type}"
        api_key = "sk-test"
        base_url = "{mock_base}"
        "#
    );
    let config: Config = toml::from_str(&raw).unwrap();
    GatewayState::from_config(&config)
}

async fn collect_events(state: &GatewayState, request: ResponsesRequest) -> Vec<ResponseStreamEvent> {
    let stream = state
        .complete_stream(request, &RequestContext::empty(), &CallOverrides::default())
        .await
        .unwrap();

    stream.map(Result::unwrap).collect().await
}

#[tokio::test]
async fn native_stream_yields_ordered_canonical_events() {
    let mock = MockProvider::start().await.unwrap();
    let state = state_for("openai", &mock.base_url());

    let events = collect_events(&state, request("gpt-4o")).await;
    let types: Vec<_> = events.iter().map(ResponseStreamEvent::event_type).collect();

    assert_eq!(
        types,
        [
            "response.created",
            "response.output_text.delta",
            "response.output_text.delta",
            "response.completed"
        ]
    );

    let body = mock.last_body().unwrap();
    assert_eq!(body["stream"], true);
}

#[tokio::test]
async fn chunk_with_missing_positions_is_coalesced_not_dropped() {
    let mock = MockProvider::start().await.unwrap();
    let state = state_for("openai", &mock.base_url());

    let events = collect_events(&state, request("gpt-4o")).await;

    // The mock's first delta omits output_index/content_index entirely
    let ResponseStreamEvent::OutputTextDelta {
        output_index,
        content_index,
        delta,
        ..
    } = &events[1]
    else {
        panic!("expected a delta event, got {:?}", events[1]);
    };

    assert_eq!(*output_index, 0);
    assert_eq!(*content_index, 0);
    assert_eq!(delta, "mock ");
}

#[tokio::test]
async fn terminal_event_carries_usage_and_normalized_timestamp() {
    let mock = MockProvider::start().await.unwrap();
    let state = state_for("openai", &mock.base_url());

    let events = collect_events(&state, request("gpt-4o")).await;

    let ResponseStreamEvent::Completed { response } = events.last().unwrap() else {
        panic!("expected completed, got {:?}", events.last());
    };

    assert_eq!(response.created_at, 1_741_476_542);
    assert_eq!(response.usage.as_ref().unwrap().total_tokens, 7);
}

#[tokio::test]
async fn deep_research_stream_is_emulated_from_blocking_call() {
    let mock = MockProvider::start().await.unwrap();
    let state = state_for("perplexity", &mock.bare_url());

    let events = collect_events(&state, request("perplexity/sonar-deep-research")).await;
    let types: Vec<_> = events.iter().map(ResponseStreamEvent::event_type).collect();

    assert_eq!(
        types,
        [
            "response.created",
            "response.in_progress",
            "response.output_text.delta",
            "response.completed"
        ]
    );

    // The provider saw a blocking call, not a streaming one
    let body = mock.last_body().unwrap();
    assert_ne!(body.get("stream"), Some(&serde_json::Value::Bool(true)));

    // Intermediate events carry no usage; the terminal one does
    let ResponseStreamEvent::Created { response } = &events[0] else {
        panic!("expected created, got {:?}", events[0]);
    };
    assert!(response.usage.is_none());

    let ResponseStreamEvent::Completed { response } = events.last().unwrap() else {
        panic!("expected completed, got {:?}", events.last());
    };
    assert!(response.usage.is_some());
}

#[tokio::test]
async fn upstream_error_surfaces_before_the_stream_starts() {
    let mock = MockProvider::start_with_status(429).await.unwrap();
    let state = state_for("openai", &mock.base_url());

    let err = match state
        .complete_stream(request("gpt-4o"), &RequestContext::empty(), &CallOverrides::default())
        .await
    {
        Ok(_) => panic!("expected an error before the stream starts"),
        Err(e) => e,
    };

    assert!(matches!(err, prism_llm::LlmError::RateLimited { .. }));
}
