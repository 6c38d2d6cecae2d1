//! Full call over real sockets: a Twilio-like client on `/media-stream`,
//! the production OpenAI connector pointed at a mock Realtime server, and a
//! recording handoff at the end.

mod fixtures;
mod mock_providers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use callbridge::core::realtime::{OpenAIRealtime, RealtimeConfig};
use callbridge::routes::create_app;
use callbridge::{AppState, ServerConfig, Speaker, SummaryHandoff};
use fixtures::{
    RecordingNotifier, RecordingSummarizer, STREAM_SID, media_frame, start_frame, test_settings,
};
use mock_providers::{MockRealtimeServer, ScriptEnd};

const WAIT: Duration = Duration::from_secs(5);

struct Bridge {
    addr: SocketAddr,
    state: Arc<AppState>,
    summarizer: Arc<RecordingSummarizer>,
    notifier: Arc<RecordingNotifier>,
}

async fn start_bridge(ai: &MockRealtimeServer) -> Bridge {
    let connector = OpenAIRealtime::new(RealtimeConfig {
        api_key: "sk-test".to_string(),
        url: ai.url.clone(),
        ..Default::default()
    })
    .unwrap();
    let summarizer = Arc::new(RecordingSummarizer::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let mut config = ServerConfig::default();
    config.openai_api_key = Some("sk-test".to_string());
    let mut settings = test_settings();
    settings.greeting_fallback_delay = Duration::from_millis(100);
    let state = AppState::with_parts(
        config,
        Arc::new(connector),
        settings,
        Some(SummaryHandoff::new(summarizer.clone(), notifier.clone())),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Bridge {
        addr,
        state,
        summarizer,
        notifier,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_call_relays_audio_both_ways_and_hands_off_summary() {
    // Plays once the greeting has been requested
    let script = vec![
        json!({"type": "conversation.item.input_audio_transcription.completed", "item_id": "it0", "content_index": 0, "transcript": "I want to order a paneer tikka"}),
        json!({"type": "response.audio.delta", "response_id": "r1", "item_id": "it1", "output_index": 0, "content_index": 0, "delta": "AAEC"}),
        json!({"type": "response.audio_transcript.done", "response_id": "r1", "item_id": "it1", "output_index": 0, "content_index": 0, "transcript": "One paneer tikka, anything else?"}),
        json!({"type": "response.done", "response": {"id": "r1", "status": "completed"}}),
    ];
    let mut ai = MockRealtimeServer::start_on("response.create", script, ScriptEnd::StayOpen).await;
    let bridge = start_bridge(&ai).await;

    let (mut phone, _) = connect_async(format!("ws://{}/media-stream", bridge.addr))
        .await
        .unwrap();
    wait_until(|| bridge.state.active_calls() == 1).await;

    phone
        .send(Message::Text(start_frame(STREAM_SID).into()))
        .await
        .unwrap();

    // Caller audio is only forwarded once the AI side is up, so keep talking
    // until the assistant answers
    let mut timestamp = 0;
    let first_reply = loop {
        timestamp += 20;
        phone
            .send(Message::Text(media_frame(timestamp, "f38A").into()))
            .await
            .unwrap();
        if let Ok(Some(Ok(Message::Text(text)))) =
            timeout(Duration::from_millis(20), phone.next()).await
        {
            break serde_json::from_str::<Value>(text.as_str()).unwrap();
        }
        assert!(timestamp < 5_000, "assistant never answered");
    };

    assert_eq!(
        first_reply,
        json!({"event": "media", "streamSid": STREAM_SID, "media": {"payload": "AAEC"}})
    );
    let mark = match timeout(WAIT, phone.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<Value>(text.as_str()).unwrap(),
        other => panic!("Expected mark frame, got {other:?}"),
    };
    assert_eq!(mark["event"], "mark");
    assert_eq!(mark["streamSid"], STREAM_SID);
    assert_eq!(mark["mark"]["name"], "responsePart-1");

    // The AI side saw the configuration first; caller audio may interleave
    // with the greeting request
    let mut received = Vec::new();
    while let Ok(frame) = ai.received.try_recv() {
        received.push(frame);
    }
    assert_eq!(received[0]["type"], "session.update");
    assert_eq!(received[0]["session"]["input_audio_format"], "g711_ulaw");
    let types: Vec<&str> = received
        .iter()
        .map(|f| f["type"].as_str().unwrap())
        .filter(|t| *t != "input_audio_buffer.append")
        .collect();
    assert_eq!(
        types,
        vec!["session.update", "conversation.item.create", "response.create"]
    );
    assert!(
        received
            .iter()
            .filter(|f| f["type"] == "input_audio_buffer.append")
            .all(|f| f["audio"] == "f38A")
    );

    // Caller hangs up
    phone.close(None).await.unwrap();

    wait_until(|| bridge.state.active_calls() == 0).await;
    wait_until(|| bridge.notifier.summaries.lock().unwrap().len() == 1).await;

    let calls = bridge.summarizer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let roles: Vec<Speaker> = calls[0].iter().map(|e| e.role).collect();
    assert_eq!(
        roles,
        vec![Speaker::Assistant, Speaker::Caller, Speaker::Assistant]
    );
    assert_eq!(calls[0][0].text, "Hello! Welcome to Rolling Feast.");
    assert_eq!(calls[0][1].text, "I want to order a paneer tikka");
    assert_eq!(calls[0][2].text, "One paneer tikka, anything else?");
}

#[tokio::test]
async fn test_ai_rejection_ends_the_call() {
    let ai = MockRealtimeServer::rejecting(http::StatusCode::UNAUTHORIZED).await;
    let bridge = start_bridge(&ai).await;

    let (mut phone, _) = connect_async(format!("ws://{}/media-stream", bridge.addr))
        .await
        .unwrap();
    phone
        .send(Message::Text(start_frame(STREAM_SID).into()))
        .await
        .unwrap();

    // The bridge closes the caller's socket once the AI session fails
    let closed = timeout(WAIT, async {
        loop {
            match phone.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    wait_until(|| bridge.state.active_calls() == 0).await;
    // No conversation took place, so nothing is summarized
    sleep(Duration::from_millis(50)).await;
    assert_eq!(bridge.summarizer.call_count(), 0);
}
