//! Summary delivery through the Resend API, against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use time::OffsetDateTime;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callbridge::core::notify::{Notifier, NotifyError, ResendNotifier};
use callbridge::core::summary::{CallSummary, KeywordSummarizer, Language};
use callbridge::{Speaker, SummaryHandoff, TranscriptEntry};

fn notifier(server: &MockServer) -> ResendNotifier {
    ResendNotifier::new(
        "re_test_key",
        "Rolling Feast <noreply@rollingfeast.com>",
        "orders@rollingfeast.com",
        "Rolling Feast",
    )
    .with_api_url(format!("{}/emails", server.uri()))
}

fn summary(language: Language) -> CallSummary {
    CallSummary {
        summary: "Customer contacted for table booking.".to_string(),
        language,
        turns: 4,
        generated_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn test_resend_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .and(body_partial_json(json!({
            "from": "Rolling Feast <noreply@rollingfeast.com>",
            "to": ["orders@rollingfeast.com"],
            "subject": "Rolling Feast - Call Summary"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "email_1"})))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .notify(&summary(Language::English))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(
        body["html"]
            .as_str()
            .unwrap()
            .contains("Customer contacted for table booking.")
    );
}

#[tokio::test]
async fn test_hindi_summary_uses_hindi_subject() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"subject": "Rolling Feast - कॉल सारांश"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .notify(&summary(Language::Hindi))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_delivery_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"Invalid `to` field"}"#),
        )
        .mount(&server)
        .await;

    match notifier(&server).notify(&summary(Language::English)).await {
        Err(NotifyError::Rejected { status, body }) => {
            assert_eq!(status, 422);
            assert!(body.contains("Invalid"));
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handoff_completes_when_delivery_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"message":"Invalid `to` field"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let handoff = SummaryHandoff::new(
        Arc::new(KeywordSummarizer::new("Rolling Feast")),
        Arc::new(notifier(&server)),
    );
    let transcript = vec![
        TranscriptEntry::now(Speaker::Assistant, "Hello! Welcome to Rolling Feast."),
        TranscriptEntry::now(Speaker::Caller, "Can I book a table for four tonight?"),
    ];

    tokio::time::timeout(
        Duration::from_secs(5),
        handoff.dispatch("call-rejected".to_string(), transcript),
    )
    .await
    .unwrap()
    .unwrap();

    // The summary was produced and offered before the rejection
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(!body["html"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_provider_is_delivery_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let notifier = ResendNotifier::new("re_test_key", "a@b.c", "orders@b.c", "Rolling Feast")
        .with_api_url(format!("http://127.0.0.1:{port}/emails"));

    match notifier.notify(&summary(Language::English)).await {
        Err(NotifyError::DeliveryFailed(_)) => {}
        other => panic!("Expected DeliveryFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handoff_summarizes_and_emails_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({"subject": "Rolling Feast - Call Summary"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let handoff = SummaryHandoff::new(
        Arc::new(KeywordSummarizer::new("Rolling Feast")),
        Arc::new(notifier(&server)),
    );
    let transcript = vec![
        TranscriptEntry::now(Speaker::Assistant, "Hello! Welcome to Rolling Feast."),
        TranscriptEntry::now(Speaker::Caller, "I would like to order two biryanis please"),
        TranscriptEntry::now(Speaker::Assistant, "Two biryanis, anything else?"),
    ];

    tokio::time::timeout(
        Duration::from_secs(5),
        handoff.dispatch("call-1".to_string(), transcript),
    )
    .await
    .unwrap()
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(
        body["html"]
            .as_str()
            .unwrap()
            .contains("Customer inquired about placing an order at Rolling Feast.")
    );
}

#[tokio::test]
async fn test_handoff_swallows_delivery_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let handoff = SummaryHandoff::new(
        Arc::new(KeywordSummarizer::new("Rolling Feast")),
        Arc::new(notifier(&server)),
    );
    let transcript = vec![
        TranscriptEntry::now(Speaker::Assistant, "Namaste!"),
        TranscriptEntry::now(Speaker::Caller, "मुझे टेबल बुक करनी है"),
    ];

    // The task completes normally even though delivery failed
    assert!(
        handoff
            .dispatch("call-2".to_string(), transcript)
            .await
            .is_ok()
    );
}
