// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the gateway routes against mock adapters.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use nsxbot_config::model::IndexConfig;
use nsxbot_gateway::handlers::{ChatResponse, ErrorResponse, HealthResponse};
use nsxbot_gateway::{GatewayState, WebhookProcessor, router};
use nsxbot_test_utils::{MockMessenger, MockModeration, Sent, TestHarness, TestHarnessBuilder};
use serde_json::json;
use tower::ServiceExt;

const BOT: &str = "5531999990000";
const USER: &str = "5531988887777";
const WAIT: Duration = Duration::from_secs(5);

struct Gateway {
    app: Router,
    harness: TestHarness,
    messenger: Arc<MockMessenger>,
}

async fn gateway(builder: TestHarnessBuilder) -> Gateway {
    let harness = builder
        .with_config(|c| c.features.faq = false)
        .build()
        .await
        .unwrap();
    let messenger = Arc::new(MockMessenger::new());
    let processor = WebhookProcessor::new(
        harness.handler.clone(),
        messenger.clone(),
        harness.memory.clone(),
        harness.config.clone(),
    );
    let app = router(GatewayState::new(Arc::new(processor)));
    Gateway {
        app,
        harness,
        messenger,
    }
}

fn text_event(body: &str) -> serde_json::Value {
    json!({
        "contacts": [{"profile": {"name": "Ana"}, "wa_id": USER}],
        "messages": [{"from": USER, "id": "wamid.1", "type": "text", "text": {"body": body}}]
    })
}

fn list_reply_event(index: &str) -> serde_json::Value {
    json!({
        "contacts": [],
        "messages": [{
            "from": USER,
            "type": "interactive",
            "interactive": {"type": "list_reply", "list_reply": {"id": index, "title": index}}
        }]
    })
}

fn webhook(event: serde_json::Value, indexes: &str, labels: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("nm-number", BOT)
        .header("indexes", indexes)
        .header("labels", labels)
        .body(Body::from(event.to_string()))
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn single_index_number_answers_directly() {
    let gw = gateway(
        TestHarness::builder().with_completions([" Cumprimento.\nAção 1: Finalizar[Olá! Como posso ajudar?]"]),
    )
    .await;

    let response = gw
        .app
        .clone()
        .oneshot(webhook(text_event("oi"), "FUNDEP_Ciencias", "Ciências"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack: serde_json::Value = json_body(response).await;
    assert_eq!(ack, json!({"message": "OK"}));

    let sent = gw.messenger.wait_for(1, WAIT).await;
    assert_eq!(
        sent,
        [Sent::Text {
            channel: BOT.into(),
            to: USER.into(),
            body: "Olá! Como posso ajudar?".into()
        }]
    );
    assert_eq!(
        gw.harness
            .memory
            .active_index(&gw.harness.user)
            .await
            .unwrap()
            .as_deref(),
        Some("FUNDEP_Ciencias")
    );
}

#[tokio::test]
async fn multi_index_number_sends_menu_first() {
    let gw = gateway(TestHarness::builder()).await;

    gw.app
        .clone()
        .oneshot(webhook(text_event("oi"), "FUNDEP_Ciencias$FUNDEP_Medicina", "Ciências$Medicina"))
        .await
        .unwrap();

    let sent = gw.messenger.wait_for(1, WAIT).await;
    let Sent::Menu { menu, to, .. } = &sent[0] else {
        panic!("expected a menu, got {sent:?}");
    };
    assert_eq!(to, USER);
    let titles: Vec<_> = menu.options.iter().map(|o| o.title.as_str()).collect();
    assert_eq!(titles, ["Ciências", "Medicina"]);
    assert_eq!(menu.body, gw.harness.config.gateway.menu_message);
    assert_eq!(gw.harness.completion.call_count().await, 0);
}

#[tokio::test]
async fn list_reply_selects_index_and_sends_intro_with_disclaimer() {
    let gw = gateway(TestHarness::builder().with_config(|c| {
        c.indexes = vec![IndexConfig {
            id: "FUNDEP_Medicina".into(),
            label: "Medicina".into(),
            domain: "o processo seletivo de Medicina".into(),
            intro_message: Some("Olá! Tire suas dúvidas sobre Medicina.".into()),
            disclaimer: Some("As respostas podem conter erros.".into()),
            api_key: None,
        }];
    }))
    .await;

    gw.app
        .clone()
        .oneshot(webhook(
            list_reply_event("FUNDEP_Medicina"),
            "FUNDEP_Ciencias$FUNDEP_Medicina",
            "Ciências$Medicina",
        ))
        .await
        .unwrap();

    let sent = gw.messenger.wait_for(2, WAIT).await;
    let texts: Vec<_> = sent.iter().filter_map(Sent::text).collect();
    assert_eq!(
        texts,
        ["Olá! Tire suas dúvidas sobre Medicina.", "As respostas podem conter erros."]
    );
    assert_eq!(
        gw.harness
            .memory
            .active_index(&gw.harness.user)
            .await
            .unwrap()
            .as_deref(),
        Some("FUNDEP_Medicina")
    );
}

#[tokio::test]
async fn selected_index_is_used_for_later_questions() {
    let gw = gateway(
        TestHarness::builder().with_completions([" Sei responder.\nAção 1: Finalizar[A prova é dia 25/03.]"]),
    )
    .await;
    let indexes = "FUNDEP_Ciencias$FUNDEP_Medicina";

    gw.app
        .clone()
        .oneshot(webhook(list_reply_event("FUNDEP_Medicina"), indexes, ""))
        .await
        .unwrap();
    gw.messenger.wait_for(1, WAIT).await;

    gw.app
        .clone()
        .oneshot(webhook(text_event("Quando é a prova?"), indexes, ""))
        .await
        .unwrap();
    let sent = gw.messenger.wait_for(2, WAIT).await;
    assert_eq!(sent[0].text(), Some(gw.harness.config.gateway.default_intro_message.as_str()));
    assert_eq!(sent[1].text(), Some("A prova é dia 25/03."));

    let history = gw
        .harness
        .memory
        .history(&gw.harness.user, "FUNDEP_Medicina")
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn menu_command_reopens_menu() {
    let gw = gateway(TestHarness::builder()).await;
    gw.harness
        .memory
        .set_active_index(&gw.harness.user, "FUNDEP_Ciencias")
        .await
        .unwrap();

    gw.app
        .clone()
        .oneshot(webhook(text_event("#menu"), "FUNDEP_Ciencias$FUNDEP_Medicina", "Ciências$Medicina"))
        .await
        .unwrap();

    let sent = gw.messenger.wait_for(1, WAIT).await;
    assert!(matches!(sent[0], Sent::Menu { .. }));
}

#[tokio::test]
async fn processing_error_reports_code_to_user() {
    let gw = gateway(TestHarness::builder().with_moderation(MockModeration::failing())).await;

    gw.app
        .clone()
        .oneshot(webhook(text_event("oi"), "FUNDEP_Ciencias", ""))
        .await
        .unwrap();

    let sent = gw.messenger.wait_for(1, WAIT).await;
    let body = sent[0].text().unwrap();
    assert!(body.ends_with("Erro MODERATION."), "got {body}");
}

#[tokio::test]
async fn delivery_statuses_are_acknowledged_and_ignored() {
    let gw = gateway(TestHarness::builder()).await;
    let event = json!({"statuses": [{"id": "wamid.1", "status": "delivered"}]});

    let response = gw
        .app
        .clone()
        .oneshot(webhook(event, "FUNDEP_Ciencias", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gw.messenger.sent_count().await, 0);
}

#[tokio::test]
async fn webhook_without_bot_number_is_rejected() {
    let gw = gateway(TestHarness::builder()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(text_event("oi").to_string()))
        .unwrap();

    let response = gw.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_api_answers_synchronously() {
    let gw = gateway(
        TestHarness::builder().with_completions([" Cumprimento.\nAção 1: Finalizar[Olá!]"]),
    )
    .await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat?index=FUNDEP_Medicina")
        .header("content-type", "application/json")
        .body(Body::from(json!({"user": "ana", "message": "oi"}).to_string()))
        .unwrap();

    let response = gw.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: ChatResponse = json_body(response).await;
    assert_eq!(body.answer, "Olá!");

    let prompt = gw.harness.completion.requests().await[0].messages[0]
        .content
        .clone()
        .unwrap_or_default();
    assert!(prompt.contains("Mensagem: oi"));
}

#[tokio::test]
async fn chat_api_rejects_empty_message() {
    let gw = gateway(TestHarness::builder()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({"user": "ana", "message": "  "}).to_string()))
        .unwrap();

    let response = gw.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = json_body(response).await;
    assert!(body.error.contains("message"));
}

#[tokio::test]
async fn chat_api_error_hides_internal_detail() {
    let gw = gateway(TestHarness::builder().with_moderation(MockModeration::failing())).await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({"user": "ana", "message": "oi"}).to_string()))
        .unwrap();

    let response = gw.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = json_body(response).await;
    assert_eq!(body.code.as_deref(), Some("MODERATION"));
    assert!(body.error.ends_with("Erro MODERATION."), "got {}", body.error);
    assert!(!body.error.contains("mock"));
    assert!(!body.error.to_lowercase().contains("moderation error"));
}

#[tokio::test]
async fn health_reports_version() {
    let gw = gateway(TestHarness::builder()).await;
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = gw.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = json_body(response).await;
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}
