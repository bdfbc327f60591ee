//! HTTP routes exercised in-process with `oneshot`

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use stripe_tiger::api::{create_router, AppState};
use stripe_tiger::CommandHandler;

const SECRET: &str = "s3cret-token";

fn app(h: &Harness, secret: Option<&str>) -> Router {
    let commands = Arc::new(CommandHandler::new(
        h.engine.clone(),
        h.notifier.clone(),
        Some(ADMIN),
    ));
    let state = Arc::new(AppState::new(
        h.engine.clone(),
        commands,
        secret.map(String::from),
    ));
    create_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_webhook(app: Router, secret: Option<&str>, body: &str) -> StatusCode {
    let mut req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(s) = secret {
        req = req.header("X-Telegram-Bot-Api-Secret-Token", s);
    }
    app.oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
        .status()
}

fn id_update(chat: i64) -> String {
    serde_json::json!({
        "update_id": 99,
        "message": {"message_id": 1, "chat": {"id": chat, "type": "private"}, "text": "/id"}
    })
    .to_string()
}

#[tokio::test]
async fn test_root_is_plain_text() {
    let h = harness(settings());
    let (status, body) = get(app(&h, None), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().starts_with("Stripe Tiger v"));
}

#[tokio::test]
async fn test_health_envelope() {
    let h = harness(settings());
    let (status, json) = get_json(app(&h, None), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["mode"], "mock");
    assert!(json["latency_ms"].is_number());
    assert!(json["timestamp"].is_number());
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_status_snapshot() {
    let h = harness(settings());
    h.engine.set_poll(30);
    let (status, json) = get_json(app(&h, Some(SECRET)), "/status").await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["mode"], "mock");
    assert_eq!(data["paused"], false);
    assert_eq!(data["poll_seconds"], 30);
    assert_eq!(data["eth_token"], ETH_TOKEN);
    assert!(data["thresholds"][BSC_TOKEN]["rsi_buy"].is_number());
}

#[tokio::test]
async fn test_profit_and_trades_from_storage() {
    let dir = tempfile::tempdir().unwrap();
    let store = storage(dir.path());
    let h = harness_with(settings(), |m| m.with_storage(&store));
    h.market.set_price(ETH_TOKEN, 1.0);
    h.engine.manual_buy(None).await;
    h.market.set_price(ETH_TOKEN, 2.0);
    h.engine.manual_sell(None).await;

    let (status, json) = get_json(app(&h, None), "/profit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["realized_pnl_usd"], 25.0);
    assert_eq!(json["data"]["tokens"][ETH_TOKEN]["trades"], 1);
    assert_eq!(json["data"]["tokens"][ETH_TOKEN]["win_rate"], 100.0);

    let (status, json) = get_json(app(&h, None), "/trades?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 2);
    let entries = json["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["side"], "SELL");
}

#[tokio::test]
async fn test_profit_without_storage_is_empty() {
    let h = harness(settings());
    let (status, json) = get_json(app(&h, None), "/profit").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["selectivity_threshold"], 60);
    assert!(json["data"]["tokens"].as_object().unwrap().is_empty());

    let (_, json) = get_json(app(&h, None), "/trades").await;
    assert_eq!(json["data"]["total"], 0);
}

#[tokio::test]
async fn test_webhook_requires_secret() {
    let h = harness(settings());

    assert_eq!(
        post_webhook(app(&h, Some(SECRET)), None, &id_update(STRANGER)).await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        post_webhook(app(&h, Some(SECRET)), Some("wrong"), &id_update(STRANGER)).await,
        StatusCode::UNAUTHORIZED
    );
    assert!(h.notifier.sent().is_empty());

    assert_eq!(
        post_webhook(app(&h, Some(SECRET)), Some(SECRET), &id_update(STRANGER)).await,
        StatusCode::OK
    );
    assert_eq!(h.notifier.sent(), vec![(STRANGER, "Your chat id: 7".to_string())]);
}

#[tokio::test]
async fn test_webhook_acknowledges_malformed_updates() {
    let h = harness(settings());
    assert_eq!(
        post_webhook(app(&h, None), None, "{\"nope\": true").await,
        StatusCode::OK
    );
    assert_eq!(
        post_webhook(app(&h, None), None, "{\"update_id\": 5}").await,
        StatusCode::OK
    );
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_webhook_runs_admin_commands() {
    let h = harness(settings());
    let body = serde_json::json!({
        "update_id": 3,
        "message": {"message_id": 2, "chat": {"id": ADMIN}, "text": "/pause"}
    })
    .to_string();

    assert_eq!(post_webhook(app(&h, None), None, &body).await, StatusCode::OK);
    assert!(h.engine.is_paused());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let h = harness(settings());
    let (status, _) = get(app(&h, None), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
