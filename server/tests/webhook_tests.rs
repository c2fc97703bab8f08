// tests/webhook_tests.rs
#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::*;
use paysync_server::config::AppConfig;
use paysync_server::models::{Order, OrderStatus};
use paysync_server::store::MemoryStore;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const WEBHOOK: &str = "/api/v1/webhooks/payment";

fn post(body: JsonValue) -> test::TestRequest {
  test::TestRequest::post().uri(WEBHOOK).set_json(body)
}

/// Order state with the bookkeeping timestamp cleared, for replay comparisons.
fn settled_fields(mut order: Order) -> Order {
  order.updated_at = order.created_at;
  order
}

#[actix_web::test]
async fn paid_callback_by_external_id_updates_order_and_archives_item() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  let app = test_app!(memory_state(&store, test_config()));

  let resp = test::call_service(
    &app,
    post(json!({ "external_id": "o1", "status": "PAID", "payment_channel": "bank_transfer" })).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "ok": true, "updated": 1, "by": "external_id" }));

  let order = store.order("o1").unwrap();
  assert_eq!(order.status, OrderStatus::Paid);
  assert!(order.paid_at.is_some());
  assert_eq!(order.payment_channel.as_deref(), Some("bank_transfer"));
  assert_eq!(order.currency, "IDR");

  let product = store.product("p1").unwrap();
  assert!(!product.is_active);
  assert!(product.archived_at.is_some());
}

#[actix_web::test]
async fn unknown_invoice_id_falls_back_to_external_id() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "ord_1", "p1");
  let app = test_app!(memory_state(&store, test_config()));

  let body: JsonValue = test::call_and_read_body_json(
    &app,
    post(json!({ "id": "inv_1", "external_id": "ord_1", "status": "SETTLED" })).to_request(),
  )
  .await;
  assert_eq!(body, json!({ "ok": true, "updated": 1, "by": "external_id" }));

  let order = store.order("ord_1").unwrap();
  assert_eq!(order.status, OrderStatus::Completed);
  assert_eq!(order.provider_invoice_id.as_deref(), Some("inv_1"));
}

#[actix_web::test]
async fn known_invoice_id_matches_on_the_primary_key() {
  setup_tracing();
  let store = MemoryStore::new();
  let mut order = Order::pending("ord_1", None, 10_000, "IDR");
  order.provider_invoice_id = Some("inv_1".to_string());
  store.insert_order(order);
  let app = test_app!(memory_state(&store, test_config()));

  let body: JsonValue = test::call_and_read_body_json(
    &app,
    post(json!({ "id": "inv_1", "external_id": "ord_1", "status": "EXPIRED" })).to_request(),
  )
  .await;
  assert_eq!(body, json!({ "ok": true, "updated": 1, "by": "invoice_id" }));
  assert_eq!(store.order("ord_1").unwrap().status, OrderStatus::Cancelled);
}

#[actix_web::test]
async fn replaying_a_callback_converges_to_the_same_state() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "ord_1", "p1");
  let app = test_app!(memory_state(&store, test_config()));
  let payload = json!({
    "data": {
      "id": "inv_1",
      "external_id": "ord_1",
      "status": "PAID",
      "payment_method": "QRIS",
      "payer_email": "buyer@example.com",
      "invoice_url": "https://pay.example.com/inv_1"
    }
  });

  let first: JsonValue = test::call_and_read_body_json(&app, post(payload.clone()).to_request()).await;
  assert_eq!(first["updated"], 1);
  let once = settled_fields(store.order("ord_1").unwrap());

  for _ in 0..3 {
    let replay: JsonValue = test::call_and_read_body_json(&app, post(payload.clone()).to_request()).await;
    assert_eq!(replay["ok"], true);
    assert_eq!(replay["updated"], 1);
    // The invoice id was persisted by the first delivery.
    assert_eq!(replay["by"], "invoice_id");
    assert_eq!(settled_fields(store.order("ord_1").unwrap()), once);
  }
  assert_eq!(once.payer_email.as_deref(), Some("buyer@example.com"));
  assert_eq!(once.payment_channel.as_deref(), Some("QRIS"));
}

#[actix_web::test]
async fn unmatched_callback_is_acknowledged_with_none() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "ord_1", "p1");
  let app = test_app!(memory_state(&store, test_config()));

  let body: JsonValue = test::call_and_read_body_json(
    &app,
    post(json!({ "id": "inv_404", "external_id": "ord_404", "status": "PAID" })).to_request(),
  )
  .await;
  assert_eq!(body, json!({ "ok": true, "updated": 0, "by": "none" }));
  assert!(store.product("p1").unwrap().is_active);
}

#[actix_web::test]
async fn unrecognized_status_degrades_to_pending_without_archival() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  let app = test_app!(memory_state(&store, test_config()));

  let body: JsonValue =
    test::call_and_read_body_json(&app, post(json!({ "external_id": "o1", "status": "REFUNDED" })).to_request()).await;
  assert_eq!(body["updated"], 1);

  let order = store.order("o1").unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  assert!(order.paid_at.is_none());
  assert!(store.product("p1").unwrap().is_active);
}

#[actix_web::test]
async fn callback_token_is_enforced_when_configured() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  let config = AppConfig {
    callback_token: Some("s3cret".to_string()),
    ..test_config()
  };
  let app = test_app!(memory_state(&store, config));
  let payload = json!({ "external_id": "o1", "status": "PAID" });

  let missing = test::call_service(&app, post(payload.clone()).to_request()).await;
  assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
  let body: JsonValue = test::read_body_json(missing).await;
  assert_eq!(body["error"], "auth_error");

  let wrong = test::call_service(
    &app,
    post(payload.clone()).insert_header(("x-callback-token", "S3CRET")).to_request(),
  )
  .await;
  assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(store.order("o1").unwrap().status, OrderStatus::Pending);

  let ok = test::call_service(
    &app,
    post(payload).insert_header(("x-callback-token", "s3cret")).to_request(),
  )
  .await;
  assert_eq!(ok.status(), StatusCode::OK);
  assert_eq!(store.order("o1").unwrap().status, OrderStatus::Paid);
}

#[actix_web::test]
async fn auth_failure_never_reaches_the_store() {
  setup_tracing();
  let orders = Arc::new(ScriptedOrders::new(MemoryStore::new()));
  let config = AppConfig {
    callback_token: Some("s3cret".to_string()),
    ..test_config()
  };
  let state = state_with(
    orders.clone(),
    Arc::new(MemoryStore::new()),
    Arc::new(RecordingNotifier::default()),
    config,
  );
  let app = test_app!(state);

  let resp = test::call_service(&app, post(json!({ "id": "inv_1", "status": "PAID" })).to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn malformed_payloads_are_rejected_before_storage() {
  setup_tracing();
  let orders = Arc::new(ScriptedOrders::new(MemoryStore::new()));
  let state = state_with(
    orders.clone(),
    Arc::new(MemoryStore::new()),
    Arc::new(RecordingNotifier::default()),
    test_config(),
  );
  let app = test_app!(state);

  for payload in [
    json!({ "external_id": "o1" }),
    json!({ "status": "PAID" }),
    json!({ "data": { "status": "PAID", "id": "   " } }),
  ] {
    let resp = test::call_service(&app, post(payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: JsonValue = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());
  }

  let not_json = test::TestRequest::post()
    .uri(WEBHOOK)
    .insert_header(("content-type", "application/json"))
    .set_payload("{status: PAID")
    .to_request();
  assert_eq!(test::call_service(&app, not_json).await.status(), StatusCode::BAD_REQUEST);
  assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn archival_failure_does_not_change_the_outcome() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  let catalog = ScriptedCatalog {
    fail_archive: true,
    ..ScriptedCatalog::new(store.clone())
  };
  let state = state_with(
    Arc::new(store.clone()),
    Arc::new(catalog),
    Arc::new(RecordingNotifier::default()),
    test_config(),
  );
  let app = test_app!(state);

  let resp = test::call_service(&app, post(json!({ "external_id": "o1", "status": "PAID" })).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "ok": true, "updated": 1, "by": "external_id" }));
  assert_eq!(store.order("o1").unwrap().status, OrderStatus::Paid);
  assert!(store.product("p1").unwrap().is_active);
}

#[actix_web::test]
async fn order_store_failure_surfaces_as_500() {
  setup_tracing();
  let orders = ScriptedOrders {
    fail_updates: true,
    ..ScriptedOrders::new(MemoryStore::new())
  };
  let state = state_with(
    Arc::new(orders),
    Arc::new(MemoryStore::new()),
    Arc::new(RecordingNotifier::default()),
    test_config(),
  );
  let app = test_app!(state);

  let resp = test::call_service(&app, post(json!({ "external_id": "o1", "status": "PAID" })).to_request()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: JsonValue = test::read_body_json(resp).await;
  assert_eq!(body["error"], "upstream_store_error");
  assert!(body["message"].as_str().unwrap().contains("order store unavailable"));
}

#[actix_web::test]
async fn operators_are_notified_once_per_confirmed_payment() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  seed_purchase(&store, "o2", "p2");
  let notifier = Arc::new(RecordingNotifier::default());
  let state = state_with(Arc::new(store.clone()), Arc::new(store.clone()), notifier.clone(), test_config());
  let app = test_app!(state);

  let _: JsonValue = test::call_and_read_body_json(
    &app,
    post(json!({ "external_id": "o1", "status": "PAID", "payer": { "email": "a@example.com" } })).to_request(),
  )
  .await;
  let _: JsonValue =
    test::call_and_read_body_json(&app, post(json!({ "external_id": "o2", "status": "pending" })).to_request()).await;

  let sent = notifier.sent.lock();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].matched_by, "external_id");
  assert_eq!(sent[0].key, "o1");
  assert_eq!(sent[0].status, OrderStatus::Paid);
  assert_eq!(sent[0].payer_email.as_deref(), Some("a@example.com"));
}

#[actix_web::test]
async fn notification_failure_does_not_change_the_outcome() {
  setup_tracing();
  let store = MemoryStore::new();
  seed_purchase(&store, "o1", "p1");
  let notifier = Arc::new(RecordingNotifier {
    fail: true,
    ..RecordingNotifier::default()
  });
  let state = state_with(Arc::new(store.clone()), Arc::new(store.clone()), notifier.clone(), test_config());
  let app = test_app!(state);

  let resp = test::call_service(&app, post(json!({ "external_id": "o1", "status": "SETTLED" })).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(notifier.sent.lock().len(), 1);
  assert!(!store.product("p1").unwrap().is_active);
}

#[actix_web::test]
async fn other_methods_are_rejected_with_405() {
  setup_tracing();
  let app = test_app!(memory_state(&MemoryStore::new(), test_config()));

  for req in [
    test::TestRequest::get().uri(WEBHOOK).to_request(),
    test::TestRequest::put().uri(WEBHOOK).to_request(),
  ] {
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: JsonValue = test::read_body_json(resp).await;
    assert_eq!(body["error"], "method_not_allowed");
  }

  let health: JsonValue =
    test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(health, json!({ "status": "ok" }));
}
