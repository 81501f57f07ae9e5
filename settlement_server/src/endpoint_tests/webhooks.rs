//! The provider's webhook. All backend access is mocked, so any unexpected database call fails the test.
use actix_web::{http::StatusCode, test::TestRequest, web};
use flutterwave_tools::{HMAC_SIGNATURE_HEADER, VERIF_HASH_HEADER};
use mkt_common::MinorUnits;
use mockall::predicate::eq;
use settlement_engine::{
    db_types::{OrderStatusType, PaymentStatusType, PayoutStatusType},
    events::EventProducers,
    test_utils::{FakeGateway, FAKE_WEBHOOK_SECRET},
    traits::{
        PaymentOutcome,
        PayoutOutcome,
        PayoutSettlement,
        PayoutSettlementOutcome,
        Settlement,
        SettlementOutcome,
        WebhookEvent,
    },
    EngineSettings,
    PayoutApi,
    ReconciliationApi,
};

use super::{
    helpers::{json, public_request},
    mocks::{payout, pending_order, MockPayoutManager, MockSettlementManager},
};
use crate::routes::PaymentWebhookRoute;

const REFERENCE: &str = "MKT-1727791200000-Q7M2XK4D";
const PAYOUT_REF: &str = "PAY-20241002-AAAA1111";

fn configure(
    settlements: MockSettlementManager,
    payouts: MockPayoutManager,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let gateway = FakeGateway::new();
        let settings = EngineSettings::default();
        let reconciliation =
            ReconciliationApi::new(settlements, gateway.clone(), EventProducers::default(), settings.clone());
        let payout_api = PayoutApi::new(payouts, gateway, EventProducers::default(), settings);
        cfg.service(PaymentWebhookRoute::<MockSettlementManager, MockPayoutManager, FakeGateway, FakeGateway>::new())
            .app_data(web::Data::new(reconciliation))
            .app_data(web::Data::new(payout_api));
    }
}

/// Mocks without expectations, so any database call fails the test.
fn untouched() -> (MockSettlementManager, MockPayoutManager) {
    (MockSettlementManager::new(), MockPayoutManager::new())
}

fn charge(status: &str, amount: i64) -> WebhookEvent {
    WebhookEvent::Charge(PaymentOutcome {
        reference: REFERENCE.into(),
        transaction_id: "5521073".into(),
        amount: MinorUnits::from(amount),
        currency: "NGN".into(),
        reported_status: status.into(),
    })
}

fn transfer(status: &str, message: Option<&str>) -> WebhookEvent {
    WebhookEvent::Transfer(PayoutOutcome {
        reference: PAYOUT_REF.into(),
        external_id: Some("TRF-3".into()),
        reported_status: status.into(),
        message: message.map(String::from),
    })
}

fn webhook(event: &WebhookEvent, signature: &str) -> TestRequest {
    TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((VERIF_HASH_HEADER, signature))
        .set_payload(FakeGateway::webhook_body(event))
}

async fn send(req: TestRequest, mocks: (MockSettlementManager, MockPayoutManager)) -> (StatusCode, serde_json::Value) {
    let _ = env_logger::try_init().ok();
    let (status, body) = public_request(req, configure(mocks.0, mocks.1)).await;
    let body = if body.is_empty() { serde_json::Value::Null } else { json(&body) };
    (status, body)
}

#[actix_web::test]
async fn invalid_signature_is_rejected_before_anything_is_read() {
    let (status, body) = send(webhook(&charge("successful", 50_000), "not-the-secret"), untouched()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Webhook signature is invalid");
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .set_payload(FakeGateway::webhook_body(&charge("successful", 50_000)));
    let (status, _) = send(req, untouched()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn alternative_signature_header() {
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((HMAC_SIGNATURE_HEADER, FAKE_WEBHOOK_SECRET))
        .set_payload(FakeGateway::webhook_body(&WebhookEvent::Ignored("subscription.cancelled".into())));
    let (status, body) = send(req, untouched()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event subscription.cancelled ignored");
}

#[actix_web::test]
async fn malformed_body() {
    let req = TestRequest::post()
        .uri("/payments/webhook")
        .insert_header((VERIF_HASH_HEADER, FAKE_WEBHOOK_SECRET))
        .set_payload("{\"event\": \"charge.completed\", \"data\": 42");
    let (status, body) = send(req, untouched()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Malformed payment notification"));
}

#[actix_web::test]
async fn successful_charge_settles_the_order() {
    let (mut settlements, payouts) = untouched();
    settlements
        .expect_fetch_order_by_reference()
        .with(eq(REFERENCE))
        .times(1)
        .returning(|r| Ok(Some(pending_order(r, 50_000))));
    settlements.expect_settle_order().with(eq(REFERENCE), eq(SettlementOutcome::Completed)).times(1).returning(|r, _| {
        let mut order = pending_order(r, 50_000);
        order.status = OrderStatusType::Confirmed;
        order.payment_status = PaymentStatusType::Completed;
        Ok(Settlement::Applied(order))
    });
    let (status, body) = send(webhook(&charge("successful", 50_000), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order ORD-20241001-7F3A9C21 is now COMPLETED");
}

#[actix_web::test]
async fn redelivered_charge_changes_nothing() {
    let (mut settlements, payouts) = untouched();
    settlements.expect_fetch_order_by_reference().times(1).returning(|r| {
        let mut order = pending_order(r, 50_000);
        order.status = OrderStatusType::Confirmed;
        order.payment_status = PaymentStatusType::Completed;
        Ok(Some(order))
    });
    settlements.expect_settle_order().never();
    let (status, body) = send(webhook(&charge("successful", 50_000), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order ORD-20241001-7F3A9C21 was already settled");
}

#[actix_web::test]
async fn unresolved_charge_leaves_the_order_pending() {
    let (mut settlements, payouts) = untouched();
    settlements.expect_fetch_order_by_reference().times(1).returning(|r| Ok(Some(pending_order(r, 50_000))));
    settlements.expect_settle_order().never();
    let (status, body) = send(webhook(&charge("pending", 50_000), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order ORD-20241001-7F3A9C21 is still pending");
}

#[actix_web::test]
async fn charge_for_unknown_order() {
    let (mut settlements, payouts) = untouched();
    settlements.expect_fetch_order_by_reference().times(1).returning(|_| Ok(None));
    settlements.expect_settle_order().never();
    let (status, _) = send(webhook(&charge("successful", 50_000), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn successful_transfer_completes_the_payout() {
    let (settlements, mut payouts) = untouched();
    payouts
        .expect_fetch_payout()
        .with(eq(PAYOUT_REF))
        .times(1)
        .returning(|r| Ok(Some(payout(r, 150_000, PayoutStatusType::Processing))));
    payouts
        .expect_settle_payout()
        .with(eq(PAYOUT_REF), eq(PayoutSettlementOutcome::Completed))
        .times(1)
        .returning(|r, _| Ok(PayoutSettlement::Applied(payout(r, 150_000, PayoutStatusType::Completed))));
    let (status, body) = send(webhook(&transfer("SUCCESSFUL", None), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Payout {PAYOUT_REF} is now COMPLETED"));
}

#[actix_web::test]
async fn failed_transfer_keeps_the_provider_message() {
    let (settlements, mut payouts) = untouched();
    payouts.expect_fetch_payout().times(1).returning(|r| Ok(Some(payout(r, 150_000, PayoutStatusType::Processing))));
    payouts
        .expect_settle_payout()
        .with(eq(PAYOUT_REF), eq(PayoutSettlementOutcome::Failed("Account resolve failed".into())))
        .times(1)
        .returning(|r, _| Ok(PayoutSettlement::Applied(payout(r, 150_000, PayoutStatusType::Failed))));
    let event = transfer("FAILED", Some("Account resolve failed"));
    let (status, body) = send(webhook(&event, FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Payout {PAYOUT_REF} is now FAILED"));
}

#[actix_web::test]
async fn transfer_for_settled_payout() {
    let (settlements, mut payouts) = untouched();
    payouts.expect_fetch_payout().times(1).returning(|r| Ok(Some(payout(r, 150_000, PayoutStatusType::Completed))));
    payouts.expect_settle_payout().never();
    let (status, body) = send(webhook(&transfer("SUCCESSFUL", None), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Payout {PAYOUT_REF} was already settled"));
}

#[actix_web::test]
async fn transfer_for_unknown_payout() {
    let (settlements, mut payouts) = untouched();
    payouts.expect_fetch_payout().times(1).returning(|_| Ok(None));
    let (status, _) = send(webhook(&transfer("SUCCESSFUL", None), FAKE_WEBHOOK_SECRET), (settlements, payouts)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
