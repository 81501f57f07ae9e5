//! Checkout and verification endpoints, run against a throwaway SQLite database and the scripted provider.
use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web};
use mkt_common::MinorUnits;
use serde_json::json as body;
use settlement_engine::{
    db_types::PaymentStatusType,
    events::EventProducers,
    sqlite::db::products,
    test_utils::{add_to_cart, completed_outcome, prepare_test_env, random_db_path, seed_product, FakeGateway},
    traits::{CheckoutManagement, PaymentOutcome},
    CheckoutApi,
    EngineSettings,
    GatewayError,
    ReconciliationApi,
    SqliteDatabase,
};

use super::helpers::{authenticated_request, json, public_request, seller_token, shopper_token};
use crate::routes::{InitializePaymentRoute, OrderByIdRoute, VerifyPaymentRoute};

struct Env {
    db: SqliteDatabase,
    gateway: FakeGateway,
    checkout: CheckoutApi<SqliteDatabase, FakeGateway>,
    reconciliation: ReconciliationApi<SqliteDatabase, FakeGateway>,
}

impl Env {
    async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let gateway = FakeGateway::new();
        let settings = EngineSettings::default().with_gateway_timeout(Duration::from_millis(250));
        let checkout = CheckoutApi::new(db.clone(), gateway.clone(), settings.clone());
        let reconciliation = ReconciliationApi::new(db.clone(), gateway.clone(), EventProducers::default(), settings);
        Self { db, gateway, checkout, reconciliation }
    }

    fn configure(&self) -> impl FnOnce(&mut web::ServiceConfig) {
        let checkout = self.checkout.clone();
        let reconciliation = self.reconciliation.clone();
        move |cfg| {
            cfg.service(InitializePaymentRoute::<SqliteDatabase, FakeGateway>::new())
                .service(OrderByIdRoute::<SqliteDatabase, FakeGateway>::new())
                .app_data(web::Data::new(checkout))
                .app_data(web::Data::new(reconciliation));
        }
    }

    fn configure_public(&self) -> impl FnOnce(&mut web::ServiceConfig) {
        let reconciliation = self.reconciliation.clone();
        move |cfg| {
            cfg.service(VerifyPaymentRoute::<SqliteDatabase, FakeGateway>::new())
                .app_data(web::Data::new(reconciliation));
        }
    }

    async fn initialize(&self, shopper: &str, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = TestRequest::post().uri("/payments/initialize").set_json(payload);
        let (status, body) = authenticated_request(&shopper_token(shopper), req, self.configure()).await;
        (status, json(&body))
    }
}

fn cart_checkout() -> serde_json::Value {
    body!({ "deliveryAddress": "12 Marina Rd, Lagos", "paymentMethod": "card" })
}

#[actix_web::test]
async fn initialize_payment_from_cart() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 25_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 2).await;
    let (status, res) = env.initialize("shopper-1", cart_checkout()).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert_eq!(res["order"]["total"], 50_000);
    assert_eq!(res["order"]["status"], "PENDING");
    assert_eq!(res["payment"]["amount"], 50_000);
    assert_eq!(res["payment"]["currency"], "NGN");
    let reference = res["payment"]["reference"].as_str().unwrap();
    assert!(reference.starts_with("MKT-"));
    assert_eq!(res["payment"]["paymentUrl"], format!("https://pay.example.com/checkout/{reference}"));
    // Stock is untouched until the payment settles
    let order_id = res["order"]["id"].as_i64().unwrap();
    let order = env.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
    assert_eq!(order.payment_url.as_deref(), res["payment"]["paymentUrl"].as_str());
}

#[actix_web::test]
async fn initialize_payment_with_explicit_items() {
    let env = Env::new().await;
    seed_product(&env.db, "kente-scarf", "seller-2", 8_000, 10).await;
    let payload = body!({
        "deliveryAddress": "4 Ring Rd, Accra",
        "paymentMethod": "mobilemoneyghana",
        "items": [{"product_id": "kente-scarf", "quantity": 2}, {"product_id": "kente-scarf", "quantity": 1}]
    });
    let (status, res) = env.initialize("shopper-2", payload).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert_eq!(res["order"]["total"], 24_000);
}

#[actix_web::test]
async fn checkout_validation_errors() {
    let env = Env::new().await;
    let (status, res) = env.initialize("shopper-1", cart_checkout()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "The cart is empty");

    seed_product(&env.db, "sandals", "seller-1", 12_000, 1).await;
    add_to_cart(&env.db, "shopper-1", "sandals", 3).await;
    let (status, res) = env.initialize("shopper-1", cart_checkout()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "Insufficient stock for product sandals");

    let (status, res) = env.initialize("shopper-1", body!({ "paymentMethod": "card" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res["error"], "A delivery address is required");
    assert_eq!(env.gateway.initialize_calls(), 0);
}

#[actix_web::test]
async fn sellers_cannot_check_out() {
    let env = Env::new().await;
    let req = TestRequest::post().uri("/payments/initialize").set_json(cart_checkout());
    let (status, _) = authenticated_request(&seller_token("seller-1"), req, env.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn provider_outage_keeps_the_order_for_a_retry() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 25_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 1).await;
    env.gateway.fail_initialize_with(Some(GatewayError::Timeout));
    let (status, res) = env.initialize("shopper-1", cart_checkout()).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let error = res["error"].as_str().unwrap();
    assert!(error.contains("Could not initialize payment for order"), "{error}");
    let order_id = error.split("for order ").nth(1).and_then(|s| s.split(':').next()).unwrap().parse::<i64>().unwrap();
    let order = env.db.fetch_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
    assert!(order.payment_url.is_none());

    env.gateway.fail_initialize_with(None);
    let retry = body!({ "orderId": order_id });
    let (status, res) = env.initialize("shopper-1", retry).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert_eq!(res["order"]["id"], order_id);
    assert_eq!(res["payment"]["reference"], order.payment_reference);
    // Someone else cannot re-open the shopper's order
    let (status, _) = env.initialize("shopper-9", body!({ "orderId": order_id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_own_order_only() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 25_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 1).await;
    let (_, res) = env.initialize("shopper-1", cart_checkout()).await;
    let order_id = res["order"]["id"].as_i64().unwrap();
    let path = format!("/orders/{order_id}");

    let req = TestRequest::get().uri(&path);
    let (status, body) = authenticated_request(&shopper_token("shopper-1"), req, env.configure()).await;
    assert_eq!(status, StatusCode::OK);
    let order = json(&body);
    assert_eq!(order["items"][0]["productId"], "ankara-dress");
    assert_eq!(order["items"][0]["lineTotal"], 25_000);
    assert_eq!(order["paymentStatus"], "PENDING");

    let req = TestRequest::get().uri(&path);
    let (status, _) = authenticated_request(&shopper_token("shopper-2"), req, env.configure()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn verify_settles_the_order_once() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 25_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 2).await;
    let (_, res) = env.initialize("shopper-1", cart_checkout()).await;
    let order = env.db.fetch_order(res["order"]["id"].as_i64().unwrap()).await.unwrap().unwrap();
    env.gateway.register_transaction("4471", completed_outcome(&order, "4471"));

    let payload = body!({ "transaction_id": "4471", "tx_ref": order.payment_reference });
    for _ in 0..2 {
        let req = TestRequest::post().uri("/payments/verify").set_json(payload.clone());
        let (status, body) = public_request(req, env.configure_public()).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let res = json(&body);
        assert_eq!(res["status"], "success");
        assert_eq!(res["order"]["orderNumber"], order.order_number);
        assert_eq!(res["order"]["status"], "CONFIRMED");
        assert_eq!(res["order"]["paymentStatus"], "COMPLETED");
    }
    let mut conn = env.db.pool().acquire().await.unwrap();
    let product = products::fetch_product("ankara-dress", &mut conn).await.unwrap().unwrap();
    assert_eq!(product.stock, 2);
}

#[actix_web::test]
async fn verify_underpayment_fails_the_order() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 50_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 1).await;
    let (_, res) = env.initialize("shopper-1", cart_checkout()).await;
    let order = env.db.fetch_order(res["order"]["id"].as_i64().unwrap()).await.unwrap().unwrap();
    let outcome = PaymentOutcome { amount: MinorUnits::from(45_000), ..completed_outcome(&order, "4472") };
    env.gateway.register_transaction("4472", outcome);

    let req = TestRequest::post().uri("/payments/verify").set_json(body!({ "transaction_id": "4472" }));
    let (status, body) = public_request(req, env.configure_public()).await;
    assert_eq!(status, StatusCode::OK);
    let res = json(&body);
    assert_eq!(res["status"], "failed");
    assert_eq!(res["order"]["status"], "CANCELLED");
    assert!(res["order"]["failureReason"].as_str().unwrap().starts_with("AMOUNT_MISMATCH"));
}

#[actix_web::test]
async fn verify_rejects_a_different_reference() {
    let env = Env::new().await;
    seed_product(&env.db, "ankara-dress", "seller-1", 25_000, 4).await;
    add_to_cart(&env.db, "shopper-1", "ankara-dress", 1).await;
    let (_, res) = env.initialize("shopper-1", cart_checkout()).await;
    let order = env.db.fetch_order(res["order"]["id"].as_i64().unwrap()).await.unwrap().unwrap();
    env.gateway.register_transaction("4473", completed_outcome(&order, "4473"));

    let payload = body!({ "transaction_id": "4473", "tx_ref": "MKT-SOMEONE-ELSE" });
    let req = TestRequest::post().uri("/payments/verify").set_json(payload);
    let (status, _) = public_request(req, env.configure_public()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let order = env.db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
}

#[actix_web::test]
async fn verify_unknown_transaction() {
    let env = Env::new().await;
    let req = TestRequest::post().uri("/payments/verify").set_json(body!({ "transaction_id": "0000" }));
    let (status, _) = public_request(req, env.configure_public()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    env.gateway.set_verify_delay(Some(Duration::from_secs(2)));
    let req = TestRequest::post().uri("/payments/verify").set_json(body!({ "transaction_id": "0000" }));
    let (status, _) = public_request(req, env.configure_public()).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}
