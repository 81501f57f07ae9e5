use actix_web::{http::StatusCode, test::TestRequest, web};
use mkt_common::MinorUnits;
use mockall::predicate::{always, eq};
use serde_json::json as body;
use settlement_engine::{
    db_types::PayoutStatusType,
    events::EventProducers,
    test_utils::{FakeGateway, PayoutBehaviour},
    traits::{PayoutSettlement, PayoutSettlementOutcome, SellerBalance},
    EngineSettings,
    PayoutApi,
};

use super::{
    helpers::{authenticated_request, json, seller_token},
    mocks::{payout, payout_from, MockPayoutManager},
};
use crate::routes::{PayoutHistoryRoute, WalletSummaryRoute, WithdrawRoute};

fn balance(total_revenue: i64, total_paid_out: i64, in_flight: i64) -> SellerBalance {
    SellerBalance {
        seller_id: "seller-1".into(),
        total_revenue: MinorUnits::from(total_revenue),
        total_sales: 4,
        total_paid_out: MinorUnits::from(total_paid_out),
        in_flight: MinorUnits::from(in_flight),
    }
}

fn configure(db: MockPayoutManager, gateway: FakeGateway) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let api = PayoutApi::new(db, gateway, EventProducers::default(), EngineSettings::default());
        cfg.service(WalletSummaryRoute::<MockPayoutManager, FakeGateway>::new())
            .service(WithdrawRoute::<MockPayoutManager, FakeGateway>::new())
            .service(PayoutHistoryRoute::<MockPayoutManager, FakeGateway>::new())
            .app_data(web::Data::new(api));
    }
}

fn bank_withdrawal(amount: i64) -> serde_json::Value {
    body!({
        "amount": amount,
        "method": "BANK_TRANSFER",
        "accountDetails": {"bankCode": "044", "accountNumber": "0690000031", "accountName": "Ada Obi"},
        "narration": "October sales"
    })
}

#[actix_web::test]
async fn wallet_summary() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_fetch_balance().with(eq("seller-1")).times(1).returning(|_| Ok(balance(900_000, 250_000, 150_000)));
    db.expect_fetch_payouts_for_seller().with(eq("seller-1"), eq(Some(10_i64))).times(1).returning(|_, _| {
        Ok(vec![
            payout("PAY-20241002-AAAA1111", 150_000, PayoutStatusType::Processing),
            payout("PAY-20241001-BBBB2222", 250_000, PayoutStatusType::Completed),
        ])
    });
    let req = TestRequest::get().uri("/seller/wallet/summary");
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, FakeGateway::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = json(&body);
    assert_eq!(summary["availableBalance"], 500_000);
    assert_eq!(summary["totalRevenue"], 900_000);
    assert_eq!(summary["totalSales"], 4);
    assert_eq!(summary["totalPaidOut"], 250_000);
    assert_eq!(summary["pendingBalance"], 150_000);
    let recent = summary["recentPayouts"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["status"], "PROCESSING");
    assert_eq!(recent[0]["accountDetails"]["accountNumber"], "0690000031");
}

#[actix_web::test]
async fn payout_history() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_fetch_payouts_for_seller().with(eq("seller-1"), eq(None::<i64>)).times(1).returning(|_, _| {
        let mut failed = payout("PAY-20241001-CCCC3333", 120_000, PayoutStatusType::Failed);
        failed.failure_reason = Some("Account resolve failed".into());
        Ok(vec![failed])
    });
    let req = TestRequest::get().uri("/seller/wallet/payouts");
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, FakeGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let history = json(&body);
    assert_eq!(history[0]["reference"], "PAY-20241001-CCCC3333");
    assert_eq!(history[0]["method"], "BANK_TRANSFER");
    assert_eq!(history[0]["failureReason"], "Account resolve failed");
}

#[actix_web::test]
async fn withdrawal_below_minimum() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout().never();
    let gateway = FakeGateway::new();
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(bank_withdrawal(99_999));
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("The minimum withdrawal is"));
    assert_eq!(gateway.payout_calls(), 0);
}

#[actix_web::test]
async fn withdrawal_with_incomplete_account_details() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout().never();
    let payload = body!({
        "amount": 150_000,
        "method": "MOBILE_MONEY",
        "accountDetails": {"network": "MTN", "accountName": "Ada Obi"}
    });
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(payload);
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, FakeGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid account details"));
}

#[actix_web::test]
async fn withdrawal_over_balance() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout().times(1).returning(|p| {
        Err(settlement_engine::PayoutError::InsufficientBalance {
            requested: p.amount,
            available: MinorUnits::from(120_000),
        })
    });
    let gateway = FakeGateway::new();
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(bank_withdrawal(150_000));
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Insufficient balance"));
    assert_eq!(gateway.payout_calls(), 0);
}

#[actix_web::test]
async fn successful_withdrawal() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout()
        .withf(|p| p.seller_id == "seller-1" && p.amount == MinorUnits::from(150_000) && p.currency == "NGN")
        .times(1)
        .returning(|p| Ok(payout_from(p, PayoutStatusType::Pending)));
    db.expect_mark_payout_processing().with(always(), eq("TRF-3")).times(1).returning(|reference, external_id| {
        let mut p = payout(reference, 150_000, PayoutStatusType::Processing);
        p.external_id = Some(external_id.to_string());
        Ok(Some(p))
    });
    db.expect_settle_payout().never();
    let gateway = FakeGateway::new();
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(bank_withdrawal(150_000));
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let res = json(&body);
    assert_eq!(res["status"], "PROCESSING");
    assert!(res["reference"].as_str().unwrap().starts_with("PAY-"));
    assert_eq!(gateway.payout_calls(), 1);
}

#[actix_web::test]
async fn rejected_withdrawal_releases_the_funds() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout().times(1).returning(|p| Ok(payout_from(p, PayoutStatusType::Pending)));
    db.expect_mark_payout_processing().never();
    db.expect_settle_payout()
        .withf(|_, outcome| outcome == &PayoutSettlementOutcome::Failed("Invalid account number".into()))
        .times(1)
        .returning(|reference, _| {
            let mut p = payout(reference, 150_000, PayoutStatusType::Failed);
            p.failure_reason = Some("Invalid account number".into());
            Ok(PayoutSettlement::Applied(p))
        });
    let gateway = FakeGateway::new();
    gateway.set_payout_behaviour(PayoutBehaviour::Reject("Invalid account number".into()));
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(bank_withdrawal(150_000));
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json(&body)["error"], "Payment provider error. The payment provider rejected the payout: Invalid account number");
}

#[actix_web::test]
async fn unreachable_provider_leaves_the_payout_pending() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPayoutManager::new();
    db.expect_reserve_payout().times(1).returning(|p| Ok(payout_from(p, PayoutStatusType::Pending)));
    db.expect_mark_payout_processing().never();
    db.expect_settle_payout().never();
    let gateway = FakeGateway::new();
    gateway.set_payout_behaviour(PayoutBehaviour::Unreachable);
    let req = TestRequest::post().uri("/seller/wallet/withdraw").set_json(bank_withdrawal(150_000));
    let (status, body) = authenticated_request(&seller_token("seller-1"), req, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json(&body)["error"].as_str().unwrap().contains("is pending and its funds remain reserved"));
}
