use chrono::{TimeZone, Utc};
use mkt_common::MinorUnits;
use mockall::mock;
use settlement_engine::{
    db_types::{
        AccountDetails,
        Json,
        NewPayout,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentStatusType,
        Payout,
        PayoutMethod,
        PayoutStatusType,
    },
    traits::{PayoutSettlement, PayoutSettlementOutcome, SellerBalance, Settlement, SettlementOutcome},
    PayoutError,
    PayoutManagement,
    ReconciliationError,
    SettlementManagement,
};

mock! {
    pub SettlementManager {}
    impl Clone for SettlementManager {
        fn clone(&self) -> Self;
    }
    impl SettlementManagement for SettlementManager {
        async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, ReconciliationError>;
        async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItem>, ReconciliationError>;
        async fn settle_order(&self, reference: &str, outcome: SettlementOutcome) -> Result<Settlement, ReconciliationError>;
    }
}

mock! {
    pub PayoutManager {}
    impl Clone for PayoutManager {
        fn clone(&self) -> Self;
    }
    impl PayoutManagement for PayoutManager {
        async fn fetch_balance(&self, seller_id: &str) -> Result<SellerBalance, PayoutError>;
        async fn reserve_payout(&self, payout: NewPayout) -> Result<Payout, PayoutError>;
        async fn mark_payout_processing(&self, reference: &str, external_id: &str) -> Result<Option<Payout>, PayoutError>;
        async fn settle_payout(&self, reference: &str, outcome: PayoutSettlementOutcome) -> Result<PayoutSettlement, PayoutError>;
        async fn fetch_payout(&self, reference: &str) -> Result<Option<Payout>, PayoutError>;
        async fn fetch_payouts_for_seller(&self, seller_id: &str, limit: Option<i64>) -> Result<Vec<Payout>, PayoutError>;
        async fn fetch_payouts_with_status(&self, status: PayoutStatusType) -> Result<Vec<Payout>, PayoutError>;
    }
}

pub fn pending_order(reference: &str, total: i64) -> Order {
    let created = Utc.with_ymd_and_hms(2024, 10, 1, 14, 0, 0).unwrap();
    Order {
        id: 12,
        order_number: "ORD-20241001-7F3A9C21".into(),
        shopper_id: "shopper-1".into(),
        seller_id: "seller-1".into(),
        subtotal: MinorUnits::from(total),
        tax: MinorUnits::default(),
        shipping: MinorUnits::default(),
        total: MinorUnits::from(total),
        currency: "NGN".into(),
        status: OrderStatusType::Pending,
        payment_status: PaymentStatusType::Pending,
        payment_reference: reference.into(),
        payment_method: "card".into(),
        payment_url: None,
        delivery_address: "12 Marina Rd, Lagos".into(),
        phone: None,
        failure_reason: None,
        created_at: created,
        updated_at: created,
        settled_at: None,
    }
}

pub fn payout_from(new_payout: NewPayout, status: PayoutStatusType) -> Payout {
    let created = Utc.with_ymd_and_hms(2024, 10, 2, 9, 0, 0).unwrap();
    Payout {
        id: 3,
        reference: new_payout.reference,
        seller_id: new_payout.seller_id,
        amount: new_payout.amount,
        currency: new_payout.currency,
        method: new_payout.method,
        account_details: Json(new_payout.account_details),
        narration: new_payout.narration,
        status,
        external_id: None,
        failure_reason: None,
        created_at: created,
        updated_at: created,
        completed_at: None,
    }
}

pub fn payout(reference: &str, amount: i64, status: PayoutStatusType) -> Payout {
    let new_payout = NewPayout {
        reference: reference.into(),
        seller_id: "seller-1".into(),
        amount: MinorUnits::from(amount),
        currency: "NGN".into(),
        method: PayoutMethod::BankTransfer,
        account_details: AccountDetails::bank("044", "0690000031", "Ada Obi"),
        narration: None,
    };
    payout_from(new_payout, status)
}
