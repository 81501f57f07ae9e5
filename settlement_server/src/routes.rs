//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a screenful MUST have their logic pushed down into the engine. Keep this module neat
//! and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment provider,
//! so they are all `async`, and none of them hold a database transaction open across a provider call.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use flutterwave_tools::{HMAC_SIGNATURE_HEADER, VERIF_HASH_HEADER};
use log::*;
use settlement_engine::{
    traits::{PayoutSettlement, Settlement, WebhookEvent},
    CheckoutApi,
    CheckoutManagement,
    PaymentGateway,
    PayoutApi,
    PayoutGateway,
    PayoutManagement,
    ReconciliationApi,
    SettlementManagement,
};

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{
        InitializePaymentRequest,
        InitializePaymentResponse,
        JsonResponse,
        OrderDetails,
        PayoutView,
        VerifyPaymentRequest,
        VerifyPaymentResponse,
        WalletSummaryResponse,
        WithdrawRequest,
        WithdrawResponse,
    },
    errors::ServerError,
};

/// Headers that may carry the webhook signature, in order of preference.
pub const WEBHOOK_SIGNATURE_HEADERS: [&str; 2] = [VERIF_HASH_HEADER, HMAC_SIGNATURE_HEADER];

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each bound becomes a type parameter of the route struct (`T<Bound>`), in the order given, and the handler is
// instantiated with them in that order.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds >],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds >] >,)+ );}
        paste::paste! { impl< $( [< T $bounds >],)+ > [<$name:camel Route>]< $( [< T $bounds >],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds >] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds>],)+>
        where
            $([<T $bounds>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds >],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds >] >,)+ );}
        paste::paste! { impl< $( [< T $bounds >],)+ > [<$name:camel Route>]< $( [< T $bounds >],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds >] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds>],)+>
        where
            $([<T $bounds>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initialize_payment => Post "/payments/initialize" impl CheckoutManagement, PaymentGateway where requires [Role::Shopper]);
/// Route handler for `POST /payments/initialize`.
///
/// Prices the shopper's cart (or the `items` in the body), stores the order as `PENDING`, and opens a hosted payment
/// session with the provider. The response carries the link the shopper must be sent to.
///
/// If the provider cannot be reached, the order is kept and its id is reported in the error. Calling this route again
/// with `orderId` set opens a fresh session for that order instead of creating a new one.
pub async fn initialize_payment<B, G>(
    claims: JwtClaims,
    body: web::Json<InitializePaymentRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let JwtClaims { user_id, email, .. } = claims;
    debug!("💻️ POST initialize_payment for {user_id}");
    let result = match request.order_id {
        Some(order_id) => api.retry_payment(&user_id, order_id, request.email.or(email)).await,
        None => api.checkout(&user_id, request.into_checkout_request(email)).await,
    }
    .map_err(|e| {
        debug!("💻️ Could not initialize payment for {user_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(InitializePaymentResponse::from(result)))
}

route!(verify_payment => Post "/payments/verify" impl SettlementManagement, PaymentGateway);
/// Route handler for `POST /payments/verify`.
///
/// Clients call this when the provider redirects the shopper back, forwarding the `transaction_id` and `tx_ref`
/// query parameters. The provider is asked for the transaction's state and the outcome is applied to the order.
/// Calling it any number of times, before or after the webhook, is safe.
pub async fn verify_payment<B, G>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementManagement,
    G: PaymentGateway,
{
    let VerifyPaymentRequest { transaction_id, tx_ref } = body.into_inner();
    debug!("💻️ POST verify_payment for transaction {transaction_id}");
    let settlement = api.verify_payment(&transaction_id, tx_ref.as_deref()).await.map_err(|e| {
        debug!("💻️ Could not verify transaction {transaction_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(VerifyPaymentResponse::from(settlement)))
}

route!(payment_webhook => Post "/payments/webhook" impl SettlementManagement, PayoutManagement, PaymentGateway, PayoutGateway);
/// Route handler for `POST /payments/webhook`.
///
/// The provider calls this for both charge and transfer events. The signature header is checked before anything
/// else; an invalid signature gets 401 and nothing is read from or written to the database. Redelivered events are
/// acknowledged with 200 and change nothing.
pub async fn payment_webhook<BS, BP, GC, GT>(
    req: HttpRequest,
    body: web::Bytes,
    settlement_api: web::Data<ReconciliationApi<BS, GC>>,
    payout_api: web::Data<PayoutApi<BP, GT>>,
) -> Result<HttpResponse, ServerError>
where
    BS: SettlementManagement,
    BP: PayoutManagement,
    GC: PaymentGateway,
    GT: PayoutGateway,
{
    trace!("💻️ Received webhook call ({} bytes)", body.len());
    let signature =
        WEBHOOK_SIGNATURE_HEADERS.iter().find_map(|h| req.headers().get(*h)).and_then(|v| v.to_str().ok());
    let event = settlement_api.authenticate_webhook(body.as_ref(), signature)?;
    let response = match event {
        WebhookEvent::Charge(outcome) => {
            info!("💻️ Charge notification for {} ({})", outcome.reference, outcome.reported_status);
            match settlement_api.apply_payment_outcome(outcome).await? {
                Settlement::Applied(order) => {
                    JsonResponse::success(format!("Order {} is now {}", order.order_number, order.payment_status))
                },
                Settlement::AlreadySettled(order) => {
                    JsonResponse::success(format!("Order {} was already settled", order.order_number))
                },
                Settlement::Pending(order) => {
                    JsonResponse::success(format!("Order {} is still pending", order.order_number))
                },
            }
        },
        WebhookEvent::Transfer(outcome) => {
            info!("💻️ Transfer notification for {} ({})", outcome.reference, outcome.reported_status);
            match payout_api.apply_payout_outcome(outcome).await? {
                PayoutSettlement::Applied(p) => {
                    JsonResponse::success(format!("Payout {} is now {}", p.reference, p.status))
                },
                PayoutSettlement::AlreadySettled(p) => {
                    JsonResponse::success(format!("Payout {} was already settled", p.reference))
                },
                PayoutSettlement::Pending(p) => JsonResponse::success(format!("Payout {} is still pending", p.reference)),
            }
        },
        WebhookEvent::Ignored(event_type) => {
            debug!("💻️ Ignoring webhook event '{event_type}'");
            JsonResponse::success(format!("Event {event_type} ignored"))
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/orders/{order_id}" impl CheckoutManagement, PaymentGateway where requires [Role::Shopper]);
/// Route handler for `GET /orders/{order_id}`.
///
/// Shoppers can only read their own orders. Anyone else's order id is reported as not found, whether it exists or not.
pub async fn order_by_id<B, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for {}", claims.user_id);
    let order = api.fetch_order_for_shopper(&claims.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(OrderDetails::from(order)))
}

//----------------------------------------------   Seller wallet  ----------------------------------------------------
route!(wallet_summary => Get "/seller/wallet/summary" impl PayoutManagement, PayoutGateway where requires [Role::Seller]);
pub async fn wallet_summary<B, G>(
    claims: JwtClaims,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    G: PayoutGateway,
{
    debug!("💻️ GET wallet_summary for {}", claims.user_id);
    let summary = api.wallet_summary(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(WalletSummaryResponse::from(summary)))
}

route!(withdraw => Post "/seller/wallet/withdraw" impl PayoutManagement, PayoutGateway where requires [Role::Seller]);
/// Route handler for `POST /seller/wallet/withdraw`.
///
/// Amounts are in minor units. On success the payout is `PROCESSING` at the provider; the final outcome arrives via
/// the webhook (or the payout poller) and is reflected in `GET /seller/wallet/payouts`.
pub async fn withdraw<B, G>(
    claims: JwtClaims,
    body: web::Json<WithdrawRequest>,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    G: PayoutGateway,
{
    let request = body.into_inner();
    info!("💻️ POST withdraw of {} for {}", request.amount, claims.user_id);
    let payout = api.request_withdrawal(&claims.user_id, request.into()).await.map_err(|e| {
        info!("💻️ Withdrawal for {} was not granted. {e}", claims.user_id);
        e
    })?;
    Ok(HttpResponse::Ok().json(WithdrawResponse::from(&payout)))
}

route!(payout_history => Get "/seller/wallet/payouts" impl PayoutManagement, PayoutGateway where requires [Role::Seller]);
pub async fn payout_history<B, G>(
    claims: JwtClaims,
    api: web::Data<PayoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PayoutManagement,
    G: PayoutGateway,
{
    debug!("💻️ GET payout_history for {}", claims.user_id);
    let payouts = api.payout_history(&claims.user_id).await?;
    let payouts = payouts.into_iter().map(PayoutView::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(payouts))
}
