use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use flutterwave_tools::FlutterwaveApi;
use log::*;
use settlement_engine::{
    events::EventProducers,
    CheckoutApi,
    PayoutApi,
    ReconciliationApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    integrations::{flutterwave::FlutterwaveGateway, notifications::create_notification_handlers},
    middleware::JwtMiddlewareFactory,
    payout_worker::start_payout_poller,
    routes::{
        health,
        InitializePaymentRoute,
        OrderByIdRoute,
        PaymentWebhookRoute,
        PayoutHistoryRoute,
        VerifyPaymentRoute,
        WalletSummaryRoute,
        WithdrawRoute,
    },
};

const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Database at {} is ready", config.database_url);
    if config.flutterwave.secret_key.is_unset() {
        warn!("🪛️ MKT_FLW_SECRET_KEY is not set. Every call to the payment provider will be refused.");
    }
    let api = FlutterwaveApi::new(config.flutterwave.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = FlutterwaveGateway::new(api, config.payment_redirect_url.clone());
    let handlers = create_notification_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    match config.payout_poll_interval {
        Some(interval) => {
            let payout_api =
                PayoutApi::new(db.clone(), gateway.clone(), producers.clone(), config.engine_settings());
            let _handle = start_payout_poller(payout_api, interval);
        },
        None => info!("🕰️ Payout poller is disabled"),
    }
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: FlutterwaveGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let settings = config.engine_settings();
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), settings.clone());
        let reconciliation_api =
            ReconciliationApi::new(db.clone(), gateway.clone(), producers.clone(), settings.clone());
        let payout_api = PayoutApi::new(db.clone(), gateway.clone(), producers.clone(), settings);
        let validator = TokenValidator::new(&config.auth);
        let log_format = if config.use_x_forwarded_for {
            "%t (%D ms) %s %{r}a %{Host}i %U"
        } else {
            "%t (%D ms) %s %a %{Host}i %U"
        };
        let app = App::new()
            .wrap(Logger::new(log_format).log_target("mkt::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(payout_api));
        // Routes that require authentication. This scope matches every path, so it must be registered last.
        let auth_scope = web::scope("")
            .wrap(JwtMiddlewareFactory::new(validator))
            .service(InitializePaymentRoute::<SqliteDatabase, FlutterwaveGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, FlutterwaveGateway>::new())
            .service(WalletSummaryRoute::<SqliteDatabase, FlutterwaveGateway>::new())
            .service(WithdrawRoute::<SqliteDatabase, FlutterwaveGateway>::new())
            .service(PayoutHistoryRoute::<SqliteDatabase, FlutterwaveGateway>::new());
        app.service(health)
            .service(VerifyPaymentRoute::<SqliteDatabase, FlutterwaveGateway>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase, SqliteDatabase, FlutterwaveGateway, FlutterwaveGateway>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
