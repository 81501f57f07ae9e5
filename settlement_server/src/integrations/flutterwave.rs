//! Implements the engine's [`PaymentGateway`] and [`PayoutGateway`] on top of the Flutterwave client.
//!
//! All translation between the engine's provider-neutral types and Flutterwave's request and response shapes lives
//! here, including minor/major unit conversion. Nothing in this module touches order or payout state.
use flutterwave_tools::{
    major_amount,
    minor_amount,
    ChargeCustomer,
    ChargeCustomizations,
    FlutterwaveApi,
    FlutterwaveApiError,
    NewCharge,
    NewTransfer,
    Transaction,
    Transfer,
    WebhookData,
    WebhookPayload,
};
use log::*;
use serde_json::json;
use settlement_engine::{
    db_types::{Payout, PayoutMethod},
    traits::{ChargeRequest, ChargeSession, PaymentOutcome, PayoutOutcome, PayoutSubmission, WebhookEvent},
    GatewayError,
    PaymentGateway,
    PayoutGateway,
};

/// Flutterwave insists on a customer email for hosted payments. Shoppers without one on file get an address under
/// this reserved domain.
const PLACEHOLDER_EMAIL_DOMAIN: &str = "customers.invalid";
const CHECKOUT_TITLE: &str = "Marketplace order";

#[derive(Clone)]
pub struct FlutterwaveGateway {
    api: FlutterwaveApi,
    redirect_url: String,
}

impl FlutterwaveGateway {
    pub fn new<S: Into<String>>(api: FlutterwaveApi, redirect_url: S) -> Self {
        Self { api, redirect_url: redirect_url.into() }
    }

    pub fn api(&self) -> &FlutterwaveApi {
        &self.api
    }
}

pub fn to_gateway_error(e: FlutterwaveApiError) -> GatewayError {
    match e {
        FlutterwaveApiError::Timeout => GatewayError::Timeout,
        e if e.is_transient() => GatewayError::Transport(e.to_string()),
        FlutterwaveApiError::QueryError { message, .. } => GatewayError::Rejected(message),
        FlutterwaveApiError::Unsuccessful(message) => GatewayError::Rejected(message),
        e @ (FlutterwaveApiError::JsonError(_) | FlutterwaveApiError::InvalidCurrencyAmount(_)) => {
            GatewayError::InvalidResponse(e.to_string())
        },
        e => GatewayError::Transport(e.to_string()),
    }
}

pub fn new_charge(request: &ChargeRequest, redirect_url: &str) -> NewCharge {
    let email = request
        .customer_email
        .clone()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("{}@{PLACEHOLDER_EMAIL_DOMAIN}", request.customer_id));
    let payment_options = Some(request.payment_method.trim().to_lowercase()).filter(|p| !p.is_empty());
    NewCharge {
        tx_ref: request.reference.clone(),
        amount: major_amount(request.amount),
        currency: request.currency.clone(),
        redirect_url: redirect_url.to_string(),
        customer: ChargeCustomer { email, phonenumber: request.customer_phone.clone(), name: None },
        customizations: ChargeCustomizations {
            title: CHECKOUT_TITLE.to_string(),
            description: request.description.clone(),
        },
        payment_options,
        meta: Some(json!({ "customer_id": request.customer_id })),
    }
}

pub fn payment_outcome(tx: Transaction) -> Result<PaymentOutcome, GatewayError> {
    let amount = minor_amount(tx.amount).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    Ok(PaymentOutcome {
        reference: tx.tx_ref,
        transaction_id: tx.id.to_string(),
        amount,
        currency: tx.currency,
        reported_status: tx.status,
    })
}

pub fn payout_outcome(transfer: Transfer) -> PayoutOutcome {
    PayoutOutcome {
        reference: transfer.reference,
        external_id: Some(transfer.id.to_string()),
        reported_status: transfer.status,
        message: transfer.complete_message,
    }
}

pub fn new_transfer(payout: &Payout) -> Result<NewTransfer, GatewayError> {
    let details = &payout.account_details.0;
    let missing = |field: &str| GatewayError::Rejected(format!("Payout {} has no {field}", payout.reference));
    let (account_bank, account_number) = match payout.method {
        PayoutMethod::BankTransfer => (
            details.bank_code.clone().ok_or_else(|| missing("bank code"))?,
            details.account_number.clone().ok_or_else(|| missing("account number"))?,
        ),
        PayoutMethod::MobileMoney => (
            details.network.clone().ok_or_else(|| missing("network"))?,
            details.phone_number.clone().ok_or_else(|| missing("phone number"))?,
        ),
    };
    Ok(NewTransfer {
        account_bank,
        account_number,
        amount: major_amount(payout.amount),
        currency: payout.currency.clone(),
        reference: payout.reference.clone(),
        narration: payout.narration.clone(),
        beneficiary_name: Some(details.account_name.clone()),
        callback_url: None,
    })
}

impl PaymentGateway for FlutterwaveGateway {
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeSession, GatewayError> {
        let charge = new_charge(request, &self.redirect_url);
        let link = self.api.initialize_charge(&charge).await.map_err(to_gateway_error)?;
        Ok(ChargeSession { payment_url: link.link, reference: charge.tx_ref })
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentOutcome, GatewayError> {
        let tx = self.api.verify_transaction(transaction_id).await.map_err(to_gateway_error)?;
        payment_outcome(tx)
    }

    fn validate_webhook_signature(&self, raw_body: &[u8], signature: &str) -> bool {
        self.api.validate_webhook(raw_body, signature)
    }

    fn parse_webhook(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
        let payload = WebhookPayload::from_slice(raw_body).map_err(to_gateway_error)?;
        match payload.decode().map_err(to_gateway_error)? {
            WebhookData::Charge(tx) => payment_outcome(tx).map(WebhookEvent::Charge),
            WebhookData::Transfer(transfer) => Ok(WebhookEvent::Transfer(payout_outcome(transfer))),
            WebhookData::Other(event) => Ok(WebhookEvent::Ignored(event)),
        }
    }
}

impl PayoutGateway for FlutterwaveGateway {
    async fn submit_payout(&self, payout: &Payout) -> Result<PayoutSubmission, GatewayError> {
        let transfer = new_transfer(payout)?;
        let result = self.api.create_transfer(&transfer).await.map_err(to_gateway_error)?;
        Ok(PayoutSubmission { external_id: result.id.to_string(), reported_status: result.status })
    }

    async fn fetch_payout_outcome(&self, payout: &Payout) -> Result<PayoutOutcome, GatewayError> {
        let id = payout
            .external_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or_else(|| {
                warn!("💸️ Payout {} has no Flutterwave transfer id. It cannot be polled.", payout.reference);
                GatewayError::InvalidResponse(format!("Payout {} has no transfer id", payout.reference))
            })?;
        let transfer = self.api.fetch_transfer(id).await.map_err(to_gateway_error)?;
        Ok(payout_outcome(transfer))
    }
}
