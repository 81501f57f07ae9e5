use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use crate::{
    db_types::Payout,
    traits::{
        ChargeRequest,
        ChargeSession,
        GatewayError,
        PaymentGateway,
        PaymentOutcome,
        PayoutGateway,
        PayoutOutcome,
        PayoutSubmission,
        WebhookEvent,
    },
};

pub const FAKE_WEBHOOK_SECRET: &str = "fake-webhook-secret";

/// How the fake provider responds to payout submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutBehaviour {
    Accept,
    Reject(String),
    Unreachable,
    /// Sleeps for this long before accepting
    Slow(Duration),
}

#[derive(Debug)]
struct FakeState {
    transactions: HashMap<String, PaymentOutcome>,
    initialize_error: Option<GatewayError>,
    payout_behaviour: PayoutBehaviour,
    transfer_outcomes: HashMap<String, PayoutOutcome>,
    verify_delay: Option<Duration>,
}

/// A scripted stand-in for the payment provider.
///
/// * `verify` answers from the transactions registered with [`FakeGateway::register_transaction`].
/// * Webhook signatures are valid iff they equal [`FAKE_WEBHOOK_SECRET`], and bodies are JSON-encoded
///   [`WebhookEvent`]s.
#[derive(Debug, Clone)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
    initialize_calls: Arc<AtomicUsize>,
    verify_calls: Arc<AtomicUsize>,
    payout_calls: Arc<AtomicUsize>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        let state = FakeState {
            transactions: HashMap::new(),
            initialize_error: None,
            payout_behaviour: PayoutBehaviour::Accept,
            transfer_outcomes: HashMap::new(),
            verify_delay: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            initialize_calls: Arc::new(AtomicUsize::new(0)),
            verify_calls: Arc::new(AtomicUsize::new(0)),
            payout_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_transaction(&self, transaction_id: &str, outcome: PaymentOutcome) {
        self.state.lock().unwrap().transactions.insert(transaction_id.to_string(), outcome);
    }

    /// The outcome registered for `transaction_id`, without counting as a verify call.
    pub fn verify_registered(&self, transaction_id: &str) -> Option<PaymentOutcome> {
        self.state.lock().unwrap().transactions.get(transaction_id).cloned()
    }

    pub fn fail_initialize_with(&self, error: Option<GatewayError>) {
        self.state.lock().unwrap().initialize_error = error;
    }

    pub fn set_payout_behaviour(&self, behaviour: PayoutBehaviour) {
        self.state.lock().unwrap().payout_behaviour = behaviour;
    }

    pub fn set_transfer_outcome(&self, outcome: PayoutOutcome) {
        self.state.lock().unwrap().transfer_outcomes.insert(outcome.reference.clone(), outcome);
    }

    pub fn set_verify_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().verify_delay = delay;
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn payout_calls(&self) -> usize {
        self.payout_calls.load(Ordering::SeqCst)
    }

    /// Encodes a webhook body the way this fake expects it.
    pub fn webhook_body(event: &WebhookEvent) -> Vec<u8> {
        serde_json::to_vec(event).unwrap()
    }
}

impl PaymentGateway for FakeGateway {
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeSession, GatewayError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        let error = self.state.lock().unwrap().initialize_error.clone();
        match error {
            Some(e) => Err(e),
            None => Ok(ChargeSession {
                payment_url: format!("https://pay.example.com/checkout/{}", request.reference),
                reference: request.reference.clone(),
            }),
        }
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentOutcome, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let (outcome, delay) = {
            let state = self.state.lock().unwrap();
            (state.transactions.get(transaction_id).cloned(), state.verify_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome.ok_or_else(|| GatewayError::Rejected(format!("No transaction was found for id {transaction_id}")))
    }

    fn validate_webhook_signature(&self, _raw_body: &[u8], signature: &str) -> bool {
        signature == FAKE_WEBHOOK_SECRET
    }

    fn parse_webhook(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
        serde_json::from_slice(raw_body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

impl PayoutGateway for FakeGateway {
    async fn submit_payout(&self, payout: &Payout) -> Result<PayoutSubmission, GatewayError> {
        self.payout_calls.fetch_add(1, Ordering::SeqCst);
        let behaviour = self.state.lock().unwrap().payout_behaviour.clone();
        let accepted = PayoutSubmission { external_id: format!("TRF-{}", payout.id), reported_status: "NEW".into() };
        match behaviour {
            PayoutBehaviour::Accept => Ok(accepted),
            PayoutBehaviour::Reject(reason) => Err(GatewayError::Rejected(reason)),
            PayoutBehaviour::Unreachable => Err(GatewayError::Transport("connection refused".into())),
            PayoutBehaviour::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(accepted)
            },
        }
    }

    async fn fetch_payout_outcome(&self, payout: &Payout) -> Result<PayoutOutcome, GatewayError> {
        let outcome = self.state.lock().unwrap().transfer_outcomes.get(&payout.reference).cloned();
        Ok(outcome.unwrap_or_else(|| PayoutOutcome {
            reference: payout.reference.clone(),
            external_id: payout.external_id.clone(),
            reported_status: "PENDING".into(),
            message: None,
        }))
    }
}
