use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::FlutterwaveConfig,
    data_objects::{FlwResponse, HostedLink, NewCharge, NewTransfer, Transaction, Transfer},
    signature::validate_signature,
    FlutterwaveApiError,
};

#[derive(Clone)]
pub struct FlutterwaveApi {
    config: FlutterwaveConfig,
    client: Arc<Client>,
}

impl FlutterwaveApi {
    pub fn new(config: FlutterwaveConfig) -> Result<Self, FlutterwaveApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val =
            HeaderValue::from_str(&bearer).map_err(|e| FlutterwaveApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlutterwaveApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &FlutterwaveConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v3{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, FlutterwaveApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| FlutterwaveApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await?;
            // Error bodies are usually the standard envelope. Fall back to the raw text when they aren't.
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(text);
            Err(FlutterwaveApiError::QueryError { status, message })
        }
    }

    /// Creates a hosted payment link for the charge.
    pub async fn initialize_charge(&self, charge: &NewCharge) -> Result<HostedLink, FlutterwaveApiError> {
        debug!("Initializing charge {} for {} {}", charge.tx_ref, charge.amount, charge.currency);
        let response =
            self.rest_query::<FlwResponse<HostedLink>, &NewCharge>(Method::POST, "/payments", &[], Some(charge)).await?;
        let link = response.into_data()?;
        info!("Initialized charge {}", charge.tx_ref);
        Ok(link)
    }

    /// Fetches a transaction by Flutterwave's transaction id.
    pub async fn verify_transaction(&self, transaction_id: &str) -> Result<Transaction, FlutterwaveApiError> {
        let path = format!("/transactions/{transaction_id}/verify");
        debug!("Verifying transaction {transaction_id}");
        let response = self.rest_query::<FlwResponse<Transaction>, ()>(Method::GET, &path, &[], None).await?;
        let tx = response.into_data()?;
        debug!("Transaction {transaction_id} ({}) is {}", tx.tx_ref, tx.status);
        Ok(tx)
    }

    pub async fn create_transfer(&self, transfer: &NewTransfer) -> Result<Transfer, FlutterwaveApiError> {
        debug!("Submitting transfer {} of {} {}", transfer.reference, transfer.amount, transfer.currency);
        let response =
            self.rest_query::<FlwResponse<Transfer>, &NewTransfer>(Method::POST, "/transfers", &[], Some(transfer)).await?;
        let result = response.into_data()?;
        info!("Transfer {} accepted as #{} ({})", transfer.reference, result.id, result.status);
        Ok(result)
    }

    pub async fn fetch_transfer(&self, transfer_id: u64) -> Result<Transfer, FlutterwaveApiError> {
        let path = format!("/transfers/{transfer_id}");
        debug!("Fetching transfer #{transfer_id}");
        let response = self.rest_query::<FlwResponse<Transfer>, ()>(Method::GET, &path, &[], None).await?;
        response.into_data()
    }

    /// Checks a webhook signature header against the configured secret and signature mode.
    pub fn validate_webhook(&self, raw_body: &[u8], signature: &str) -> bool {
        validate_signature(self.config.signature_mode, self.config.webhook_secret.reveal(), raw_body, signature)
    }
}
