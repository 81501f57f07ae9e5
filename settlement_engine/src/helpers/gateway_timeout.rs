use std::{future::Future, time::Duration};

use log::warn;

use crate::traits::GatewayError;

/// Bounds a payment provider call. A call that does not finish within `limit` resolves to [`GatewayError::Timeout`].
pub async fn with_gateway_timeout<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where F: Future<Output = Result<T, GatewayError>> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("💳️ Payment provider call timed out after {}ms", limit.as_millis());
            Err(GatewayError::Timeout)
        },
    }
}
