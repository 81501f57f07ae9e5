use std::time::Duration;

use log::*;
use settlement_engine::{traits::PayoutSettlement, PayoutApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::flutterwave::FlutterwaveGateway;

/// Starts the payout poller, which asks the provider about every `PROCESSING` payout once per `interval` and applies
/// whatever has resolved. Transfer webhooks remain the primary channel; this catches the ones that never arrive.
///
/// Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_payout_poller(api: PayoutApi<SqliteDatabase, FlutterwaveGateway>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick completes immediately. Give the server a moment to come up before polling.
        timer.tick().await;
        info!("🕰️ Payout poller started. Polling every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running payout poll");
            match api.refresh_processing_payouts().await {
                Ok(results) => {
                    let resolved = results.iter().filter(|r| matches!(r, PayoutSettlement::Applied(_))).count();
                    if resolved > 0 {
                        info!("🕰️ {resolved} payouts resolved by polling: {}", payout_list(&results));
                    } else {
                        trace!("🕰️ {} processing payouts, none resolved", results.len());
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running payout poll: {e}");
                },
            }
        }
    })
}

fn payout_list(results: &[PayoutSettlement]) -> String {
    results
        .iter()
        .filter(|r| r.was_applied())
        .map(|r| {
            let p = r.payout();
            format!("[{}] {}", p.reference, p.status)
        })
        .collect::<Vec<String>>()
        .join(", ")
}
