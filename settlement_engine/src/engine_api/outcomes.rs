//! Translation of the provider's status vocabulary into settlement outcomes.
use crate::{
    db_types::Order,
    traits::{FailureReason, PaymentOutcome, PayoutSettlementOutcome, SettlementOutcome},
};

/// The three things a provider status can mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedStatus {
    Succeeded,
    Failed,
    /// Pending, processing, or a status we do not recognise.
    Unresolved,
}

pub fn classify_reported_status(status: &str) -> ReportedStatus {
    match status.trim().to_ascii_lowercase().as_str() {
        "successful" | "success" | "succeeded" | "completed" | "paid" => ReportedStatus::Succeeded,
        "failed" | "failure" | "cancelled" | "canceled" | "declined" | "error" | "abandoned" | "reversed" => {
            ReportedStatus::Failed
        },
        _ => ReportedStatus::Unresolved,
    }
}

/// Decides what a reported payment outcome means for a pending order.
///
/// The amount is checked first: a reported amount that differs from the order total fails the order whatever status
/// the provider reports. Then the currency. Only then is the provider status consulted. `None` means the outcome is
/// not final and the order must stay `PENDING`.
pub fn decide_settlement(order: &Order, reported: &PaymentOutcome) -> Option<SettlementOutcome> {
    if reported.amount != order.total {
        let reason = FailureReason::AmountMismatch { expected: order.total, reported: reported.amount };
        return Some(SettlementOutcome::Failed(reason));
    }
    if !reported.currency.eq_ignore_ascii_case(&order.currency) {
        let reason =
            FailureReason::CurrencyMismatch { expected: order.currency.clone(), reported: reported.currency.clone() };
        return Some(SettlementOutcome::Failed(reason));
    }
    match classify_reported_status(&reported.reported_status) {
        ReportedStatus::Succeeded => Some(SettlementOutcome::Completed),
        ReportedStatus::Failed => {
            Some(SettlementOutcome::Failed(FailureReason::Declined(reported.reported_status.clone())))
        },
        ReportedStatus::Unresolved => None,
    }
}

/// Decides what a reported transfer status means for an open payout. `None` leaves the payout where it is.
pub fn decide_payout_settlement(status: &str, message: Option<&str>) -> Option<PayoutSettlementOutcome> {
    match classify_reported_status(status) {
        ReportedStatus::Succeeded => Some(PayoutSettlementOutcome::Completed),
        ReportedStatus::Failed => {
            let reason = message.filter(|m| !m.trim().is_empty()).unwrap_or(status).to_string();
            Some(PayoutSettlementOutcome::Failed(reason))
        },
        ReportedStatus::Unresolved => None,
    }
}
