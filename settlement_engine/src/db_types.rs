//! Data types that map directly onto rows in the settlement database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Generates `Display`, `FromStr` and a lenient `From<String>` for a database enum whose variants are stored as
/// SCREAMING_SNAKE_CASE text.
macro_rules! db_enum_strings {
    ($ty:ident, $fallback:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{} is not a valid {}", s, stringify!($ty)))),
                }
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!("Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($ty), stringify!($fallback));
                    Self::$fallback
                })
            }
        }
    };
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created and is awaiting a payment outcome.
    Pending,
    /// Payment completed. Terminal as far as settlement is concerned.
    Confirmed,
    /// Payment failed. Terminal.
    Cancelled,
}

db_enum_strings!(OrderStatusType, Pending, {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Cancelled => "CANCELLED",
});

//--------------------------------------  PaymentStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatusType {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The order status that accompanies this payment status. Orders only ever sit in one of the three
    /// `(status, payment_status)` pairs.
    pub fn order_status(&self) -> OrderStatusType {
        match self {
            Self::Pending => OrderStatusType::Pending,
            Self::Completed => OrderStatusType::Confirmed,
            Self::Failed => OrderStatusType::Cancelled,
        }
    }
}

db_enum_strings!(PaymentStatusType, Pending, {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Failed => "FAILED",
});

//--------------------------------------   PayoutStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatusType {
    /// Funds are reserved, but the provider has not acknowledged the transfer yet.
    Pending,
    /// The provider accepted the transfer.
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PayoutStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

db_enum_strings!(PayoutStatusType, Pending, {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Completed => "COMPLETED",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
});

//--------------------------------------     PayoutMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutMethod {
    BankTransfer,
    MobileMoney,
}

db_enum_strings!(PayoutMethod, BankTransfer, {
    BankTransfer => "BANK_TRANSFER",
    MobileMoney => "MOBILE_MONEY",
});

//--------------------------------------    AccountDetails     ---------------------------------------------------------
/// Destination for a payout. Which fields are required depends on the [`PayoutMethod`]:
/// * bank transfer: `bank_code`, `account_number`, `account_name`
/// * mobile money: `network`, `phone_number`, `account_name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub account_name: String,
}

impl AccountDetails {
    pub fn bank(bank_code: &str, account_number: &str, account_name: &str) -> Self {
        Self {
            bank_code: Some(bank_code.to_string()),
            account_number: Some(account_number.to_string()),
            account_name: account_name.to_string(),
            ..Default::default()
        }
    }

    pub fn mobile_money(network: &str, phone_number: &str, account_name: &str) -> Self {
        Self {
            network: Some(network.to_string()),
            phone_number: Some(phone_number.to_string()),
            account_name: account_name.to_string(),
            ..Default::default()
        }
    }
}

//--------------------------------------        Seller         ---------------------------------------------------------
/// The revenue ledger aggregate for a seller.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    pub total_revenue: MinorUnits,
    pub total_sales: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Product         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub price: MinorUnits,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub price: MinorUnits,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(id: S, seller_id: S, name: S, price: MinorUnits, stock: i64) -> Self {
        Self { id: id.into(), seller_id: seller_id.into(), name: name.into(), price, stock }
    }
}

//--------------------------------------       CartItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub shopper_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub shopper_id: String,
    pub seller_id: String,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub payment_reference: String,
    pub payment_method: String,
    pub payment_url: Option<String>,
    pub delivery_address: String,
    pub phone: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl OrderItem {
    pub fn line_total(&self) -> MinorUnits {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    /// The product price at the moment the order was priced.
    pub unit_price: MinorUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub payment_reference: String,
    pub shopper_id: String,
    pub seller_id: String,
    pub items: Vec<NewOrderItem>,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_method: String,
    pub delivery_address: String,
    pub phone: Option<String>,
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub seller_id: String,
    pub order_id: i64,
    pub amount: MinorUnits,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Payout         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub reference: String,
    pub seller_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub method: PayoutMethod,
    pub account_details: Json<AccountDetails>,
    pub narration: Option<String>,
    pub status: PayoutStatusType,
    pub external_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayout {
    pub reference: String,
    pub seller_id: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub method: PayoutMethod,
    pub account_details: AccountDetails,
    pub narration: Option<String>,
}
