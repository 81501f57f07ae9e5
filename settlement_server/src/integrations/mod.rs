pub mod flutterwave;
pub mod notifications;
