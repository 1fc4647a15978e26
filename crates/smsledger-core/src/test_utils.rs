//! Test utilities for smsledger-core
//!
//! Builders for messages and transactions, plus a few real-world message
//! bodies, shared by unit and integration tests.

use chrono::Utc;

use crate::models::{ParsedTransaction, PaymentMethod, PersistedTransaction, RawMessage};

/// HDFC card debit at a merchant
pub const HDFC_DEBIT: &str = "Rs.500 debited from account ending 1234 at ZOMATO on 15-Jan-24";

/// Google Pay payment to a merchant with a UPI reference
pub const GPAY_PAYMENT: &str = "₹150 paid to SWIGGY via UPI Ref: 123456789012";

/// SBI UPI payment to a VPA
pub const SBI_UPI: &str = "Rs 250.00 debited from A/c XX5678 to VPA cafe@okaxis on 01-02-24";

/// One-time password message that must never be treated as a transaction
pub const OTP: &str = "Your OTP for login is 123456. Do not share with anyone.";

/// An inbox message
pub fn message(id: i64, sender: &str, body: &str, received_at: i64) -> RawMessage {
    RawMessage::new(id, sender, body, received_at)
}

/// A parsed transaction with a body unique to its amount and counterparty
pub fn parsed_transaction(
    amount: f64,
    merchant_name: Option<&str>,
    recipient: Option<&str>,
    date_time: i64,
) -> ParsedTransaction {
    let counterparty = merchant_name.or(recipient).unwrap_or("someone");
    ParsedTransaction {
        amount,
        recipient: recipient.map(String::from),
        merchant_name: merchant_name.map(String::from),
        transaction_id: None,
        payment_method: PaymentMethod::Upi,
        date_time,
        sms_content: format!("₹{} paid to {}", amount, counterparty),
        sender: "TEST".to_string(),
        confidence: 0.9,
    }
}

/// A stored, uncategorized transaction
pub fn persisted_transaction(
    id: i64,
    amount: f64,
    merchant_name: Option<&str>,
    recipient: Option<&str>,
    date_time: i64,
) -> PersistedTransaction {
    let now = Utc::now();
    PersistedTransaction {
        id,
        amount,
        recipient: recipient.map(String::from),
        merchant_name: merchant_name.map(String::from),
        date_time,
        transaction_id: None,
        payment_method: PaymentMethod::Upi,
        category: None,
        notes: None,
        categorized: false,
        sms_content: format!("₹{} paid", amount),
        created_at: now,
        updated_at: now,
    }
}
