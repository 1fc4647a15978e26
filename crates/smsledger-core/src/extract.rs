//! Generic field extraction from SMS bodies
//!
//! Used for senders without an issuer template, and as the fallback when an
//! issuer template does not match. Every extractor returns `None` on failure;
//! only a missing amount makes the whole extraction fail.

use crate::models::{ParsedTransaction, PaymentMethod, RawMessage};
use crate::patterns::{
    first_capture, parse_amount, AMOUNT_PATTERNS, MERCHANT_PATTERNS, MERCHANT_STOP_WORDS,
    MAX_MERCHANT_LEN, MIN_MERCHANT_LEN, PHONE_PATTERNS, REFERENCE_PATTERNS, VPA_PATTERNS,
};

/// Confidence before any field is credited, in tenths
const BASE_POINTS: u32 = 5;

pub fn extract_amount(body: &str) -> Option<f64> {
    first_capture(&AMOUNT_PATTERNS, body).and_then(|raw| parse_amount(&raw))
}

/// VPA if present, otherwise a mobile number
pub fn extract_recipient(body: &str) -> Option<String> {
    first_capture(&VPA_PATTERNS, body)
        .map(|vpa| vpa.trim_end_matches('.').to_string())
        .filter(|vpa| !vpa.is_empty())
        .or_else(|| first_capture(&PHONE_PATTERNS, body))
}

/// First merchant candidate that survives the stop-word filter
pub fn extract_merchant(body: &str) -> Option<String> {
    MERCHANT_PATTERNS.iter().find_map(|re| {
        re.captures(body)
            .and_then(|caps| caps.get(1))
            .and_then(|m| valid_merchant_name(m.as_str()))
    })
}

/// Trimmed name, or `None` if its length is out of range or it contains a stop word
pub fn valid_merchant_name(candidate: &str) -> Option<String> {
    let name = candidate.trim();
    let upper = name.to_uppercase();
    let len = upper.chars().count();
    if !(MIN_MERCHANT_LEN..=MAX_MERCHANT_LEN).contains(&len)
        || MERCHANT_STOP_WORDS.iter().any(|w| upper.contains(w))
    {
        return None;
    }
    Some(name.to_string())
}

pub fn is_valid_merchant_name(candidate: &str) -> bool {
    valid_merchant_name(candidate).is_some()
}

pub fn extract_reference(body: &str) -> Option<String> {
    first_capture(&REFERENCE_PATTERNS, body)
}

/// Infer the payment instrument from body keywords; first rule that hits wins
pub fn infer_payment_method(body: &str) -> PaymentMethod {
    let body = body.to_lowercase();
    if body.contains("upi") {
        PaymentMethod::Upi
    } else if body.contains("credit") {
        PaymentMethod::CreditCard
    } else if body.contains("debit") || body.contains("card") {
        PaymentMethod::DebitCard
    } else if body.contains("net banking") || body.contains("online") {
        PaymentMethod::NetBanking
    } else if body.contains("wallet") || body.contains("prepaid") {
        PaymentMethod::Wallet
    } else {
        PaymentMethod::Other
    }
}

/// Score an extraction.
///
/// Computed in whole tenths so that equal field sets always produce the exact
/// same value (0.7 + 0.1 is not 0.8 in binary floating point).
pub fn confidence(
    amount: f64,
    recipient: Option<&str>,
    merchant: Option<&str>,
    transaction_id: Option<&str>,
    method: PaymentMethod,
) -> f64 {
    let has_recipient = recipient.is_some_and(|r| !r.trim().is_empty());
    let has_merchant = merchant.is_some_and(|m| !m.trim().is_empty());

    let mut points = BASE_POINTS;
    if amount > 0.0 {
        points += 2;
    }
    if has_recipient || has_merchant {
        points += 2;
    }
    if transaction_id.is_some_and(|t| !t.trim().is_empty()) {
        points += 1;
    }
    if method != PaymentMethod::Other {
        points += 1;
    }
    if has_recipient && has_merchant {
        points += 1;
    }

    f64::from(points.min(10)) / 10.0
}

/// Run every generic extractor over a message body.
///
/// Returns `None` only when no amount can be found; the validity gate is
/// applied by the caller.
pub fn extract_generic(message: &RawMessage) -> Option<ParsedTransaction> {
    let body = message.body.as_str();
    let amount = extract_amount(body)?;
    let recipient = extract_recipient(body);
    let merchant_name = extract_merchant(body);
    let transaction_id = extract_reference(body);
    let payment_method = infer_payment_method(body);

    let confidence = confidence(
        amount,
        recipient.as_deref(),
        merchant_name.as_deref(),
        transaction_id.as_deref(),
        payment_method,
    );

    Some(ParsedTransaction {
        amount,
        recipient,
        merchant_name,
        transaction_id,
        payment_method,
        date_time: message.received_at,
        sms_content: message.body.clone(),
        sender: message.sender.clone(),
        confidence,
    })
}
