//! Message classification and batch filters
//!
//! `is_transaction_message` decides whether a raw SMS is worth extracting.
//! The remaining helpers narrow, sort and de-duplicate message batches before
//! they reach the extractors.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::RawMessage;
use crate::patterns::{CURRENCY_MARKERS, FINANCIAL_SENDERS, PAYMENT_KEYWORDS, TRANSACTION_KEYWORDS};

/// Bucket width for raw-message de-duplication (5 minutes)
const MESSAGE_BUCKET_MS: i64 = 5 * 60 * 1000;

/// Sender contains a known bank, payment app, card or merchant token
pub fn is_financial_sender(sender: &str) -> bool {
    let sender = sender.to_uppercase();
    FINANCIAL_SENDERS.iter().any(|token| sender.contains(token))
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a message body/sender pair as a financial transaction
pub fn is_transaction(sender: &str, body: &str) -> bool {
    if is_financial_sender(sender) {
        return true;
    }

    let body = body.to_lowercase();
    let transaction_kw = contains_any(&body, TRANSACTION_KEYWORDS);
    let currency_kw = contains_any(&body, CURRENCY_MARKERS);
    let payment_kw = contains_any(&body, PAYMENT_KEYWORDS);

    (transaction_kw && currency_kw) || (payment_kw && currency_kw) || (transaction_kw && payment_kw)
}

pub fn is_transaction_message(message: &RawMessage) -> bool {
    is_transaction(&message.sender, &message.body)
}

pub fn filter_transaction_messages(messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages.into_iter().filter(is_transaction_message).collect()
}

/// Keep messages received within `[start_ms, end_ms]`
pub fn filter_by_date_range(messages: Vec<RawMessage>, start_ms: i64, end_ms: i64) -> Vec<RawMessage> {
    messages
        .into_iter()
        .filter(|m| m.received_at >= start_ms && m.received_at <= end_ms)
        .collect()
}

/// Keep messages whose sender contains any of `senders` (case-insensitive)
pub fn filter_by_senders(messages: Vec<RawMessage>, senders: &[String]) -> Vec<RawMessage> {
    let wanted: Vec<String> = senders.iter().map(|s| s.trim().to_uppercase()).collect();
    messages
        .into_iter()
        .filter(|m| {
            let sender = m.normalized_sender();
            wanted.iter().any(|w| !w.is_empty() && sender.contains(w.as_str()))
        })
        .collect()
}

pub fn inbox_only(messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages.into_iter().filter(RawMessage::is_inbox).collect()
}

/// Newest first
pub fn sort_by_date_desc(mut messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    messages
}

/// Drop repeats of the same body from the same sender within a 5-minute bucket.
///
/// Carriers occasionally deliver an SMS twice; the first copy in input order wins.
pub fn remove_duplicate_messages(messages: Vec<RawMessage>) -> Vec<RawMessage> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| {
            let key = (
                m.normalized_sender(),
                body_digest(&m.body),
                m.received_at.div_euclid(MESSAGE_BUCKET_MS),
            );
            seen.insert(key)
        })
        .collect()
}

fn body_digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.trim().as_bytes()))
}

/// SHA-256 fingerprint of one delivered message, stored as `sms_hash`
pub fn message_fingerprint(sender: &str, body: &str, date_time: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sender.trim().to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(body.as_bytes());
    hasher.update(b"\n");
    hasher.update(date_time.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i64, sender: &str, body: &str, at: i64) -> RawMessage {
        RawMessage::new(id, sender, body, at)
    }

    #[test]
    fn test_financial_sender_substring() {
        assert!(is_financial_sender("VM-HDFCBK"));
        assert!(is_financial_sender("gpay"));
        assert!(is_financial_sender("AD-ZOMATO"));
        assert!(!is_financial_sender("+919876543210"));
        assert!(!is_financial_sender("MOM"));
    }

    #[test]
    fn test_otp_from_financial_sender_is_transaction() {
        assert!(is_transaction(
            "AMAZON",
            "Your OTP for login is 123456. Do not share with anyone."
        ));
    }

    #[test]
    fn test_keyword_rules() {
        // transaction + currency
        assert!(is_transaction("+911234567890", "Rs. 200 debited from your a/c"));
        // payment + currency
        assert!(is_transaction("UNKNOWN", "UPI of INR 50 done"));
        // transaction + payment
        assert!(is_transaction("UNKNOWN", "Payment via upi successful"));
        // none alone is enough
        assert!(!is_transaction("FRIEND", "Lunch at 1? I paid last time"));
        assert!(!is_transaction("FRIEND", "See you soon"));
    }

    #[test]
    fn test_filter_by_date_range_inclusive() {
        let messages = vec![msg(1, "A", "x", 100), msg(2, "A", "x", 200), msg(3, "A", "x", 300)];
        let ids: Vec<i64> = filter_by_date_range(messages, 100, 200).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_filter_by_senders() {
        let messages = vec![msg(1, "VM-HDFCBK", "x", 0), msg(2, "GPAY", "x", 0), msg(3, "ICICI", "x", 0)];
        let ids: Vec<i64> = filter_by_senders(messages, &["hdfc".to_string(), "gpay".to_string()])
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_remove_duplicate_messages_buckets() {
        let body = "Rs.500 debited at ZOMATO";
        let messages = vec![
            msg(1, "HDFCBK", body, 1_000),
            msg(2, "hdfcbk", body, 2_000),
            msg(3, "HDFCBK", body, MESSAGE_BUCKET_MS + 1_000),
            msg(4, "SBI", body, 1_000),
        ];
        let ids: Vec<i64> = remove_duplicate_messages(messages).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_sort_by_date_desc() {
        let messages = vec![msg(1, "A", "x", 10), msg(2, "A", "x", 30), msg(3, "A", "x", 20)];
        let ids: Vec<i64> = sort_by_date_desc(messages).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_inbox_only() {
        let mut sent = msg(2, "A", "x", 0);
        sent.folder = crate::models::MessageFolder::Sent;
        let ids: Vec<i64> = inbox_only(vec![msg(1, "A", "x", 0), sent]).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_fingerprint_stable_and_distinct() {
        let a = message_fingerprint("HDFCBK", "body", 1);
        assert_eq!(a, message_fingerprint("hdfcbk ", "body", 1));
        assert_eq!(a.len(), 64);
        assert_ne!(a, message_fingerprint("HDFCBK", "body", 2));
        assert_ne!(a, message_fingerprint("HDFCBK", "body!", 1));
    }
}
