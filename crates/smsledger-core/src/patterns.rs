//! Keyword sets and regular expressions shared by the classifier and extractors
//!
//! Every regex here is compiled at most once per process, on first use, and is
//! never mutated afterwards, so the registry is safe to share across threads.

use std::sync::LazyLock;

use regex::Regex;

/// Rupee amount: digits with optional thousands commas and two decimals
pub const AMOUNT: &str = r"\d+(?:,\d+)*(?:\.\d{2})?";

/// Sender tokens of banks, payment apps, card issuers and large merchants
pub const FINANCIAL_SENDERS: &[&str] = &[
    // Banks
    "HDFC", "SBI", "ICICI", "AXIS", "KOTAK", "PNB", "BOB", "CANARA", "UNION", "INDIAN", "FEDERAL",
    // Payment apps
    "GPAY", "GOOGLEPAY", "PHONEPE", "PAYTM", "AMAZONPAY", "MOBIKWIK", "FREECHARGE", "PAYPAL",
    "BHIM", "WHATSAPP",
    // Credit cards
    "AMEX", "CITI", "HSBC", "STANCHART", "YESBANK",
    // Commerce
    "AMAZON", "FLIPKART", "ZOMATO", "SWIGGY", "UBER", "OLA",
];

pub const TRANSACTION_KEYWORDS: &[&str] = &[
    "paid", "debited", "sent", "transferred", "credited", "received", "transaction", "payment",
    "purchase", "spent", "withdrawn", "refund", "cashback", "reward", "balance", "amount",
];

pub const CURRENCY_MARKERS: &[&str] = &["₹", "rs.", "rs ", "inr", "rupees"];

pub const PAYMENT_KEYWORDS: &[&str] = &[
    "upi",
    "gpay",
    "phonepe",
    "paytm",
    "bhim",
    "whatsapp pay",
    "debit card",
    "credit card",
    "net banking",
    "wallet",
    "ref no",
    "reference",
    "txn",
    "transaction id",
];

/// Tokens that look like merchant names in bank templates but never are
pub const MERCHANT_STOP_WORDS: &[&str] = &[
    "ACCOUNT",
    "CARD",
    "BANK",
    "PAYMENT",
    "TRANSACTION",
    "TRANSFER",
    "DEBIT",
    "CREDIT",
    "BALANCE",
    "AMOUNT",
    "RUPEES",
    "INR",
    "RS",
];

pub const MIN_MERCHANT_LEN: usize = 3;
pub const MAX_MERCHANT_LEN: usize = 20;

/// Local part and domain of a virtual payment address
const VPA: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Tried in order; the first capture is the amount
pub static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)₹\s*({})", AMOUNT),
        format!(r"(?i)rs\.?\s*({})", AMOUNT),
        format!(r"(?i)inr\s*({})", AMOUNT),
        format!(r"(?i)rupees\s*({})", AMOUNT),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub static VPA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"({})", VPA),
        format!(r"(?i)\bto\s+({})", VPA),
        format!(r"(?i)\bpaid\s+to\s+({})", VPA),
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b([6-9]\d{9})\b",
        r"(?i)\bto\s+(\d{10})",
        r"(?i)\bpaid\s+to\s+(\d{10})",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// Case-sensitive: merchants are written in capitals by the issuers
pub static MERCHANT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bat\s+([A-Z][A-Z0-9\s]{2,20})",
        r"\bto\s+([A-Z][A-Z0-9\s]{2,20})(?:\s+on|\s+at|\s*$)",
        r"\bpaid\s+to\s+([A-Z][A-Z0-9\s]{2,20})",
        r"\bspent\s+at\s+([A-Z][A-Z0-9\s]{2,20})",
        r"\bpurchase\s+at\s+([A-Z][A-Z0-9\s]{2,20})",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

pub static REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bref\s*:?\s*([A-Z0-9]{8,20})",
        r"(?i)\breference\s*:?\s*([A-Z0-9]{8,20})",
        r"(?i)\btxn\s*:?\s*([A-Z0-9]{8,20})",
        r"(?i)\btransaction\s+id\s*:?\s*([A-Z0-9]{8,20})",
        r"(?i)\bupi\s+ref\s*:?\s*([A-Z0-9]{8,20})",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

/// First capture of the first pattern that matches
pub fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// Parse an amount capture, dropping thousands separators
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").trim().parse::<f64>().ok()
}
