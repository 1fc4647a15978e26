//! Issuer-specific extraction
//!
//! Banks and payment apps send fixed sentence templates. When the sender
//! names a known issuer its templates are tried first; anything they cannot
//! handle falls through to the generic extractor.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::extract::{extract_generic, infer_payment_method, valid_merchant_name};
use crate::models::{ParsedTransaction, PaymentMethod, RawMessage};
use crate::patterns::{parse_amount, AMOUNT};

pub const BANK_CONFIDENCE: f64 = 0.90;
pub const PAYMENT_APP_CONFIDENCE: f64 = 0.95;

const MIN_REFERENCE_LEN: usize = 8;
const MAX_REFERENCE_LEN: usize = 20;

/// Issuers with dedicated templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssuerKind {
    Hdfc,
    Sbi,
    Icici,
    GPay,
    PhonePe,
    Paytm,
}

impl IssuerKind {
    pub fn all() -> &'static [IssuerKind] {
        &[
            Self::Hdfc,
            Self::Sbi,
            Self::Icici,
            Self::GPay,
            Self::PhonePe,
            Self::Paytm,
        ]
    }

    /// Token searched for in the uppercased sender
    pub fn sender_token(&self) -> &'static str {
        match self {
            Self::Hdfc => "HDFC",
            Self::Sbi => "SBI",
            Self::Icici => "ICICI",
            Self::GPay => "GPAY",
            Self::PhonePe => "PHONEPE",
            Self::Paytm => "PAYTM",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdfc => "hdfc",
            Self::Sbi => "sbi",
            Self::Icici => "icici",
            Self::GPay => "gpay",
            Self::PhonePe => "phonepe",
            Self::Paytm => "paytm",
        }
    }

    /// First issuer whose token occurs in the sender
    pub fn detect(sender: &str) -> Option<Self> {
        let sender = sender.to_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| sender.contains(kind.sender_token()))
    }

    pub fn is_payment_app(&self) -> bool {
        matches!(self, Self::GPay | Self::PhonePe | Self::Paytm)
    }

    pub fn confidence(&self) -> f64 {
        if self.is_payment_app() {
            PAYMENT_APP_CONFIDENCE
        } else {
            BANK_CONFIDENCE
        }
    }

    fn templates(&self) -> &'static [Regex] {
        match self {
            Self::Hdfc => HDFC_TEMPLATES.as_slice(),
            Self::Sbi => SBI_TEMPLATES.as_slice(),
            Self::Icici => ICICI_TEMPLATES.as_slice(),
            Self::GPay => GPAY_TEMPLATES.as_slice(),
            Self::PhonePe => PHONEPE_TEMPLATES.as_slice(),
            Self::Paytm => PAYTM_TEMPLATES.as_slice(),
        }
    }

    fn payment_method(&self, body: &str) -> PaymentMethod {
        if !self.is_payment_app() {
            return infer_payment_method(body);
        }
        if body.to_lowercase().contains("wallet") {
            PaymentMethod::Wallet
        } else {
            PaymentMethod::Upi
        }
    }

    /// Try this issuer's templates in order.
    ///
    /// The first template producing a valid transaction wins. `None` means the
    /// caller should fall back to the generic extractor.
    pub fn extract(&self, message: &RawMessage) -> Option<ParsedTransaction> {
        self.templates()
            .iter()
            .filter_map(|re| re.captures(&message.body))
            .map(|caps| self.parse_captures(&caps, message))
            .find(|parsed| parsed.is_valid())
    }

    fn parse_captures(&self, caps: &Captures<'_>, message: &RawMessage) -> ParsedTransaction {
        let amount = caps
            .name("amount")
            .and_then(|m| parse_amount(m.as_str()))
            .unwrap_or(0.0);

        let party = caps
            .name("party")
            .map(|m| m.as_str().trim().trim_end_matches(['.', ',', ';']).trim())
            .filter(|p| !p.is_empty());
        let (recipient, merchant_name) = match party {
            Some(p) if p.contains('@') => (Some(p.to_string()), None),
            Some(p) => (None, valid_merchant_name(p)),
            None => (None, None),
        };

        let transaction_id = caps
            .name("reference")
            .map(|m| m.as_str().to_string())
            .filter(|r| (MIN_REFERENCE_LEN..=MAX_REFERENCE_LEN).contains(&r.len()));

        ParsedTransaction {
            amount,
            recipient,
            merchant_name,
            transaction_id,
            payment_method: self.payment_method(&message.body),
            date_time: message.received_at,
            sms_content: message.body.clone(),
            sender: message.sender.clone(),
            confidence: self.confidence(),
        }
    }
}

impl std::fmt::Display for IssuerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick an extractor by sender and run it, falling back to generic extraction
pub fn route(message: &RawMessage) -> Option<ParsedTransaction> {
    match IssuerKind::detect(&message.sender) {
        Some(kind) => kind.extract(message).or_else(|| {
            tracing::debug!(issuer = %kind, id = message.id, "No issuer template matched, using generic extractor");
            extract_generic(message)
        }),
        None => extract_generic(message),
    }
}

fn compile_templates(templates: &[&str]) -> Vec<Regex> {
    templates
        .iter()
        .map(|t| {
            let pattern = t.replace("{A}", AMOUNT);
            Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid issuer template {t:?}: {e}"))
        })
        .collect()
}

static HDFC_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"Rs\.(?P<amount>{A})\s+debited\s+from\s+.*?\s+at\s+(?P<party>[A-Z][A-Z0-9\s]+?)\s+on\s+[\w-]+",
        r"₹(?P<amount>{A})\s+debited\s+from\s+.*?\s+UPI\s+Ref\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
        r"INR\s+(?P<amount>{A})\s+spent\s+on\s+(?P<party>[A-Z][A-Z0-9\s]+?)\s+using\s+HDFC\s+.*?Card",
    ])
});

static SBI_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"Rs\s+(?P<amount>{A})\s+debited\s+from\s+.*?\s+on\s+[\w-]+\s+at\s+(?P<party>[A-Z][A-Z0-9\s]+)",
        r"₹(?P<amount>{A})\s+sent\s+via\s+UPI\s+to\s+(?P<party>\S+)\s+Ref\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
    ])
});

static ICICI_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"₹(?P<amount>{A})\s+debited\s+from\s+.*?\s+at\s+(?P<party>[A-Z][A-Z0-9\s]+?)\s+on\s+[\w-]+",
        r"₹(?P<amount>{A})\s+transferred\s+to\s+(?P<party>\S+)\s+via\s+UPI\s+Ref\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
    ])
});

static GPAY_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"₹(?P<amount>{A})\s+paid\s+to\s+(?P<party>\S+)\s+via\s+UPI\s+UPI\s+Ref\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
        r"You\s+paid\s+₹(?P<amount>{A})\s+to\s+(?P<party>\S+)\s+UPI\s+Ref\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
    ])
});

static PHONEPE_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"₹(?P<amount>{A})\s+sent\s+to\s+(?P<party>\S+)\s+via\s+PhonePe\s+UPI\s+ID\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
        r"You\s+sent\s+₹(?P<amount>{A})\s+to\s+(?P<party>\S+)\s+Transaction\s+ID\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
    ])
});

static PAYTM_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_templates(&[
        r"₹(?P<amount>{A})\s+transferred\s+to\s+(?P<party>\S+)\s+via\s+Paytm\s+UPI\s+Txn\s+ID\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
        r"₹(?P<amount>{A})\s+paid\s+from\s+Paytm\s+Wallet\s+to\s+(?P<party>\S+)\s+Order\s+ID\s*:?\s*(?P<reference>[A-Za-z0-9]+)",
    ])
});
