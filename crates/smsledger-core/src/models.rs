//! Domain models for smsledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description used when a transaction has neither merchant nor recipient
pub const FALLBACK_DESCRIPTION: &str = "Transaction";

/// Mailbox folder a message was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFolder {
    #[default]
    Inbox,
    Sent,
    Draft,
    Outbox,
    Failed,
    Queued,
}

impl MessageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Sent => "sent",
            Self::Draft => "draft",
            Self::Outbox => "outbox",
            Self::Failed => "failed",
            Self::Queued => "queued",
        }
    }

    /// Numeric message type used by platform SMS providers (1 = inbox)
    pub fn from_type_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Inbox),
            2 => Some(Self::Sent),
            3 => Some(Self::Draft),
            4 => Some(Self::Outbox),
            5 => Some(Self::Failed),
            6 => Some(Self::Queued),
            _ => None,
        }
    }
}

impl std::str::FromStr for MessageFolder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_type_code(code).ok_or_else(|| format!("Unknown folder: {}", s));
        }
        match s.to_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "sent" => Ok(Self::Sent),
            "draft" => Ok(Self::Draft),
            "outbox" => Ok(Self::Outbox),
            "failed" => Ok(Self::Failed),
            "queued" => Ok(Self::Queued),
            _ => Err(format!("Unknown folder: {}", s)),
        }
    }
}

impl std::fmt::Display for MessageFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw SMS as yielded by a message source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    /// Short code ("HDFCBK", "GPAY") or phone number
    #[serde(alias = "address")]
    pub sender: String,
    pub body: String,
    /// Milliseconds since the Unix epoch
    #[serde(alias = "date", alias = "timestamp")]
    pub received_at: i64,
    #[serde(default)]
    pub folder: MessageFolder,
    #[serde(default)]
    pub read: bool,
}

impl RawMessage {
    /// Build an inbox message
    pub fn new(id: i64, sender: impl Into<String>, body: impl Into<String>, received_at: i64) -> Self {
        Self {
            id,
            sender: sender.into(),
            body: body.into(),
            received_at,
            folder: MessageFolder::Inbox,
            read: false,
        }
    }

    /// Synthesize a message delivered by a push callback.
    ///
    /// Pushed messages carry no provider id, so the current time doubles as both
    /// id and receive time.
    pub fn from_push(sender: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now().timestamp_millis();
        Self::new(now, sender, body, now)
    }

    pub fn is_inbox(&self) -> bool {
        self.folder == MessageFolder::Inbox
    }

    pub fn is_unread(&self) -> bool {
        !self.read
    }

    /// Sender trimmed and uppercased
    pub fn normalized_sender(&self) -> String {
        self.sender.trim().to_uppercase()
    }
}

/// Payment instrument a transaction was made with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    DebitCard,
    CreditCard,
    NetBanking,
    Wallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::DebitCard => "Debit Card",
            Self::CreditCard => "Credit Card",
            Self::NetBanking => "Net Banking",
            Self::Wallet => "Wallet",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [PaymentMethod] {
        &[
            Self::Upi,
            Self::DebitCard,
            Self::CreditCard,
            Self::NetBanking,
            Self::Wallet,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "").as_str() {
            "upi" => Ok(Self::Upi),
            "debitcard" => Ok(Self::DebitCard),
            "creditcard" => Ok(Self::CreditCard),
            "netbanking" => Ok(Self::NetBanking),
            "wallet" => Ok(Self::Wallet),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction extracted from an SMS body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub amount: f64,
    /// VPA (`local@domain`) or 10-digit phone number
    pub recipient: Option<String>,
    pub merchant_name: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Copied from the source message (milliseconds)
    pub date_time: i64,
    pub sms_content: String,
    pub sender: String,
    /// How completely the extraction matched, in [0.0, 1.0]
    pub confidence: f64,
}

impl ParsedTransaction {
    /// Merchant if present, else recipient
    pub fn primary_identifier(&self) -> Option<&str> {
        non_blank(self.merchant_name.as_deref()).or_else(|| non_blank(self.recipient.as_deref()))
    }

    /// First non-empty of merchant, recipient, "Transaction"
    pub fn short_description(&self) -> &str {
        short_description(self.merchant_name.as_deref(), self.recipient.as_deref())
    }

    pub fn is_high_confidence(&self) -> bool {
        self.is_high_confidence_at(crate::config::DEFAULT_HIGH_CONFIDENCE)
    }

    pub fn is_high_confidence_at(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    /// Minimum data needed for storage
    pub fn is_valid(&self) -> bool {
        self.amount > 0.0
            && (non_blank(self.recipient.as_deref()).is_some()
                || non_blank(self.merchant_name.as_deref()).is_some())
            && !self.sms_content.trim().is_empty()
    }
}

/// A transaction already held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTransaction {
    pub id: i64,
    pub amount: f64,
    pub recipient: Option<String>,
    pub merchant_name: Option<String>,
    pub date_time: i64,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub categorized: bool,
    pub sms_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedTransaction {
    pub fn short_description(&self) -> &str {
        short_description(self.merchant_name.as_deref(), self.recipient.as_deref())
    }

    /// Amount formatted with the rupee sign
    pub fn formatted_amount(&self) -> String {
        format!("₹{:.2}", self.amount)
    }
}

/// Insert payload for the store, built from a validated parse
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: f64,
    pub recipient: Option<String>,
    pub merchant_name: Option<String>,
    pub date_time: i64,
    pub transaction_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub sms_content: String,
    pub sender: String,
    pub confidence: f64,
    /// SHA-256 of sender, body and receive time
    pub sms_hash: String,
}

impl From<&ParsedTransaction> for NewTransaction {
    fn from(p: &ParsedTransaction) -> Self {
        Self {
            amount: p.amount,
            recipient: p.recipient.clone(),
            merchant_name: p.merchant_name.clone(),
            date_time: p.date_time,
            transaction_id: p.transaction_id.clone(),
            payment_method: p.payment_method,
            sms_content: p.sms_content.clone(),
            sender: p.sender.clone(),
            confidence: p.confidence,
            sms_hash: crate::classify::message_fingerprint(&p.sender, &p.sms_content, p.date_time),
        }
    }
}

/// Spending total for one category over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    /// `None` for uncategorized transactions
    pub category: Option<String>,
    pub total: f64,
    pub count: i64,
}

/// A spending category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Hex color, `#RRGGBB` or `#RGB`
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
}

impl Category {
    pub fn can_be_deleted(&self) -> bool {
        !self.is_default
    }

    pub fn can_be_edited(&self) -> bool {
        !self.is_default
    }
}

/// Built-in categories: (name, color, icon)
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 9] = [
    ("Food & Dining", "#FF5722", "restaurant"),
    ("Transportation", "#2196F3", "directions_car"),
    ("Shopping", "#E91E63", "shopping_bag"),
    ("Entertainment", "#9C27B0", "movie"),
    ("Bills & Utilities", "#FF9800", "receipt"),
    ("Health & Medical", "#4CAF50", "local_hospital"),
    ("Education", "#3F51B5", "school"),
    ("Personal Care", "#00BCD4", "face"),
    ("Other", "#607D8B", "category"),
];

/// Default categories as values (ids are 0 until stored)
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, color, icon)| Category {
            id: 0,
            name: name.to_string(),
            color: color.to_string(),
            icon: Some(icon.to_string()),
            is_default: true,
        })
        .collect()
}

pub fn is_default_category(name: &str) -> bool {
    DEFAULT_CATEGORIES.iter().any(|(n, _, _)| *n == name)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

fn short_description<'a>(merchant: Option<&'a str>, recipient: Option<&'a str>) -> &'a str {
    non_blank(merchant)
        .or_else(|| non_blank(recipient))
        .unwrap_or(FALLBACK_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(merchant: Option<&str>, recipient: Option<&str>) -> ParsedTransaction {
        ParsedTransaction {
            amount: 150.0,
            recipient: recipient.map(String::from),
            merchant_name: merchant.map(String::from),
            transaction_id: None,
            payment_method: PaymentMethod::Upi,
            date_time: 0,
            sms_content: "₹150 paid".to_string(),
            sender: "GPAY".to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_short_description_precedence() {
        assert_eq!(parsed(Some("ZOMATO"), Some("a@b")).short_description(), "ZOMATO");
        assert_eq!(parsed(None, Some("a@b")).short_description(), "a@b");
        assert_eq!(parsed(Some("  "), None).short_description(), "Transaction");
        assert_eq!(parsed(None, None).short_description(), "Transaction");
    }

    #[test]
    fn test_validity() {
        assert!(parsed(Some("ZOMATO"), None).is_valid());
        assert!(!parsed(None, None).is_valid());

        let mut zero = parsed(Some("ZOMATO"), None);
        zero.amount = 0.0;
        assert!(!zero.is_valid());

        let mut empty_body = parsed(Some("ZOMATO"), None);
        empty_body.sms_content = "   ".to_string();
        assert!(!empty_body.is_valid());
    }

    #[test]
    fn test_high_confidence_threshold() {
        let mut p = parsed(Some("ZOMATO"), None);
        p.confidence = 0.8;
        assert!(p.is_high_confidence());
        p.confidence = 0.79;
        assert!(!p.is_high_confidence());
    }

    #[test]
    fn test_payment_method_round_trip_names() {
        assert_eq!("Debit Card".parse::<PaymentMethod>(), Ok(PaymentMethod::DebitCard));
        assert_eq!("net_banking".parse::<PaymentMethod>(), Ok(PaymentMethod::NetBanking));
        assert_eq!("UPI".parse::<PaymentMethod>(), Ok(PaymentMethod::Upi));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_folder_parsing() {
        assert_eq!("1".parse::<MessageFolder>(), Ok(MessageFolder::Inbox));
        assert_eq!("Sent".parse::<MessageFolder>(), Ok(MessageFolder::Sent));
        assert!("spam".parse::<MessageFolder>().is_err());
    }

    #[test]
    fn test_push_message_uses_current_time_as_id() {
        let msg = RawMessage::from_push("HDFCBK", "Rs.10 debited");
        assert_eq!(msg.id, msg.received_at);
        assert!(msg.id > 0);
        assert!(msg.is_inbox());
    }

    #[test]
    fn test_default_categories() {
        let cats = default_categories();
        assert_eq!(cats.len(), 9);
        assert!(cats.iter().all(|c| c.is_default && !c.can_be_deleted()));
        assert!(is_default_category("Food & Dining"));
        assert!(!is_default_category("Groceries"));
    }
}
