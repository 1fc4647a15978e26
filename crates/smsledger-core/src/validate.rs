//! Validation gates for transactions and categories

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::models::{is_default_category, Category, ParsedTransaction};

pub const MAX_CATEGORY_NAME_LEN: usize = 50;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$")
        .unwrap_or_else(|e| panic!("invalid color pattern: {e}"))
});

/// Outcome of a validation gate with every failed rule listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors joined for display
    pub fn message(&self) -> String {
        self.errors.join("; ")
    }
}

pub fn is_amount_reasonable(amount: f64, cap: f64) -> bool {
    amount > 0.0 && amount <= cap
}

/// Storage gate: positive amount within the cap, a counterparty and a body
pub fn validate_transaction(parsed: &ParsedTransaction, config: &PipelineConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if parsed.amount.is_nan() || parsed.amount <= 0.0 {
        errors.push("Amount must be greater than zero".to_string());
    } else if parsed.amount > config.amount_cap {
        errors.push(format!("Amount exceeds the limit of {:.2}", config.amount_cap));
    }

    if parsed.primary_identifier().is_none() {
        errors.push("Either recipient or merchant name is required".to_string());
    }

    if parsed.sms_content.trim().is_empty() {
        errors.push("Message content is required".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn is_valid_color(color: &str) -> bool {
    HEX_COLOR.is_match(color)
}

pub fn validate_category_name(name: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push("Category name is required".to_string());
    } else if trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
        errors.push(format!(
            "Category name must be at most {} characters",
            MAX_CATEGORY_NAME_LEN
        ));
    }
    ValidationResult::from_errors(errors)
}

pub fn validate_category(name: &str, color: &str) -> ValidationResult {
    let mut errors = validate_category_name(name).errors;
    if !is_valid_color(color) {
        errors.push(format!("Invalid color '{}', expected #RRGGBB or #RGB", color));
    }
    ValidationResult::from_errors(errors)
}

pub fn is_valid_category(category: &Category) -> bool {
    validate_category(&category.name, &category.color).is_valid
}

/// Built-in categories are immutable
pub fn can_delete_category(category: &Category) -> bool {
    category.can_be_deleted() && !is_default_category(&category.name)
}

pub fn can_edit_category(category: &Category) -> bool {
    category.can_be_edited() && !is_default_category(&category.name)
}
