use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable item in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Tenant-scoped unique code, e.g. `"CBL-HDMI-2M"`.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Non-negative price in USD, serialized as a decimal string.
    pub price: Decimal,
    pub image_url: Option<String>,
    /// Free-text category label. Products without one are shown as "General".
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Label used for products that carry no category.
pub const DEFAULT_CATEGORY_LABEL: &str = "General";

impl Product {
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY_LABEL)
    }

    /// Price formatted for display, e.g. `"$49.99 USD"`.
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("${:.2} USD", self.price.round_dp(2))
    }

    /// Description cut to at most `max_chars` characters, with an ellipsis
    /// when anything was dropped.
    #[must_use]
    pub fn summary(&self, max_chars: usize) -> String {
        let text = self.description.as_deref().unwrap_or("").trim();
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(description: Option<&str>, category: Option<&str>) -> Product {
        Product {
            code: "CBL-1".to_string(),
            name: "USB cable".to_string(),
            description: description.map(str::to_string),
            price: Decimal::from_str("7.5").unwrap(),
            image_url: None,
            category: category.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn price_label_has_two_decimals() {
        assert_eq!(product(None, None).price_label(), "$7.50 USD");
    }

    #[test]
    fn category_label_defaults_to_general() {
        assert_eq!(product(None, None).category_label(), "General");
        assert_eq!(product(None, Some("  ")).category_label(), "General");
        assert_eq!(product(None, Some("Audio")).category_label(), "Audio");
    }

    #[test]
    fn summary_truncates_with_ellipsis() {
        let long = "a".repeat(130);
        let p = product(Some(&long), None);
        let summary = p.summary(120);
        assert_eq!(summary.chars().count(), 121);
        assert!(summary.ends_with('…'));

        assert_eq!(product(Some("short"), None).summary(120), "short");
        assert_eq!(product(None, None).summary(120), "");
    }

    #[test]
    fn price_serializes_as_string() {
        let json = serde_json::to_value(product(None, None)).unwrap();
        assert_eq!(json["price"], "7.5");
    }
}
