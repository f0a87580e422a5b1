//! Runtime configuration: merge policy, summary options and ticket layout.
//!
//! Loaded from an optional JSON file, then overridden by `KITCHEN_TICKET_*`
//! environment variables. Every field has a default, so an empty file or no
//! file at all is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{MergeKey, MergePolicy, PriceStrategy, SummaryOptions};
use crate::error::ConfigError;
use crate::receipt_renderer::{LayoutConfig, ReceiptTemplate};

pub const ENV_TEMPLATE: &str = "KITCHEN_TICKET_TEMPLATE";
pub const ENV_PAPER_MM: &str = "KITCHEN_TICKET_PAPER_MM";
pub const ENV_MERGE_KEY: &str = "KITCHEN_TICKET_MERGE_KEY";
pub const ENV_PRICING: &str = "KITCHEN_TICKET_PRICING";
pub const ENV_STORE_NAME: &str = "KITCHEN_TICKET_STORE_NAME";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    pub merge: MergePolicy,
    pub summary: SummaryOptions,
    pub layout: LayoutConfig,
}

impl KitchenConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "Loaded kitchen ticket config");
        Ok(cfg)
    }

    /// File (if any) plus process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Apply `KITCHEN_TICKET_*` overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(value) = get(ENV_TEMPLATE) {
            let template = ReceiptTemplate::from_value(Some(value.as_str()));
            if !value.eq_ignore_ascii_case("modern") && template == ReceiptTemplate::Modern {
                warn!(key = ENV_TEMPLATE, value = %value, "Unknown template, using modern");
            }
            self.layout.template = template;
        }
        if let Some(value) = get(ENV_PAPER_MM) {
            self.layout.paper_mm = value
                .parse::<i32>()
                .map_err(|_| invalid(ENV_PAPER_MM, &value))?;
        }
        if let Some(value) = get(ENV_MERGE_KEY) {
            self.merge.key = match value.to_ascii_lowercase().as_str() {
                "configuration" | "config" | "cart_key" => MergeKey::Configuration,
                "product_name" | "name" => MergeKey::ProductName,
                _ => return Err(invalid(ENV_MERGE_KEY, &value)),
            };
        }
        if let Some(value) = get(ENV_PRICING) {
            self.merge.pricing = match value.to_ascii_lowercase().as_str() {
                "sum_totals" | "sum" => PriceStrategy::SumTotals,
                "recompute" => PriceStrategy::Recompute,
                _ => return Err(invalid(ENV_PRICING, &value)),
            };
        }
        if let Some(value) = get(ENV_STORE_NAME) {
            self.layout.store_name = value;
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MalformedAction;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = KitchenConfig::from_json_str("  ").unwrap();
        assert_eq!(cfg, KitchenConfig::default());
        assert_eq!(cfg.merge.key, MergeKey::Configuration);
        assert_eq!(cfg.merge.pricing, PriceStrategy::SumTotals);
        assert!(!cfg.summary.single_choice_addons);
        assert_eq!(cfg.layout.store_name, "無名牛排");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = KitchenConfig::from_json_str(
            r#"{"merge": {"key": "product_name", "on_malformed": "skip"},
                "layout": {"paperMm": 58, "template": "classic"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.merge.key, MergeKey::ProductName);
        assert_eq!(cfg.merge.on_malformed, MalformedAction::Skip);
        assert_eq!(cfg.merge.pricing, PriceStrategy::SumTotals);
        assert_eq!(cfg.layout.paper_mm, 58);
        assert_eq!(cfg.layout.template, ReceiptTemplate::Classic);
        assert!(cfg.layout.show_summary);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            KitchenConfig::from_json_str("{merge:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = KitchenConfig::default();
        cfg.apply_overrides(env(&[
            (ENV_TEMPLATE, "classic"),
            (ENV_PAPER_MM, "58"),
            (ENV_MERGE_KEY, "name"),
            (ENV_PRICING, "recompute"),
            (ENV_STORE_NAME, "分店二"),
        ]))
        .unwrap();
        assert_eq!(cfg.layout.template, ReceiptTemplate::Classic);
        assert_eq!(cfg.layout.paper_mm, 58);
        assert_eq!(cfg.merge.key, MergeKey::ProductName);
        assert_eq!(cfg.merge.pricing, PriceStrategy::Recompute);
        assert_eq!(cfg.layout.store_name, "分店二");
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let mut cfg = KitchenConfig::default();
        let err = cfg
            .apply_overrides(env(&[(ENV_PRICING, "average")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_PRICING));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = KitchenConfig::from_file(Path::new("/nonexistent/kitchen.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kitchen.json"));
    }
}
