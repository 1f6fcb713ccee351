//! Configuration loading and representation.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use dishcost_core::Currency;
use dishcost_core::currency::DEFAULT_CURRENCY_DIGITS;
use dishcost_costing::CostBasis;
use dishcost_recipes::DEFAULT_SEPARATOR;

pub const ENV_CURRENCY_CODE: &str = "DISHCOST_CURRENCY_CODE";
pub const ENV_CURRENCY_DIGITS: &str = "DISHCOST_CURRENCY_DIGITS";
pub const ENV_CATEGORY_SEPARATOR: &str = "DISHCOST_CATEGORY_SEPARATOR";
pub const ENV_COST_BASIS: &str = "DISHCOST_COST_BASIS";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Currency used when a company has none registered.
    pub default_currency_code: String,
    pub default_currency_digits: u32,
    /// Separator between the levels of a category's full name.
    pub category_separator: String,
    pub cost_basis: CostBasis,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_currency_code: "USD".to_string(),
            default_currency_digits: DEFAULT_CURRENCY_DIGITS,
            category_separator: DEFAULT_SEPARATOR.to_string(),
            cost_basis: CostBasis::Standard,
            log_filter: dishcost_observability::DEFAULT_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment; unset variables keep their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source (`from_env` uses the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(code) = lookup(ENV_CURRENCY_CODE) {
            config.default_currency_code = code;
        }
        if let Some(digits) = lookup(ENV_CURRENCY_DIGITS) {
            config.default_currency_digits = digits
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CURRENCY_DIGITS} must be a non-negative integer, got {digits:?}"))?;
        }
        if let Some(separator) = lookup(ENV_CATEGORY_SEPARATOR) {
            config.category_separator = separator;
        }
        if let Some(basis) = lookup(ENV_COST_BASIS) {
            config.cost_basis = parse_cost_basis(&basis)
                .with_context(|| format!("invalid {ENV_COST_BASIS}"))?;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_currency(&self) -> Currency {
        Currency::new(self.default_currency_code.clone(), self.default_currency_digits)
    }

    /// Install the tracing subscriber with this configuration's filter.
    pub fn init_logging(&self) {
        dishcost_observability::init_with_filter(&self.log_filter);
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_currency_code.trim().is_empty() {
            return Err(anyhow!("default currency code cannot be empty"));
        }
        // Decimal supports at most 28 fractional digits.
        if self.default_currency_digits > 28 {
            return Err(anyhow!(
                "default currency digits must be at most 28, got {}",
                self.default_currency_digits
            ));
        }
        Ok(())
    }
}

fn parse_cost_basis(value: &str) -> anyhow::Result<CostBasis> {
    match value.trim().to_ascii_lowercase().as_str() {
        "standard" => Ok(CostBasis::Standard),
        "last_purchase" => Ok(CostBasis::LastPurchase),
        other => {
            tracing::warn!(value = other, "unknown cost basis");
            Err(anyhow!("expected `standard` or `last_purchase`, got {other:?}"))
        }
    }
}
