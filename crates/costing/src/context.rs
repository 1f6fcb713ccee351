use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use dishcost_core::{CompanyId, Currency};

/// Where a component's unit cost comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// The product's stored cost price for the company.
    #[default]
    Standard,
    /// The most recent booked supplier-invoice unit price.
    LastPurchase,
}

/// Evaluation context for one costing request.
///
/// Immutable; the company, currency, date and language are always passed in
/// rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostContext {
    company: CompanyId,
    currency: Option<Currency>,
    as_of: Option<NaiveDate>,
    language: Option<String>,
    basis: CostBasis,
}

impl CostContext {
    pub fn new(company: CompanyId) -> Self {
        Self {
            company,
            currency: None,
            as_of: None,
            language: None,
            basis: CostBasis::Standard,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_basis(mut self, basis: CostBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    /// The company currency, when known.
    pub fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    /// Currency used for rounding sums (the default 2-digit currency when unknown).
    pub fn rounding_currency(&self) -> Currency {
        self.currency.clone().unwrap_or_default()
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    /// Language recipe texts are rendered in; `None` keeps the stored text.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn basis(&self) -> CostBasis {
        self.basis
    }
}
