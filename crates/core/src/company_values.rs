//! Per-company value overlay.
//!
//! A field that holds an independent value per company (a recipe's price or
//! publish flag, a product's cost price). Resolution always takes the company
//! explicitly; there is no ambient "current company".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::CompanyId;

/// Company-keyed values; at most one authoritative value per company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyValues<T> {
    values: BTreeMap<CompanyId, T>,
}

impl<T> CompanyValues<T> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Value stored for `company`, if any.
    pub fn get(&self, company: CompanyId) -> Option<&T> {
        self.values.get(&company)
    }

    /// Create the value for `company` or overwrite it (last write wins).
    ///
    /// Returns the previous value.
    pub fn set(&mut self, company: CompanyId, value: T) -> Option<T> {
        self.values.insert(company, value)
    }

    pub fn remove(&mut self, company: CompanyId) -> Option<T> {
        self.values.remove(&company)
    }

    pub fn contains(&self, company: CompanyId) -> bool {
        self.values.contains_key(&company)
    }

    pub fn companies(&self) -> impl Iterator<Item = CompanyId> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CompanyId, &T)> + '_ {
        self.values.iter().map(|(company, value)| (*company, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Clone> CompanyValues<T> {
    /// Value stored for `company`, or `default` when the company has none.
    pub fn get_or(&self, company: CompanyId, default: T) -> T {
        self.values.get(&company).cloned().unwrap_or(default)
    }
}

impl<T> Default for CompanyValues<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_independent_per_company() {
        let a = CompanyId::new();
        let b = CompanyId::new();
        let mut prices = CompanyValues::new();

        prices.set(a, 500);
        prices.set(b, 800);

        assert_eq!(prices.get(a), Some(&500));
        assert_eq!(prices.get(b), Some(&800));
        assert_eq!(prices.len(), 2);
    }

    #[test]
    fn set_updates_in_place() {
        let a = CompanyId::new();
        let mut flags = CompanyValues::new();

        assert_eq!(flags.set(a, false), None);
        assert_eq!(flags.set(a, true), Some(false));
        assert_eq!(flags.get(a), Some(&true));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn missing_company_falls_back_to_default() {
        let prices: CompanyValues<i64> = CompanyValues::new();
        assert_eq!(prices.get(CompanyId::new()), None);
        assert_eq!(prices.get_or(CompanyId::new(), 0), 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: get after set returns the value just written.
            #[test]
            fn set_then_get_round_trips(writes in proptest::collection::vec(any::<i64>(), 1..20)) {
                let company = CompanyId::new();
                let mut values = CompanyValues::new();
                for v in &writes {
                    values.set(company, *v);
                    prop_assert_eq!(values.get(company), Some(v));
                }
                prop_assert_eq!(values.len(), 1);
            }
        }
    }
}
