//! Dated cost/price snapshots per company.
//!
//! An append-only audit of what a recipe cost and sold for at a given date.
//! For a company, the entry with the most recent date wins; entries recorded
//! later win ties.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dishcost_core::{CompanyId, Currency};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPriceEntry {
    pub company: CompanyId,
    pub date: NaiveDate,
    pub cost: Decimal,
    pub price: Decimal,
}

impl CostPriceEntry {
    /// `cost / price` as a percentage, rounded to `currency`.
    ///
    /// `None` for a zero price, or when the ratio leaves the decimal range.
    pub fn percentage(&self, currency: &Currency) -> Option<Decimal> {
        if self.price.is_zero() {
            return None;
        }
        let ratio = self.cost.checked_div(self.price)?;
        Some(currency.round(ratio.checked_mul(Decimal::ONE_HUNDRED)?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostPriceHistory {
    entries: Vec<CostPriceEntry>,
}

impl CostPriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: CostPriceEntry) {
        self.entries.push(entry);
    }

    /// Most recent entry for `company`.
    pub fn latest(&self, company: CompanyId) -> Option<&CostPriceEntry> {
        // Later insertion wins ties: scan in reverse and keep the first max.
        self.entries
            .iter()
            .rev()
            .filter(|e| e.company == company)
            .fold(None, |best: Option<&CostPriceEntry>, e| match best {
                Some(b) if b.date >= e.date => Some(b),
                _ => Some(e),
            })
    }

    /// Entries for `company`, newest first.
    pub fn for_company(&self, company: CompanyId) -> Vec<&CostPriceEntry> {
        let mut entries: Vec<(usize, &CostPriceEntry)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.company == company)
            .collect();
        entries.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));
        entries.into_iter().map(|(_, e)| e).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(company: CompanyId, day: u32, cost: i64, price: i64) -> CostPriceEntry {
        CostPriceEntry {
            company,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            cost: Decimal::from(cost),
            price: Decimal::from(price),
        }
    }

    #[test]
    fn most_recent_date_wins() {
        let company = CompanyId::new();
        let mut history = CostPriceHistory::new();
        history.record(entry(company, 10, 300, 600));
        history.record(entry(company, 3, 100, 200));

        assert_eq!(history.latest(company).unwrap().cost, Decimal::from(300));
    }

    #[test]
    fn later_insertion_wins_same_date() {
        let company = CompanyId::new();
        let mut history = CostPriceHistory::new();
        history.record(entry(company, 10, 300, 600));
        history.record(entry(company, 10, 310, 600));

        assert_eq!(history.latest(company).unwrap().cost, Decimal::from(310));
        let listed: Vec<Decimal> = history.for_company(company).iter().map(|e| e.cost).collect();
        assert_eq!(listed, vec![Decimal::from(310), Decimal::from(300)]);
    }

    #[test]
    fn companies_do_not_see_each_other() {
        let a = CompanyId::new();
        let b = CompanyId::new();
        let mut history = CostPriceHistory::new();
        history.record(entry(a, 1, 250, 500));

        assert!(history.latest(b).is_none());
        assert!(history.for_company(b).is_empty());
    }

    #[test]
    fn percentage_is_undefined_for_zero_price() {
        let currency = Currency::default();
        let company = CompanyId::new();
        assert_eq!(entry(company, 1, 250, 500).percentage(&currency), Some(Decimal::from(50)));
        assert_eq!(entry(company, 1, 250, 0).percentage(&currency), None);
    }

    #[test]
    fn percentage_beyond_decimal_range_is_undefined() {
        let mut tiny_price = entry(CompanyId::new(), 1, 10_000_000_000, 0);
        tiny_price.price = Decimal::new(1, 19);
        assert_eq!(tiny_price.percentage(&Currency::default()), None);
    }
}
