use rust_decimal::Decimal;
use thiserror::Error;

use dishcost_core::DomainError;
use dishcost_recipes::RecipeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CostError {
    #[error("recipe not found: {0}")]
    RecipeNotFound(RecipeId),

    /// A sub-recipe chain leads back to a recipe already being evaluated.
    #[error("sub-recipe cycle detected: {}", format_path(.path))]
    CycleDetected { path: Vec<RecipeId> },

    #[error("cannot compute percentage of recipe {0}: price is zero")]
    ZeroPrice(RecipeId),

    /// An intermediate amount left the decimal range.
    #[error("{0} overflows the decimal range")]
    Overflow(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Sum `values`, failing with [`CostError::Overflow`] naming `what`.
pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, CostError> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value).ok_or(CostError::Overflow(what))
    })
}

fn format_path(path: &[RecipeId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
