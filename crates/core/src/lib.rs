//! `dishcost-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the recipe costing
//! crates (no infrastructure concerns).

pub mod aggregate;
pub mod company_values;
pub mod currency;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use company_values::CompanyValues;
pub use currency::Currency;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::{AggregateId, CompanyId};
pub use value_object::ValueObject;
