//! Records addressed by id inside an aggregate.

/// A record owned by an aggregate (recipe line, attachment, category, unit)
/// that keeps its id while its fields change.
///
/// Lookups such as `Recipe::component(id)` and `CategoryTree::get(id)` go
/// through this id, never through field equality.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
