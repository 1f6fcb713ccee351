//! Recipe categories (tree with ordered siblings).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use dishcost_core::{DomainError, DomainResult, Entity, typed_id};

typed_id!(
    /// Recipe category identifier.
    CategoryId
);

/// Separator used between ancestor names in a category's full name.
pub const DEFAULT_SEPARATOR: &str = " / ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
    pub sequence: u32,
    pub description: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            sequence: 0,
            description: None,
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }
}

/// All categories, indexed by id.
///
/// Full names are computed by walking parents and are never stored.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, category: Category) -> DomainResult<()> {
        if category.name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        if self.nodes.contains_key(&category.id) {
            return Err(DomainError::conflict("category already exists"));
        }
        if let Some(parent) = category.parent {
            if !self.nodes.contains_key(&parent) {
                return Err(DomainError::validation("parent category does not exist"));
            }
        }
        self.nodes.insert(category.id, category);
        Ok(())
    }

    pub fn rename(&mut self, id: CategoryId, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        let node = self.nodes.get_mut(&id).ok_or_else(|| DomainError::not_found("category"))?;
        node.name = name;
        Ok(())
    }

    /// Move `id` under `parent` (or to the root).
    ///
    /// A category cannot become its own ancestor.
    pub fn reparent(&mut self, id: CategoryId, parent: Option<CategoryId>) -> DomainResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(DomainError::not_found("category"));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(&parent) {
                return Err(DomainError::validation("parent category does not exist"));
            }
            if parent == id || self.ancestors(parent).contains(&id) {
                return Err(DomainError::invariant(
                    "a category cannot be moved below itself",
                ));
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = parent;
        }
        Ok(())
    }

    /// Remove a leaf category.
    pub fn remove(&mut self, id: CategoryId) -> DomainResult<Category> {
        if self.nodes.values().any(|c| c.parent == Some(id)) {
            return Err(DomainError::conflict("category still has children"));
        }
        self.nodes.remove(&id).ok_or_else(|| DomainError::not_found("category"))
    }

    /// Direct children of `parent` (roots for `None`), ordered by sequence then name.
    pub fn children(&self, parent: Option<CategoryId>) -> Vec<&Category> {
        let mut children: Vec<&Category> =
            self.nodes.values().filter(|c| c.parent == parent).collect();
        children.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.name.cmp(&b.name)));
        children
    }

    pub fn roots(&self) -> Vec<&Category> {
        self.children(None)
    }

    /// Ancestor ids of `id`, nearest first.
    pub fn ancestors(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.nodes.get(&id).and_then(|c| c.parent);
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = self.nodes.get(&parent).and_then(|c| c.parent);
        }
        out
    }

    /// Names from the root down to `id`, joined with `separator`.
    pub fn full_name(&self, id: CategoryId, separator: &str) -> Option<String> {
        let node = self.nodes.get(&id)?;
        let mut names: Vec<&str> = self
            .ancestors(id)
            .iter()
            .filter_map(|a| self.nodes.get(a).map(|c| c.name.as_str()))
            .collect();
        names.reverse();
        names.push(node.name.as_str());
        Some(names.join(separator))
    }
}
