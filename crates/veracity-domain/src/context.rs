//! Analysis contexts and the remap table used to reconcile them mid-run

use crate::ContextId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lifecycle status of an analysis context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    /// Proceeding or ongoing matter
    #[default]
    Active,
    /// Concluded matter
    Concluded,
    /// Status could not be determined
    Unknown,
}

/// A bounded analytical frame requiring independently evaluated evidence and verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Stable identifier
    pub id: ContextId,

    /// Short human-readable name
    pub name: String,

    /// What the context is about (institution, jurisdiction, proceeding)
    pub subject: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: ContextStatus,

    /// Free-form metadata supplied by upstream understanding
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AnalysisContext {
    /// Create a new active context without metadata
    pub fn new(id: impl Into<ContextId>, name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subject: subject.into(),
            status: ContextStatus::Active,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Where a context id goes after a reconciliation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum RemapTarget {
    /// References move to another (surviving) context
    MergedInto(ContextId),
    /// The context was removed; references become empty
    Removed,
}

/// An explicit remap table for context merges, renames and prunes
///
/// A remap is built up front and then applied atomically to every
/// cross-reference, so no reader ever observes a half-renamed graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextRemap {
    moves: HashMap<ContextId, RemapTarget>,
    renames: HashMap<ContextId, String>,
}

impl ContextRemap {
    /// Create an empty remap
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `from` into `into`
    pub fn merge(mut self, from: impl Into<ContextId>, into: impl Into<ContextId>) -> Self {
        self.moves.insert(from.into(), RemapTarget::MergedInto(into.into()));
        self
    }

    /// Remove a context entirely
    pub fn remove(mut self, id: impl Into<ContextId>) -> Self {
        self.moves.insert(id.into(), RemapTarget::Removed);
        self
    }

    /// Rename a context (its id stays stable)
    pub fn rename(mut self, id: impl Into<ContextId>, name: impl Into<String>) -> Self {
        self.renames.insert(id.into(), name.into());
        self
    }

    /// True when the remap changes nothing
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.renames.is_empty()
    }

    /// New name for a context, if renamed
    pub fn renamed(&self, id: &ContextId) -> Option<&str> {
        self.renames.get(id).map(String::as_str)
    }

    /// Resolve a context reference through the table
    ///
    /// Merge chains (`A → B → C`) are followed to their end. Returns `None`
    /// when the chain ends in a removal or loops back on itself.
    pub fn resolve(&self, id: &ContextId) -> Option<ContextId> {
        let mut current = id.clone();
        for _ in 0..=self.moves.len() {
            match self.moves.get(&current) {
                None => return Some(current),
                Some(RemapTarget::Removed) => return None,
                Some(RemapTarget::MergedInto(next)) => current = next.clone(),
            }
        }
        None
    }

    /// Whether the context id is the source of a merge or removal
    pub fn is_retired(&self, id: &ContextId) -> bool {
        self.moves.contains_key(id)
    }
}
