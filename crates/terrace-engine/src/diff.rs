//! Diff model
//!
//! A [`Diff`] is the set of per-resource actions a plan intends to take.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a plan does to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    /// New resource
    Create,
    /// In-place update
    Update,
    /// Remove the resource
    Destroy,
    /// Destroy and then create
    Replace,
    /// Data source read
    Read,
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::Replace => "replace",
            Self::Read => "read",
        })
    }
}

/// Change to one attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDiff {
    /// Value before the change
    #[serde(default)]
    pub old: String,
    /// Value after the change
    #[serde(default)]
    pub new: String,
    /// New value is only known after apply
    #[serde(default)]
    pub computed: bool,
    /// Changing this attribute forces a replacement
    #[serde(default)]
    pub requires_new: bool,
}

/// Planned action for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDiff {
    /// Action to take
    pub action: DiffAction,
    /// Attribute changes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDiff>,
}

impl InstanceDiff {
    /// Diff with no attribute changes
    #[must_use]
    pub fn new(action: DiffAction) -> Self {
        Self {
            action,
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute change (builder style)
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.attributes.insert(
            name.into(),
            AttributeDiff {
                old: old.into(),
                new: new.into(),
                ..AttributeDiff::default()
            },
        );
        self
    }
}

/// All planned resource actions, keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Per-resource actions
    #[serde(default)]
    pub resources: BTreeMap<String, InstanceDiff>,
}

impl Diff {
    /// Empty diff
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource action (builder style)
    #[must_use]
    pub fn with(mut self, address: impl Into<String>, diff: InstanceDiff) -> Self {
        self.resources.insert(address.into(), diff);
        self
    }

    /// Whether the plan changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of resources with the given action
    #[must_use]
    pub fn count(&self, action: DiffAction) -> usize {
        self.resources.values().filter(|d| d.action == action).count()
    }
}
