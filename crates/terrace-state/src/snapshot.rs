//! State snapshot model
//!
//! A [`State`] is the serializable record of known infrastructure resource
//! attributes at a point in time. Resources are keyed by address
//! (`type.name`, optionally prefixed with a module path) and kept in a
//! `BTreeMap` so that encoding and rendering are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Current on-disk format revision
pub const STATE_VERSION: u32 = 3;

/// A snapshot of managed infrastructure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Format revision the snapshot was written with
    pub version: u32,
    /// Incremented every time a changed snapshot is written
    pub serial: u64,
    /// Stable identity of this state across serials
    pub lineage: String,
    /// Managed resources by address
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
    /// Root outputs by name
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputState>,
}

/// A single managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type, e.g. `test_instance`
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Addresses this resource depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// The live instance, absent when the resource is tainted away
    pub primary: Option<InstanceState>,
}

/// Attributes of a live resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Provider-assigned identifier
    pub id: String,
    /// Flattened attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A root module output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    /// Rendered value
    pub value: String,
    /// Whether the value is hidden in human output
    #[serde(default)]
    pub sensitive: bool,
}

impl State {
    /// Create an empty state with a fresh lineage
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            lineage: Ulid::new().to_string(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add or replace a resource (builder style)
    #[must_use]
    pub fn with_resource(mut self, address: impl Into<String>, resource: ResourceState) -> Self {
        self.resources.insert(address.into(), resource);
        self
    }

    /// Add or replace an output (builder style)
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, output: OutputState) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Whether the snapshot manages nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.outputs.is_empty()
    }

    /// Compare content, ignoring the bookkeeping fields (serial, lineage)
    #[must_use]
    pub fn same_content(&self, other: &State) -> bool {
        self.resources == other.resources && self.outputs == other.outputs
    }

    /// Decode a snapshot from JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the snapshot as pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = serde_json::to_vec_pretty(self)?;
        out.push(b'\n');
        Ok(out)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceState {
    /// Resource with a single live instance
    #[must_use]
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            depends_on: Vec::new(),
            primary: Some(InstanceState {
                id: id.into(),
                attributes: BTreeMap::new(),
            }),
        }
    }

    /// Add an attribute on the primary instance
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.primary
            .get_or_insert_with(InstanceState::default)
            .attributes
            .insert(key.into(), value.into());
        self
    }

    /// ID of the primary instance, empty when there is none
    #[must_use]
    pub fn id(&self) -> &str {
        self.primary.as_ref().map_or("", |p| p.id.as_str())
    }
}

/// Human-readable rendering, one block per resource:
///
/// ```text
/// test_instance.foo:
///   ID = yes
///   ami = bar
/// ```
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<no state>");
        }

        let mut first = true;
        for (address, resource) in &self.resources {
            if !first {
                writeln!(f)?;
            }
            first = false;

            writeln!(f, "{address}:")?;
            match &resource.primary {
                Some(primary) => {
                    write!(f, "  ID = {}", primary.id)?;
                    for (key, value) in &primary.attributes {
                        if key == "id" {
                            continue;
                        }
                        write!(f, "\n  {key} = {value}")?;
                    }
                }
                None => f.write_str("  ID = <not created>")?,
            }
            if !resource.depends_on.is_empty() {
                write!(f, "\n\n  Dependencies:")?;
                for dep in &resource.depends_on {
                    write!(f, "\n    {dep}")?;
                }
            }
        }

        if !self.outputs.is_empty() {
            if !self.resources.is_empty() {
                f.write_str("\n\n")?;
            }
            f.write_str("Outputs:\n")?;
            for (name, output) in &self.outputs {
                if output.sensitive {
                    write!(f, "\n{name} = <sensitive>")?;
                } else {
                    write!(f, "\n{name} = {}", output.value)?;
                }
            }
        }

        Ok(())
    }
}
