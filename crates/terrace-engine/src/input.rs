//! Interactive input: what to ask for and how

use crate::error::EngineError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::ops::BitOr;

/// Which values the engine should solicit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InputMode(u8);

impl InputMode {
    /// Ask for nothing
    pub const NONE: Self = Self(0);
    /// Variables that have no default
    pub const VAR: Self = Self(1);
    /// Variables with no value set at all
    pub const VAR_UNSET: Self = Self(1 << 1);
    /// Provider configuration
    pub const PROVIDER: Self = Self(1 << 2);

    /// Whether every flag in `other` is set
    #[inline]
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for InputMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One question put to the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOpts {
    /// Stable identifier, e.g. `var.region`
    pub id: String,
    /// Short prompt
    pub query: String,
    /// Longer explanation shown before the prompt
    pub description: String,
    /// Value used when the answer is empty
    pub default: String,
}

/// Source of interactive answers
#[async_trait]
pub trait UiInput: Send + Sync + Debug {
    /// Ask one question
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Input`] if the input channel is broken.
    async fn input(&self, opts: &InputOpts) -> Result<String, EngineError>;
}

/// Sink for engine-originated messages (provider output, warnings)
pub trait UiOutput: Send + Sync + Debug {
    /// Emit one message
    fn output(&self, message: &str);
}
