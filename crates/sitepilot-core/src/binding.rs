//! Binding contract
//!
//! The optional UI-binding layer maps input slots to concrete field
//! locations and receives validated values. The engine consumes this
//! contract only for provenance attribution; resolution and validation
//! never depend on it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to a concrete UI field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLocator {
    /// How the field is addressed, e.g. "css", "xpath", "aria-label".
    pub strategy: String,
    /// The address itself.
    pub reference: String,
}

impl FieldLocator {
    pub fn new(strategy: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reference: reference.into(),
        }
    }

    /// CSS-selector locator.
    pub fn css(reference: impl Into<String>) -> Self {
        Self::new("css", reference)
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy, self.reference)
    }
}

/// Slot-to-field mapping supplied by a UI layer.
///
/// Implementations live outside the core. `push` receives only values that
/// already passed validation and must not report back into the trace.
pub trait BindingSource: Send + Sync {
    /// Identifier used in binding provenance entries.
    fn origin(&self) -> &str;

    /// Locate the field bound to an input slot, if any.
    fn locate(&self, slot: &str) -> Option<FieldLocator>;

    /// Push a validated value toward the bound field.
    fn push(&self, slot: &str, value: &str);
}
