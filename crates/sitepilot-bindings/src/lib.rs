//! In-memory binding source
//!
//! Development and testing implementation of the core binding contract: a
//! static slot → field-locator map plus a journal of pushed values, so
//! tests and demos can observe exactly what reached the surface.

use std::collections::BTreeMap;
use std::sync::RwLock;

use sitepilot_core::binding::{BindingSource, FieldLocator};

/// One value the engine pushed to a bound field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedValue {
    pub slot: String,
    pub value: String,
}

/// Static slot-to-field map with an observable push journal.
pub struct StaticBindings {
    origin: String,
    fields: BTreeMap<String, FieldLocator>,
    applied: RwLock<Vec<AppliedValue>>,
}

impl StaticBindings {
    /// Create an empty map. `origin` is the identifier that appears in
    /// binding provenance entries.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            fields: BTreeMap::new(),
            applied: RwLock::new(Vec::new()),
        }
    }

    /// Register a field binding for a slot.
    pub fn bind(mut self, slot: impl Into<String>, locator: FieldLocator) -> Self {
        self.fields.insert(slot.into(), locator);
        self
    }

    /// Values pushed so far, in push order.
    pub fn applied(&self) -> Vec<AppliedValue> {
        self.applied
            .read()
            .map(|applied| applied.clone())
            .unwrap_or_default()
    }
}

impl BindingSource for StaticBindings {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn locate(&self, slot: &str) -> Option<FieldLocator> {
        self.fields.get(slot).cloned()
    }

    fn push(&self, slot: &str, value: &str) {
        if let Ok(mut applied) = self.applied.write() {
            applied.push(AppliedValue {
                slot: slot.to_string(),
                value: value.to_string(),
            });
        }
    }
}
