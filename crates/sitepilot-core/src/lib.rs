//! # Sitepilot Core
//!
//! Manifest-driven action resolution, constraint validation, and execution
//! tracing for agent-operable sites.
//!
//! This crate contains:
//! - Manifest model: typed capability catalog with declarative constraints
//! - Constraint validator: pure per-slot verdict computation
//! - Action resolver: goal descriptor → exactly one action, fail-closed
//! - Trace builder: immutable, ordered audit record per invocation
//! - Invocation pipeline tying the three operations together
//!
//! This crate does NOT care about:
//! - How the manifest document reaches the process
//! - How input fields are rendered or filled on screen
//! - Pacing or animation of step playback

pub mod binding;
pub mod engine;
pub mod manifest;
pub mod resolver;
pub mod trace;
pub mod validator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binding::{BindingSource, FieldLocator};
    pub use crate::engine::{execute, execute_bound, execute_with, GoalInstance};
    pub use crate::manifest::{
        load_manifest, ActionSpec, ConstraintSpec, ExecutionPolicy, FormatKind, GoalSpec,
        InputSpec, ManifestSpec, OutputSpec, SchemaViolationError, StateModelSpec,
    };
    pub use crate::resolver::{
        resolve, resolve_with_policy, ActionNotFoundError, GoalDescriptor, MatchPolicy,
    };
    pub use crate::trace::{
        ProvenanceEntry, ProvenanceSource, StepLog, StepRecord, TraceBuilder, TraceRecord,
    };
    pub use crate::validator::{validate, ValidationVerdict};
}

// Re-export key types at crate root
pub use binding::{BindingSource, FieldLocator};
pub use engine::{execute, execute_bound, execute_with, GoalInstance};
pub use manifest::{load_manifest, ActionSpec, ConstraintSpec, ManifestSpec, SchemaViolationError};
pub use resolver::{resolve, ActionNotFoundError, GoalDescriptor, MatchPolicy};
pub use trace::{StepLog, TraceBuilder, TraceRecord};
pub use validator::{validate, ValidationVerdict};
