//! Manifest model
//!
//! Typed representation of a site's declared capability catalog:
//! - GoalSpec / ActionSpec / InputSpec / OutputSpec definitions
//! - ConstraintSpec: the closed set of declarative slot constraints
//! - Structural validation at load time
//!
//! A loaded `ManifestSpec` is a value. Nothing in the engine mutates it
//! post-load, so one spec can back any number of concurrent invocations
//! without synchronization.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Manifest structural errors.
///
/// A manifest that fails any of these checks is unusable as a whole; there
/// is no partial load.
#[derive(Debug, Error)]
pub enum SchemaViolationError {
    #[error("Manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate action id: {0}")]
    DuplicateActionId(String),

    #[error("Duplicate goal id: {0}")]
    DuplicateGoalId(String),

    #[error("Duplicate input name '{input}' in action '{action}'")]
    DuplicateInputName { action: String, input: String },

    #[error("Invalid pattern on '{action}.{input}': {source}")]
    InvalidPattern {
        action: String,
        input: String,
        #[source]
        source: regex::Error,
    },

    #[error("Action '{action}' serves undeclared goal id: {goal}")]
    UnknownGoal { action: String, goal: String },
}

/// Parse and structurally validate a manifest document.
pub fn load_manifest(document: &str) -> Result<ManifestSpec, SchemaViolationError> {
    let spec: ManifestSpec = serde_json::from_str(document)?;
    spec.validate()?;
    Ok(spec)
}

/// Root of the capability catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSpec {
    /// Document schema identifier, carried for provenance.
    #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Document version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Goals the site declares.
    #[serde(default)]
    pub goals: Vec<GoalSpec>,
    /// Named state models. Structural only; the engine never interprets them.
    #[serde(default)]
    pub state_models: BTreeMap<String, StateModelSpec>,
    /// Invokable actions.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// Where this manifest came from (file path, URL, test label). Not part
    /// of the document; attached by the loader.
    #[serde(skip)]
    origin: Option<String>,
}

impl ManifestSpec {
    /// Build a spec from an already-parsed document.
    pub fn from_value(document: Value) -> Result<Self, SchemaViolationError> {
        let spec: ManifestSpec = serde_json::from_value(document)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Attach an origin label used in trace provenance.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Origin identifier for provenance: the loader-attached label, falling
    /// back to the document's `$schema`.
    pub fn origin(&self) -> &str {
        self.origin
            .as_deref()
            .or(self.schema.as_deref())
            .unwrap_or("manifest")
    }

    /// Look up an action by id.
    pub fn action(&self, id: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Look up a declared goal by id.
    pub fn goal(&self, id: &str) -> Option<&GoalSpec> {
        self.goals.iter().find(|g| g.id == id)
    }

    /// Structural validation: unique action ids, unique goal ids, unique
    /// input names per action, compilable patterns, and no action serving an
    /// undeclared goal id.
    pub fn validate(&self) -> Result<(), SchemaViolationError> {
        let mut goal_ids = HashSet::new();
        for goal in &self.goals {
            if !goal_ids.insert(goal.id.as_str()) {
                return Err(SchemaViolationError::DuplicateGoalId(goal.id.clone()));
            }
        }

        let mut action_ids = HashSet::new();
        for action in &self.actions {
            if !action_ids.insert(action.id.as_str()) {
                return Err(SchemaViolationError::DuplicateActionId(action.id.clone()));
            }

            for goal in &action.goals {
                if !goal_ids.contains(goal.as_str()) {
                    return Err(SchemaViolationError::UnknownGoal {
                        action: action.id.clone(),
                        goal: goal.clone(),
                    });
                }
            }

            let mut input_names = HashSet::new();
            for input in &action.inputs {
                if !input_names.insert(input.name.as_str()) {
                    return Err(SchemaViolationError::DuplicateInputName {
                        action: action.id.clone(),
                        input: input.name.clone(),
                    });
                }
                if let Some(ConstraintSpec::Pattern { regex, .. }) = &input.constraint {
                    if let Err(source) = Regex::new(regex) {
                        return Err(SchemaViolationError::InvalidPattern {
                            action: action.id.clone(),
                            input: input.name.clone(),
                            source,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// A caller-addressable objective declared by the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub id: String,
    pub description: String,
}

/// Named state model attached to the manifest. Structural only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateModelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub states: Vec<String>,
}

/// A named, typed capability with declared inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Goal ids this action declares itself as serving.
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    /// Presentation hint. Opaque to the engine and passed through unexamined.
    #[serde(default, rename = "ui_hint", skip_serializing_if = "Option::is_none")]
    pub ui_hint: Option<Value>,
    #[serde(default)]
    pub execution_policy: ExecutionPolicy,
}

impl ActionSpec {
    /// Whether this action declares the given goal id.
    pub fn serves(&self, goal_id: &str) -> bool {
        self.goals.iter().any(|g| g == goal_id)
    }

    /// Look up a declared input slot by name.
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

/// Execution mode policy for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPolicy {
    /// Whether invocations simulate effects instead of committing them.
    #[serde(default = "default_true")]
    pub dry_run_default: bool,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        // Simulate unless the manifest explicitly opts in to execution.
        Self {
            dry_run_default: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One named input slot on an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    /// Semantic tag, e.g. "text", "date-range", "currency". Open set.
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintSpec>,
}

/// One named output slot on an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declarative validation rule attached to an input slot.
///
/// Closed tagged set: adding a kind is a compile-time-checked extension, and
/// unknown shapes in a document are rejected at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintSpec {
    /// Full-string regular expression match.
    Pattern { regex: String, description: String },

    /// Structured format check.
    Format {
        kind: FormatKind,
        description: String,
    },

    /// Decimal value with an inclusive lower bound. The currency code is
    /// carried for display only and is not checked against a registry.
    NumericMinimum {
        minimum: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        currency: Option<String>,
        description: String,
    },
}

impl ConstraintSpec {
    /// The manifest author's human-readable rule description.
    pub fn description(&self) -> &str {
        match self {
            ConstraintSpec::Pattern { description, .. } => description,
            ConstraintSpec::Format { description, .. } => description,
            ConstraintSpec::NumericMinimum { description, .. } => description,
        }
    }
}

/// Structured format kinds understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatKind {
    /// Two ISO dates joined by `/`.
    #[serde(rename = "date-range")]
    DateRange,
}
