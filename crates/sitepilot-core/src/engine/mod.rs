//! Invocation pipeline
//!
//! One synchronous resolve → validate-all-inputs → build-trace pass per
//! goal. The manifest is shared read-only state; everything else here is
//! owned by the single invocation that produced it, so no locking exists
//! anywhere in the pipeline. Only resolution failure aborts before a trace
//! is built; every per-field problem is captured inside a successfully
//! built trace.

use std::collections::BTreeMap;

use tracing::debug;

use crate::binding::BindingSource;
use crate::manifest::ManifestSpec;
use crate::resolver::{self, ActionNotFoundError, GoalDescriptor, MatchPolicy};
use crate::trace::{StepLog, TraceBuilder, TraceRecord};
use crate::validator::{self, ValidationVerdict};

/// One concrete goal invocation: what the caller wants, plus candidate
/// values per input slot.
#[derive(Debug, Clone, Default)]
pub struct GoalInstance {
    /// Caller-stated objective, quoted in the trace summary.
    pub description: String,
    /// Candidate values keyed by slot name.
    pub values: BTreeMap<String, String>,
}

impl GoalInstance {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            values: BTreeMap::new(),
        }
    }

    /// Supply a candidate value for a slot.
    pub fn with_value(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(slot.into(), value.into());
        self
    }
}

/// Run one invocation under the explicit-id policy, with no binding layer.
pub fn execute(
    manifest: &ManifestSpec,
    goal: &GoalDescriptor,
    instance: &GoalInstance,
) -> Result<TraceRecord, ActionNotFoundError> {
    execute_with(manifest, goal, instance, &MatchPolicy::ExplicitId, None)
}

/// Run one invocation and push validated values through a binding source.
pub fn execute_bound(
    manifest: &ManifestSpec,
    goal: &GoalDescriptor,
    instance: &GoalInstance,
    bindings: &dyn BindingSource,
) -> Result<TraceRecord, ActionNotFoundError> {
    execute_with(
        manifest,
        goal,
        instance,
        &MatchPolicy::ExplicitId,
        Some(bindings),
    )
}

/// Run one invocation with full control over policy and bindings.
///
/// Verdicts are assembled in the action's declared input order. Bindings
/// are consulted strictly after validation and can never gate it; a binding
/// provenance entry is attributed exactly when a source was consulted.
pub fn execute_with(
    manifest: &ManifestSpec,
    goal: &GoalDescriptor,
    instance: &GoalInstance,
    policy: &MatchPolicy,
    bindings: Option<&dyn BindingSource>,
) -> Result<TraceRecord, ActionNotFoundError> {
    let action = resolver::resolve_with_policy(manifest, goal, policy)?;

    let mut steps = StepLog::new();
    steps.record(format!("Resolved action '{}' ({})", action.id, action.title));

    let mut verdicts: Vec<ValidationVerdict> = Vec::with_capacity(action.inputs.len());
    for input in &action.inputs {
        let raw = instance.values.get(&input.name).map(String::as_str);
        let verdict = validator::validate(input, raw);
        steps.record(format!("Validated '{}': {}", input.name, verdict.reason));
        verdicts.push(verdict);
    }

    let all_valid = verdicts.iter().all(|v| v.valid);
    debug!(
        action = %action.id,
        inputs = action.inputs.len(),
        all_valid,
        "validation pass complete"
    );

    // Snapshot of the values the invocation actually used: supplied values
    // for declared slots, in declared order.
    let used: BTreeMap<String, String> = action
        .inputs
        .iter()
        .filter_map(|i| {
            instance
                .values
                .get(&i.name)
                .map(|v| (i.name.clone(), v.clone()))
        })
        .collect();

    let mut builder = TraceBuilder::new(action, instance.description.as_str(), manifest.origin());
    if let Some(goal_id) = &goal.goal_id {
        builder = builder.with_goal_id(goal_id.as_str());
    }

    if let Some(bindings) = bindings {
        let mut pushed = 0usize;
        for (input, verdict) in action.inputs.iter().zip(&verdicts) {
            if !verdict.valid {
                continue;
            }
            if let Some(value) = instance.values.get(&input.name) {
                if bindings.locate(&input.name).is_some() {
                    bindings.push(&input.name, value);
                    pushed += 1;
                }
            }
        }
        steps.record(format!(
            "Pushed {pushed} validated value(s) to {}",
            bindings.origin()
        ));
        builder = builder.with_binding_provenance(bindings.origin());
    }

    if all_valid {
        steps.record("All input constraints satisfied");
    } else {
        steps.record("Validation failed; execution not attempted");
    }

    Ok(builder
        .with_inputs(used)
        .with_verdicts(verdicts)
        .with_steps(steps)
        .build())
}
