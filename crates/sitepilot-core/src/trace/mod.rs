//! Trace builder
//!
//! Assembles the immutable audit record for one resolve-validate invocation:
//! goal, resolved action, input snapshot, per-slot verdicts, ordered step
//! log, and provenance. Serialized field names on `TraceRecord` are a wire
//! contract consumed structurally by external audit tooling.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::manifest::ActionSpec;
use crate::validator::ValidationVerdict;

/// Fixed summary used whenever any verdict failed. No partial-success
/// wording exists.
pub const SUMMARY_VALIDATION_FAILED: &str = "Validation failed. Cannot proceed to execution.";

/// One entry in the ordered step log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position, strictly increasing.
    pub step: u32,
    /// Instant the step was recorded.
    pub time: DateTime<Utc>,
    /// What was decided.
    pub note: String,
}

/// Append-only step log.
///
/// Numbering is assigned on append, so the 1-based strictly-increasing
/// invariant holds by construction. The log orders by append, never by
/// timestamp; presentation pacing stays outside the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    records: Vec<StepRecord>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step stamped with the current instant.
    pub fn record(&mut self, note: impl Into<String>) {
        self.record_at(Utc::now(), note);
    }

    /// Append a step with a caller-supplied instant.
    pub fn record_at(&mut self, time: DateTime<Utc>, note: impl Into<String>) {
        let step = self.records.len() as u32 + 1;
        self.records.push(StepRecord {
            step,
            time,
            note: note.into(),
        });
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Origin class for data used in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceSource {
    Manifest,
    Binding,
}

/// Origin reference for one contributing data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub source: ProvenanceSource,
    pub detail: String,
}

impl ProvenanceEntry {
    pub fn manifest(detail: impl Into<String>) -> Self {
        Self {
            source: ProvenanceSource::Manifest,
            detail: detail.into(),
        }
    }

    pub fn binding(detail: impl Into<String>) -> Self {
        Self {
            source: ProvenanceSource::Binding,
            detail: detail.into(),
        }
    }
}

/// Immutable audit record of one resolve-validate pipeline invocation.
///
/// The serialized field names (`traceId`, `goal`, `goalId`, `actionId`,
/// `inputs`, `validationResults`, `steps`, `resultSummary`, `provenance`)
/// are parsed by external audit viewers and must not be renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    /// Unique per invocation; never reused.
    pub trace_id: String,
    /// Goal description as stated by the caller.
    pub goal: String,
    /// Declared goal id, when the caller supplied one.
    pub goal_id: Option<String>,
    /// Id of the resolved action.
    pub action_id: String,
    /// Snapshot of the values the invocation used.
    pub inputs: BTreeMap<String, String>,
    /// Per-slot verdicts in the action's declared input order.
    pub validation_results: Vec<ValidationVerdict>,
    /// Ordered step log.
    pub steps: Vec<StepRecord>,
    /// Derived outcome summary.
    pub result_summary: String,
    /// Origins of the data that fed this trace.
    pub provenance: Vec<ProvenanceEntry>,
}

/// Builder for one `TraceRecord`.
///
/// Steps are taken as-is: the builder never reorders or deduplicates. Every
/// built record carries the manifest provenance entry seeded at
/// construction; binding provenance is added only when a binding source was
/// actually consulted.
pub struct TraceBuilder {
    action_id: String,
    dry_run: bool,
    goal: String,
    goal_id: Option<String>,
    inputs: BTreeMap<String, String>,
    verdicts: Vec<ValidationVerdict>,
    steps: Vec<StepRecord>,
    provenance: Vec<ProvenanceEntry>,
}

impl TraceBuilder {
    /// Start a trace for a resolved action. `manifest_origin` becomes the
    /// record's mandatory manifest provenance entry.
    pub fn new(
        action: &ActionSpec,
        goal: impl Into<String>,
        manifest_origin: impl Into<String>,
    ) -> Self {
        Self {
            action_id: action.id.clone(),
            dry_run: action.execution_policy.dry_run_default,
            goal: goal.into(),
            goal_id: None,
            inputs: BTreeMap::new(),
            verdicts: Vec::new(),
            steps: Vec::new(),
            provenance: vec![ProvenanceEntry::manifest(manifest_origin)],
        }
    }

    /// Record the declared goal id the caller resolved through.
    pub fn with_goal_id(mut self, goal_id: impl Into<String>) -> Self {
        self.goal_id = Some(goal_id.into());
        self
    }

    /// Snapshot of the input values used.
    pub fn with_inputs(mut self, inputs: BTreeMap<String, String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Verdicts in the action's declared input order.
    pub fn with_verdicts(mut self, verdicts: Vec<ValidationVerdict>) -> Self {
        self.verdicts = verdicts;
        self
    }

    /// Pre-ordered step log.
    pub fn with_steps(mut self, steps: StepLog) -> Self {
        self.steps = steps.into_records();
        self
    }

    /// Note that a binding source contributed to this invocation.
    pub fn with_binding_provenance(mut self, detail: impl Into<String>) -> Self {
        self.provenance.push(ProvenanceEntry::binding(detail));
        self
    }

    /// Finalize the record. The trace id is freshly generated; two builds
    /// never share one.
    pub fn build(self) -> TraceRecord {
        let result_summary = summarize(&self.goal, &self.action_id, self.dry_run, &self.verdicts);
        TraceRecord {
            trace_id: uuid::Uuid::new_v4().to_string(),
            goal: self.goal,
            goal_id: self.goal_id,
            action_id: self.action_id,
            inputs: self.inputs,
            validation_results: self.verdicts,
            steps: self.steps,
            result_summary,
            provenance: self.provenance,
        }
    }
}

fn summarize(goal: &str, action_id: &str, dry_run: bool, verdicts: &[ValidationVerdict]) -> String {
    if verdicts.iter().any(|v| !v.valid) {
        return SUMMARY_VALIDATION_FAILED.to_string();
    }
    let mode = if dry_run { "dry-run mode" } else { "executed" };
    format!("Goal \"{goal}\" accomplished via {action_id} ({mode}).")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ExecutionPolicy;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn action(dry_run: bool) -> ActionSpec {
        ActionSpec {
            id: "search_flights".to_string(),
            title: "Search flights".to_string(),
            description: "Search flights".to_string(),
            goals: vec!["find_flight".to_string()],
            inputs: Vec::new(),
            outputs: Vec::new(),
            ui_hint: None,
            execution_policy: ExecutionPolicy {
                dry_run_default: dry_run,
            },
        }
    }

    fn verdict(slot: &str, valid: bool, reason: &str) -> ValidationVerdict {
        ValidationVerdict {
            slot: slot.to_string(),
            valid,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_step_log_numbering_starts_at_one_and_increases() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let mut log = StepLog::new();
        log.record_at(t0, "resolve");
        log.record_at(t0, "validate origin");
        log.record_at(t0, "validate destination");

        let steps: Vec<u32> = log.records().iter().map(|r| r.step).collect();
        assert_eq!(steps, vec![1, 2, 3]);
    }

    #[test]
    fn test_builder_preserves_step_order_verbatim() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let t_earlier = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        let mut log = StepLog::new();
        log.record_at(t0, "first");
        // Appended later but timestamped earlier; append order wins.
        log.record_at(t_earlier, "second");

        let trace = TraceBuilder::new(&action(true), "goal", "origin")
            .with_steps(log)
            .build();
        assert_eq!(trace.steps[0].note, "first");
        assert_eq!(trace.steps[1].note, "second");
        assert_eq!(trace.steps[1].step, 2);
    }

    #[test]
    fn test_summary_dry_run_phrasing() {
        let trace = TraceBuilder::new(&action(true), "Fly out", "origin")
            .with_verdicts(vec![verdict("origin", true, "Passed")])
            .build();
        assert_eq!(
            trace.result_summary,
            "Goal \"Fly out\" accomplished via search_flights (dry-run mode)."
        );
    }

    #[test]
    fn test_summary_execute_phrasing() {
        let trace = TraceBuilder::new(&action(false), "Fly out", "origin")
            .with_verdicts(vec![verdict("origin", true, "Passed")])
            .build();
        assert_eq!(
            trace.result_summary,
            "Goal \"Fly out\" accomplished via search_flights (executed)."
        );
    }

    #[test]
    fn test_summary_is_fixed_failure_string_iff_any_verdict_invalid() {
        let trace = TraceBuilder::new(&action(true), "Fly out", "origin")
            .with_verdicts(vec![
                verdict("origin", true, "Passed"),
                verdict("max_budget", false, "Budget must be a number of at least 100 USD."),
            ])
            .build();
        assert_eq!(trace.result_summary, SUMMARY_VALIDATION_FAILED);
    }

    #[test]
    fn test_provenance_always_has_manifest_entry_and_may_have_no_binding() {
        let trace = TraceBuilder::new(&action(true), "goal", "manifests/flight_search.json").build();
        assert_eq!(trace.provenance.len(), 1);
        assert_eq!(trace.provenance[0].source, ProvenanceSource::Manifest);
        assert_eq!(trace.provenance[0].detail, "manifests/flight_search.json");
    }

    #[test]
    fn test_binding_provenance_is_appended_after_manifest_entry() {
        let trace = TraceBuilder::new(&action(true), "goal", "origin")
            .with_binding_provenance("dom-bindings")
            .build();
        assert_eq!(trace.provenance.len(), 2);
        assert_eq!(trace.provenance[1].source, ProvenanceSource::Binding);
    }

    #[test]
    fn test_trace_ids_are_unique_per_build() {
        let first = TraceBuilder::new(&action(true), "goal", "origin").build();
        let second = TraceBuilder::new(&action(true), "goal", "origin").build();
        assert_ne!(first.trace_id, second.trace_id);
    }

    #[test]
    fn test_trace_round_trips_through_json() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let mut log = StepLog::new();
        log.record_at(t0, "Resolved action 'search_flights'");
        log.record_at(t0, "Validated 'origin': Passed");

        let mut inputs = BTreeMap::new();
        inputs.insert("origin".to_string(), "SFO".to_string());

        let trace = TraceBuilder::new(&action(true), "Fly out", "origin")
            .with_goal_id("find_flight")
            .with_inputs(inputs)
            .with_verdicts(vec![verdict("origin", true, "Passed")])
            .with_steps(log)
            .build();

        let encoded = serde_json::to_string(&trace).expect("serialize");
        let decoded: TraceRecord = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, trace);
    }

    #[test]
    fn test_wire_field_names_are_stable() {
        let trace = TraceBuilder::new(&action(true), "goal", "origin")
            .with_goal_id("find_flight")
            .build();
        let value = serde_json::to_value(&trace).expect("serialize");
        let object = value.as_object().expect("object");
        for key in [
            "traceId",
            "goal",
            "goalId",
            "actionId",
            "inputs",
            "validationResults",
            "steps",
            "resultSummary",
            "provenance",
        ] {
            assert!(object.contains_key(key), "missing wire field {key}");
        }
    }
}
