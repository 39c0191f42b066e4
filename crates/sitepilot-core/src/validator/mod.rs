//! Constraint validator
//!
//! Pure verdict computation for one input slot: (declaration, raw value) in,
//! `ValidationVerdict` out. No presentation surface, no I/O, no state; the
//! same pair always yields the same verdict.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::manifest::{ConstraintSpec, FormatKind, InputSpec};

/// Verdict message for a value that satisfied its constraint.
pub const REASON_PASSED: &str = "Passed";
/// Verdict message when no constraint applied (optional absent value, or no
/// constraint declared).
pub const REASON_NO_CONSTRAINTS: &str = "No constraints";
/// Verdict message for a required slot with no usable value.
pub const REASON_REQUIRED_EMPTY: &str = "Required field empty";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern"));

/// Per-slot validation outcome.
///
/// A failed validation is an expected, reportable result, not a program
/// fault; it travels inside the trace as data. `reason` is one of the fixed
/// verdict messages; callers never re-derive these from raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Input slot name.
    pub slot: String,
    /// Whether the value may be used.
    pub valid: bool,
    /// Fixed verdict message.
    pub reason: String,
}

impl ValidationVerdict {
    fn pass(slot: &str) -> Self {
        Self {
            slot: slot.to_string(),
            valid: true,
            reason: REASON_PASSED.to_string(),
        }
    }

    fn unconstrained(slot: &str) -> Self {
        Self {
            slot: slot.to_string(),
            valid: true,
            reason: REASON_NO_CONSTRAINTS.to_string(),
        }
    }

    fn fail(slot: &str, reason: impl Into<String>) -> Self {
        Self {
            slot: slot.to_string(),
            valid: false,
            reason: reason.into(),
        }
    }
}

/// Validate one raw value against its input declaration.
///
/// Evaluation order is fixed: the required-empty check runs first, then
/// optional absence, then the declared constraint. An empty string counts as
/// absent.
pub fn validate(spec: &InputSpec, raw: Option<&str>) -> ValidationVerdict {
    let value = match raw {
        Some(v) if !v.is_empty() => v,
        _ => {
            if spec.required {
                return ValidationVerdict::fail(&spec.name, REASON_REQUIRED_EMPTY);
            }
            return ValidationVerdict::unconstrained(&spec.name);
        }
    };

    let constraint = match &spec.constraint {
        Some(c) => c,
        None => return ValidationVerdict::unconstrained(&spec.name),
    };

    match constraint {
        ConstraintSpec::Pattern { regex, description } => {
            if full_match(regex, value) {
                ValidationVerdict::pass(&spec.name)
            } else {
                ValidationVerdict::fail(&spec.name, format!("Invalid format: {description}"))
            }
        }
        ConstraintSpec::Format {
            kind: FormatKind::DateRange,
            description,
        } => {
            if is_date_range(value) {
                ValidationVerdict::pass(&spec.name)
            } else {
                ValidationVerdict::fail(&spec.name, format!("Invalid format: {description}"))
            }
        }
        ConstraintSpec::NumericMinimum {
            minimum,
            description,
            ..
        } => match value.trim().parse::<f64>() {
            Ok(parsed) if parsed >= *minimum => ValidationVerdict::pass(&spec.name),
            _ => ValidationVerdict::fail(&spec.name, description.clone()),
        },
    }
}

/// Whether the whole value matches the pattern.
fn full_match(pattern: &str, value: &str) -> bool {
    // Manifest load compiles every declared pattern, so a failure here can
    // only come from a hand-built spec; treat it as a non-match.
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

/// Two ISO dates joined by exactly one `/`. Chronological order between the
/// halves is intentionally not checked.
fn is_date_range(value: &str) -> bool {
    let parts: Vec<&str> = value.split('/').collect();
    parts.len() == 2 && parts.iter().all(|p| ISO_DATE.is_match(p))
}
