//! Action resolver
//!
//! Matches a goal descriptor against the manifest's action catalog. The
//! reference policy is explicit goal-id matching; a keyword-overlap policy
//! exists for callers that only have free text. Either way resolution fails
//! closed: zero or multiple eligible actions is an error carrying the
//! candidate set, never a silent tie-break.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::manifest::{ActionSpec, ManifestSpec};

/// Raised when a goal cannot be matched to exactly one action.
///
/// Recoverable: the caller can retry with a more specific descriptor. The
/// candidate list is empty when nothing matched at all.
#[derive(Debug, Clone, Error)]
#[error("No single action for goal '{goal}' (candidates: {candidates:?})")]
pub struct ActionNotFoundError {
    /// The goal id or description that was being resolved.
    pub goal: String,
    /// Ids of the actions that qualified.
    pub candidates: Vec<String>,
}

/// Caller-stated objective to resolve against the catalog.
#[derive(Debug, Clone, Default)]
pub struct GoalDescriptor {
    /// Declared goal id, when the caller knows it.
    pub goal_id: Option<String>,
    /// Free-text goal description, used by the keyword policy.
    pub description: Option<String>,
}

impl GoalDescriptor {
    /// Descriptor naming a declared goal id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            goal_id: Some(id.into()),
            description: None,
        }
    }

    /// Descriptor carrying only a free-text description.
    pub fn by_description(text: impl Into<String>) -> Self {
        Self {
            goal_id: None,
            description: Some(text.into()),
        }
    }

    /// Goal text used in diagnostics.
    fn display(&self) -> String {
        self.goal_id
            .clone()
            .or_else(|| self.description.clone())
            .unwrap_or_else(|| "<unspecified goal>".to_string())
    }
}

/// How goal descriptors are matched to actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MatchPolicy {
    /// Match only on declared goal ids. The reference behavior.
    #[default]
    ExplicitId,
    /// Token-overlap score of the descriptor's description against each
    /// action's description; eligible above the threshold.
    KeywordOverlap { threshold: f64 },
}

/// Resolve a goal to exactly one action under the explicit-id policy.
pub fn resolve<'a>(
    manifest: &'a ManifestSpec,
    goal: &GoalDescriptor,
) -> Result<&'a ActionSpec, ActionNotFoundError> {
    resolve_with_policy(manifest, goal, &MatchPolicy::ExplicitId)
}

/// Resolve a goal to exactly one action under the given policy.
///
/// Deterministic for a fixed manifest + descriptor; performs no side
/// effects beyond a debug log line.
pub fn resolve_with_policy<'a>(
    manifest: &'a ManifestSpec,
    goal: &GoalDescriptor,
    policy: &MatchPolicy,
) -> Result<&'a ActionSpec, ActionNotFoundError> {
    let candidates = match policy {
        MatchPolicy::ExplicitId => explicit_candidates(manifest, goal),
        MatchPolicy::KeywordOverlap { threshold } => {
            keyword_candidates(manifest, goal, *threshold)
        }
    };

    if candidates.len() == 1 {
        let action = candidates[0];
        debug!(action = %action.id, goal = %goal.display(), "resolved goal");
        return Ok(action);
    }

    Err(ActionNotFoundError {
        goal: goal.display(),
        candidates: candidates.iter().map(|a| a.id.clone()).collect(),
    })
}

fn explicit_candidates<'a>(manifest: &'a ManifestSpec, goal: &GoalDescriptor) -> Vec<&'a ActionSpec> {
    let id = match &goal.goal_id {
        Some(id) => id,
        None => return Vec::new(),
    };

    let eligible: Vec<&ActionSpec> = manifest.actions.iter().filter(|a| a.serves(id)).collect();

    // A single-action catalog may also be addressed by that action's own id.
    if eligible.is_empty() && manifest.actions.len() == 1 && manifest.actions[0].id == *id {
        return vec![&manifest.actions[0]];
    }

    eligible
}

fn keyword_candidates<'a>(
    manifest: &'a ManifestSpec,
    goal: &GoalDescriptor,
    threshold: f64,
) -> Vec<&'a ActionSpec> {
    // With an explicit id in hand, the heuristic defers to it.
    if goal.goal_id.is_some() {
        return explicit_candidates(manifest, goal);
    }

    let text = match &goal.description {
        Some(text) => text,
        None => return Vec::new(),
    };
    let goal_tokens = tokens(text);

    manifest
        .actions
        .iter()
        .filter(|a| overlap_score(&goal_tokens, &a.description) > threshold)
        .collect()
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// Share of the goal's tokens that also occur in the action description.
fn overlap_score(goal_tokens: &HashSet<String>, action_description: &str) -> f64 {
    if goal_tokens.is_empty() {
        return 0.0;
    }
    let action_tokens = tokens(action_description);
    let shared = goal_tokens.intersection(&action_tokens).count();
    shared as f64 / goal_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestSpec;
    use serde_json::json;

    fn catalog(actions: serde_json::Value, goals: serde_json::Value) -> ManifestSpec {
        ManifestSpec::from_value(json!({ "goals": goals, "actions": actions })).expect("manifest")
    }

    fn flight_catalog() -> ManifestSpec {
        catalog(
            json!([{
                "id": "search_flights",
                "title": "Search flights",
                "description": "Search round-trip flights between two airports",
                "goals": ["find_flight"]
            }]),
            json!([{ "id": "find_flight", "description": "Find a flight" }]),
        )
    }

    #[test]
    fn test_resolves_by_declared_goal_id() {
        let manifest = flight_catalog();
        let action = resolve(&manifest, &GoalDescriptor::by_id("find_flight")).expect("resolve");
        assert_eq!(action.id, "search_flights");
    }

    #[test]
    fn test_unknown_goal_id_fails_with_empty_candidates() {
        let manifest = flight_catalog();
        let err = resolve(&manifest, &GoalDescriptor::by_id("book_hotel")).unwrap_err();
        assert_eq!(err.goal, "book_hotel");
        assert!(err.candidates.is_empty());
    }

    #[test]
    fn test_ambiguous_goal_fails_with_all_candidates() {
        let manifest = catalog(
            json!([
                {
                    "id": "search_flights",
                    "title": "Search",
                    "description": "Search flights",
                    "goals": ["find_flight"]
                },
                {
                    "id": "search_flights_flexible",
                    "title": "Flexible search",
                    "description": "Search flights with flexible dates",
                    "goals": ["find_flight"]
                }
            ]),
            json!([{ "id": "find_flight", "description": "Find a flight" }]),
        );
        let err = resolve(&manifest, &GoalDescriptor::by_id("find_flight")).unwrap_err();
        assert_eq!(
            err.candidates,
            vec!["search_flights".to_string(), "search_flights_flexible".to_string()]
        );
    }

    #[test]
    fn test_single_action_catalog_resolvable_by_action_id() {
        let manifest = flight_catalog();
        let action =
            resolve(&manifest, &GoalDescriptor::by_id("search_flights")).expect("resolve");
        assert_eq!(action.id, "search_flights");
    }

    #[test]
    fn test_action_id_shortcut_requires_single_action_catalog() {
        let manifest = catalog(
            json!([
                {
                    "id": "search_flights",
                    "title": "Search",
                    "description": "Search flights",
                    "goals": ["find_flight"]
                },
                {
                    "id": "track_price",
                    "title": "Track",
                    "description": "Track fares",
                    "goals": ["watch_price"]
                }
            ]),
            json!([
                { "id": "find_flight", "description": "Find a flight" },
                { "id": "watch_price", "description": "Watch a fare" }
            ]),
        );
        let err = resolve(&manifest, &GoalDescriptor::by_id("search_flights")).unwrap_err();
        assert!(err.candidates.is_empty());
    }

    #[test]
    fn test_keyword_overlap_resolves_free_text_goal() {
        let manifest = flight_catalog();
        let goal = GoalDescriptor::by_description("search flights between airports");
        let action = resolve_with_policy(
            &manifest,
            &goal,
            &MatchPolicy::KeywordOverlap { threshold: 0.5 },
        )
        .expect("resolve");
        assert_eq!(action.id, "search_flights");
    }

    #[test]
    fn test_keyword_overlap_below_threshold_fails_closed() {
        let manifest = flight_catalog();
        let goal = GoalDescriptor::by_description("order a pizza");
        let err = resolve_with_policy(
            &manifest,
            &goal,
            &MatchPolicy::KeywordOverlap { threshold: 0.5 },
        )
        .unwrap_err();
        assert!(err.candidates.is_empty());
    }

    #[test]
    fn test_free_text_fails_under_explicit_id_policy() {
        // The reference policy never falls back to the heuristic.
        let manifest = flight_catalog();
        let goal = GoalDescriptor::by_description("search flights between airports");
        assert!(resolve(&manifest, &goal).is_err());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let manifest = flight_catalog();
        let goal = GoalDescriptor::by_id("find_flight");
        let first = resolve(&manifest, &goal).expect("first");
        let second = resolve(&manifest, &goal).expect("second");
        assert_eq!(first.id, second.id);
    }
}
