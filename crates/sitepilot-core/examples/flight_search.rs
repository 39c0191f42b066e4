//! Flight-search walkthrough
//!
//! This example demonstrates:
//! - Loading the example manifest
//! - Resolving a goal id to its action
//! - Running the validate pipeline and printing the audit trace

use sitepilot_core::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest = load_manifest(include_str!("../../../manifests/flight_search.json"))?
        .with_origin("manifests/flight_search.json");

    let goal = GoalDescriptor::by_id("find_flight");
    let instance = GoalInstance::new("Find a round-trip flight within a budget")
        .with_value("origin", "SFO")
        .with_value("destination", "JFK")
        .with_value("date_range", "2025-01-10/2025-01-15")
        .with_value("max_budget", "400");

    let trace = execute(&manifest, &goal, &instance)?;

    println!("{}", serde_json::to_string_pretty(&trace)?);
    println!("\n{}", trace.result_summary);
    Ok(())
}
