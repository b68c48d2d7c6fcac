// C7: Backend Selector. Picks the minimum-cost feasible engine from
// the estimates C6 produces, or honors an explicit override.
//
// Grounded on `original_source`'s `backend_selector.py`: same
// min-by-estimated-time selection, same reasoning-string shape
// ("Nx faster than Y" / "Y infeasible (reason)"), same multi-section
// `explain_selection` report format.

use crate::cost::{self, CostEstimate, EngineProfile};
use crate::features::QueryFeatures;
use crate::storage::pruning::PruningResult;

#[derive(Debug, Clone)]
pub struct BackendChoice {
    pub engine_id: &'static str,
    pub cost_estimate: CostEstimate,
    pub all_estimates: Vec<CostEstimate>,
    pub reasoning: String,
}

/// Selects an engine for `features` out of `profiles`. If
/// `force_engine_id` names a profile present in `profiles`, that engine
/// is chosen unconditionally (bypassing feasibility, per spec §4.7's
/// Open Question: an explicit override is a request to try anyway, the
/// dispatcher surfaces the resulting failure rather than the selector
/// silently overriding the caller's choice).
pub fn select(
    profiles: &[EngineProfile],
    features: &QueryFeatures,
    force_engine_id: Option<&str>,
) -> Option<BackendChoice> {
    let all_estimates: Vec<CostEstimate> = profiles
        .iter()
        .map(|profile| cost::estimate(profile, features))
        .collect();

    if let Some(forced) = force_engine_id {
        let chosen = all_estimates.iter().find(|e| e.engine_id == forced)?;
        return Some(BackendChoice {
            engine_id: chosen.engine_id,
            cost_estimate: chosen.clone(),
            reasoning: format!("forced to use {forced}"),
            all_estimates,
        });
    }

    let best = all_estimates
        .iter()
        .min_by(|a, b| a.estimated_time_sec.total_cmp(&b.estimated_time_sec))?
        .clone();

    let reasoning = build_reasoning(&best, &all_estimates);

    Some(BackendChoice {
        engine_id: best.engine_id,
        cost_estimate: best,
        all_estimates,
        reasoning,
    })
}

fn build_reasoning(selected: &CostEstimate, all_estimates: &[CostEstimate]) -> String {
    let mut comparisons = Vec::new();
    for estimate in all_estimates {
        if estimate.engine_id == selected.engine_id {
            continue;
        }
        if !estimate.feasible {
            comparisons.push(format!(
                "{} infeasible ({})",
                estimate.engine_id, estimate.reasoning
            ));
        } else {
            let speedup = estimate.estimated_time_sec / selected.estimated_time_sec;
            comparisons.push(format!("{speedup:.1}x faster than {}", estimate.engine_id));
        }
    }

    format!(
        "selected {}: {}. {}.",
        selected.engine_id,
        selected.reasoning,
        comparisons.join(", ")
    )
}

/// Multi-section human-readable explanation, for the orchestrator's
/// `explain()` report (spec §4.10): query analysis, pruning summary,
/// predicates applied, backend selection, and the full cost table.
pub fn explain_selection(
    tables: &[String],
    features: &QueryFeatures,
    pruning: &PruningResult,
    choice: &BackendChoice,
) -> String {
    let mut lines = Vec::new();

    lines.push("Query Analysis:".to_string());
    lines.push(format!("  Tables: {}", tables.join(", ")));
    lines.push(format!("  Joins: {}", features.num_joins));
    lines.push(format!("  Aggregations: {}", features.num_aggregations));
    lines.push(format!("  Window functions: {}", features.num_window_functions));
    lines.push(format!("  Has DISTINCT: {}", features.has_distinct));
    lines.push(format!("  Has ORDER BY: {}", features.has_order_by));
    lines.push(format!("  Complexity score: {:.1}", features.complexity_score()));

    lines.push("\nPartition Pruning:".to_string());
    lines.push(format!("  Total partitions: {}", pruning.total_count));
    lines.push(format!("  Partitions to scan: {}", pruning.kept.len()));
    lines.push(format!("  Data skipped: {:.1}%", pruning.pruning_ratio() * 100.0));
    lines.push(format!("  Estimated speedup: {:.1}x", pruning.speedup_estimate()));
    lines.push(format!(
        "  Data to scan: {:.2} GB",
        pruning.kept_size_bytes() as f64 / 1_073_741_824.0
    ));

    lines.push("\nPredicates Applied:".to_string());
    if pruning.predicates_applied.is_empty() {
        lines.push("  (none)".to_string());
    } else {
        for pred in &pruning.predicates_applied {
            lines.push(format!(
                "  - {} {} {}",
                pred.column,
                pred.operator.symbol(),
                pred.value
            ));
        }
    }

    lines.push(format!("\nSelected Engine: {}", choice.engine_id));
    lines.push(format!("Reasoning: {}", choice.reasoning));

    lines.push("\nCost Breakdown:".to_string());
    lines.push(format!(
        "  Estimated time: {:.2}s",
        choice.cost_estimate.estimated_time_sec
    ));
    lines.push(format!("  - Scan: {:.2}s", choice.cost_estimate.scan_cost_sec));
    lines.push(format!(
        "  - Compute: {:.2}s",
        choice.cost_estimate.compute_cost_sec
    ));
    lines.push(format!(
        "  - Overhead: {:.2}s",
        choice.cost_estimate.overhead_cost_sec
    ));
    lines.push(format!(
        "  Memory needed: {:.2} GB",
        choice.cost_estimate.estimated_memory_gb
    ));

    lines.push("\nAll Engine Estimates:".to_string());
    for estimate in &choice.all_estimates {
        if estimate.feasible {
            lines.push(format!(
                "  {}: {:.2}s",
                estimate.engine_id, estimate.estimated_time_sec
            ));
        } else {
            lines.push(format!("  {}: INFEASIBLE", estimate.engine_id));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::default_profiles;

    fn features(scan_gb: f64) -> QueryFeatures {
        QueryFeatures {
            estimated_scan_size_gb: scan_gb,
            num_joins: 0,
            num_aggregations: 0,
            num_window_functions: 0,
            has_distinct: false,
            has_order_by: false,
            selectivity: 1.0,
        }
    }

    #[test]
    fn picks_single_columnar_for_small_scan() {
        let choice = select(&default_profiles(), &features(0.5), None).unwrap();
        assert_eq!(choice.engine_id, "single-columnar");
    }

    #[test]
    fn picks_distributed_for_huge_scan() {
        let choice = select(&default_profiles(), &features(500.0), None).unwrap();
        assert_eq!(choice.engine_id, "distributed");
    }

    #[test]
    fn force_engine_bypasses_feasibility() {
        let choice = select(&default_profiles(), &features(500.0), Some("single-columnar")).unwrap();
        assert_eq!(choice.engine_id, "single-columnar");
        assert!(choice.reasoning.contains("forced"));
    }

    fn pruning_result() -> PruningResult {
        PruningResult {
            kept: Vec::new(),
            total_count: 4,
            total_size_bytes: 4096,
            total_files: 4,
            predicates_applied: vec![crate::sql::predicate::Predicate::eq("date", "2024-01-02")],
        }
    }

    #[test]
    fn explain_report_covers_all_five_sections() {
        let choice = select(&default_profiles(), &features(0.5), None).unwrap();
        let report = explain_selection(
            &["sales".to_string()],
            &features(0.5),
            &pruning_result(),
            &choice,
        );
        assert!(report.contains("Query Analysis:"));
        assert!(report.contains("Partition Pruning:"));
        assert!(report.contains("Predicates Applied:"));
        assert!(report.contains("date = 2024-01-02"));
        assert!(report.contains("Selected Engine: single-columnar"));
        assert!(report.contains("All Engine Estimates:"));
    }
}
