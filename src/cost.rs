// C6: Cost Estimator. Rule-based per-engine time/memory estimates,
// tunable parameters rather than a learned model — the same posture
// the teacher's `cost_model.rs` takes for its own cardinality estimates.
//
// The three [`EngineProfile`]s and their constants are carried over
// verbatim from `original_source`'s `cost_estimator.py` (DuckDB/Polars/
// Spark stand-ins renamed to the generic single-columnar/parallel/
// distributed engine classes named in spec §6).

use crate::features::QueryFeatures;

/// Declarative characteristics of one query engine class. Spec §6
/// names three defaults; additional profiles can be registered without
/// touching the estimation logic below.
#[derive(Debug, Clone, Copy)]
pub struct EngineProfile {
    pub id: &'static str,
    pub scan_rate_gb_sec: f64,
    pub overhead_sec: f64,
    pub max_memory_gb: f64,
    /// Memory required per GB of scanned data, as a multiple.
    pub memory_factor: f64,
    pub join_cost: f64,
    pub agg_cost: f64,
    pub window_cost: f64,
    /// Below this scan size, the engine is penalized for fixed overhead
    /// not being worth paying. `None` means no such floor (single-node
    /// in-process engines have no meaningful minimum).
    pub min_efficient_size_gb: Option<f64>,
}

pub const SINGLE_COLUMNAR: EngineProfile = EngineProfile {
    id: "single-columnar",
    scan_rate_gb_sec: 2.0,
    overhead_sec: 0.1,
    max_memory_gb: 32.0,
    memory_factor: 3.0,
    join_cost: 1.0,
    agg_cost: 0.5,
    window_cost: 2.0,
    min_efficient_size_gb: None,
};

pub const PARALLEL: EngineProfile = EngineProfile {
    id: "parallel",
    scan_rate_gb_sec: 1.8,
    overhead_sec: 0.2,
    max_memory_gb: 64.0,
    memory_factor: 2.5,
    join_cost: 0.8,
    agg_cost: 0.4,
    window_cost: 1.5,
    min_efficient_size_gb: None,
};

pub const DISTRIBUTED: EngineProfile = EngineProfile {
    id: "distributed",
    scan_rate_gb_sec: 1.5,
    overhead_sec: 15.0,
    max_memory_gb: f64::INFINITY,
    memory_factor: 0.25, // spread across nodes, not a cap check
    join_cost: 0.6,
    agg_cost: 0.3,
    window_cost: 1.0,
    min_efficient_size_gb: Some(10.0),
};

/// Default profile set, in the declared-order used to break cost ties
/// (spec §4.7).
pub fn default_profiles() -> Vec<EngineProfile> {
    vec![SINGLE_COLUMNAR, PARALLEL, DISTRIBUTED]
}

#[derive(Debug, Clone)]
pub struct CostEstimate {
    pub engine_id: &'static str,
    pub estimated_time_sec: f64,
    pub estimated_memory_gb: f64,
    pub scan_cost_sec: f64,
    pub compute_cost_sec: f64,
    pub overhead_cost_sec: f64,
    pub reasoning: String,
    pub feasible: bool,
}

/// Estimates execution cost of `features` on `profile`.
pub fn estimate(profile: &EngineProfile, features: &QueryFeatures) -> CostEstimate {
    let data_size_gb = features.estimated_scan_size_gb;

    let scan_cost_sec = data_size_gb / profile.scan_rate_gb_sec;
    let compute_cost_sec = compute_cost(profile, features);
    let overhead_cost_sec = profile.overhead_sec;

    let estimated_memory_gb = if profile.id == DISTRIBUTED.id {
        // Distributed memory is spread across nodes; approximate with
        // a fraction of the scan size rather than checking a hard cap.
        data_size_gb * profile.memory_factor
    } else {
        data_size_gb * profile.memory_factor
    };

    if profile.id != DISTRIBUTED.id && estimated_memory_gb > profile.max_memory_gb {
        return CostEstimate {
            engine_id: profile.id,
            estimated_time_sec: f64::INFINITY,
            estimated_memory_gb,
            scan_cost_sec,
            compute_cost_sec,
            overhead_cost_sec,
            reasoning: format!(
                "insufficient memory (need {estimated_memory_gb:.1}GB, have {}GB)",
                profile.max_memory_gb
            ),
            feasible: false,
        };
    }

    let mut total_time_sec = scan_cost_sec + compute_cost_sec + overhead_cost_sec;
    let reasoning = if let Some(min_efficient) = profile.min_efficient_size_gb {
        if data_size_gb < min_efficient {
            let penalty = min_efficient / data_size_gb.max(0.1);
            total_time_sec *= penalty;
            format!(
                "inefficient for small data ({data_size_gb:.1}GB < {min_efficient}GB threshold)"
            )
        } else {
            "distributed execution optimal for large datasets".to_string()
        }
    } else if profile.id == SINGLE_COLUMNAR.id {
        "vectorized execution optimal for small-medium datasets".to_string()
    } else {
        "parallel execution good for medium datasets".to_string()
    };

    CostEstimate {
        engine_id: profile.id,
        estimated_time_sec: total_time_sec,
        estimated_memory_gb,
        scan_cost_sec,
        compute_cost_sec,
        overhead_cost_sec,
        reasoning,
        feasible: true,
    }
}

fn compute_cost(profile: &EngineProfile, features: &QueryFeatures) -> f64 {
    let mut cost = 0.0;
    cost += features.num_joins as f64 * profile.join_cost;
    cost += features.num_aggregations as f64 * profile.agg_cost;
    cost += features.num_window_functions as f64 * profile.window_cost;
    if features.has_distinct {
        cost += 1.0;
    }
    if features.has_order_by {
        cost += 0.5;
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn small_scan_favors_single_columnar_overhead() {
        let estimate = self::estimate(&SINGLE_COLUMNAR, &features(0.5));
        assert!(estimate.feasible);
        assert!(estimate.estimated_time_sec < 5.0);
    }

    #[test]
    fn huge_scan_exceeds_single_columnar_memory() {
        let estimate = self::estimate(&SINGLE_COLUMNAR, &features(20.0));
        assert!(!estimate.feasible);
        assert_eq!(estimate.estimated_time_sec, f64::INFINITY);
    }

    #[test]
    fn distributed_penalizes_small_data() {
        let small = self::estimate(&DISTRIBUTED, &features(1.0));
        let large = self::estimate(&DISTRIBUTED, &features(50.0));
        assert!(small.reasoning.contains("inefficient"));
        assert!(large.reasoning.contains("optimal"));
        assert!(small.estimated_time_sec > large.estimated_time_sec);
    }

    #[test]
    fn distributed_never_marked_infeasible_by_memory() {
        let estimate = self::estimate(&DISTRIBUTED, &features(10_000.0));
        assert!(estimate.feasible);
    }
}
