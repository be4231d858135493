//! Fan-in aggregation of module results
//!
//! Pure functions: counts, ROI and the performance-scaled next-run delay.

use shared::ModuleResult;
use std::time::Duration;

/// Average performance assumed when no module succeeded
pub const DEFAULT_AVERAGE_PERFORMANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunAggregate {
    pub success_count: usize,
    pub failure_count: usize,
    pub estimated_roi: f64,
    pub average_performance: f64,
}

/// Aggregate settled module results for one run
pub fn aggregate(results: &[ModuleResult], confidence_score: f64) -> RunAggregate {
    let reports: Vec<_> = results.iter().filter_map(ModuleResult::report).collect();
    let success_count = reports.len();
    let failure_count = results.len() - success_count;

    let confidence = if confidence_score.is_finite() {
        confidence_score.max(0.0)
    } else {
        0.0
    };

    // Zero investment contributes nothing rather than dividing by zero
    let roi: f64 = reports
        .iter()
        .filter(|report| report.investment > 0.0)
        .map(|report| report.estimated_return * confidence / report.investment)
        .sum();

    let average_performance = if reports.is_empty() {
        DEFAULT_AVERAGE_PERFORMANCE
    } else {
        reports.iter().map(|report| report.performance).sum::<f64>() / reports.len() as f64
    };

    RunAggregate {
        success_count,
        failure_count,
        estimated_roi: if roi.is_finite() { roi.max(0.0) } else { 0.0 },
        average_performance,
    }
}

/// `base × (1 + average_performance)`, rounded to the millisecond
pub fn next_run_delay(base: Duration, average_performance: f64) -> Duration {
    let factor = 1.0 + average_performance.clamp(0.0, 1.0);
    let millis = (base.as_millis() as f64 * factor).round();
    Duration::from_millis(millis as u64)
}
