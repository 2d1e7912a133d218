//! Summary statistics over a recommendation set

use crate::models::{AggregateStats, Recommendation};

/// Count, mean confidence and judgment total for `recommendations`.
///
/// The mean is `None` for an empty set rather than a computed 0.
pub fn aggregate(recommendations: &[Recommendation]) -> AggregateStats {
    let section_count = recommendations.len();
    let mean_confidence = if section_count == 0 {
        None
    } else {
        let total: f64 = recommendations.iter().map(|r| r.score).sum();
        Some(total / section_count as f64)
    };
    let total_judgments = recommendations.iter().map(|r| r.judgments.len()).sum();

    AggregateStats {
        section_count,
        mean_confidence,
        total_judgments,
    }
}
