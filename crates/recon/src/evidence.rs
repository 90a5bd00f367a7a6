use crate::model::{ReconSummary, RowDecision, RowOutcome};

/// Source-side counts the row decisions cannot see.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    pub rows: usize,
    pub source_only: usize,
    pub unranked: usize,
}

/// Compute summary statistics from per-row decisions.
pub fn compute_summary(decisions: &[RowDecision], source: SourceStats) -> ReconSummary {
    let mut summary = ReconSummary {
        target_rows: decisions.len(),
        source_rows: source.rows,
        source_only: source.source_only,
        unranked_source: source.unranked,
        ..ReconSummary::default()
    };

    for d in decisions {
        match d.outcome {
            RowOutcome::Unmatched => summary.unmatched += 1,
            RowOutcome::Kept => summary.kept += 1,
            RowOutcome::Replaced => summary.replaced += 1,
        }
        if d.candidates > 1 {
            summary.multi_match += 1;
        }
        if !d.target_ranked {
            summary.unranked_target += 1;
        }
    }

    summary
}
