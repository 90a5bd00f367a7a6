use serde::Serialize;

use crate::table::{RecordSet, Value};

// ---------------------------------------------------------------------------
// Key matching
// ---------------------------------------------------------------------------

/// One target row and the source rows sharing its key, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatch {
    pub target_row: usize,
    pub candidates: Vec<usize>,
}

#[derive(Debug)]
pub struct KeyMatchOutput {
    /// One entry per target row, in target order.
    pub matches: Vec<TargetMatch>,
    /// Source rows whose key appears nowhere in the target.
    pub source_only: Vec<usize>,
    /// Distinct source keys carried by more than one source row.
    pub duplicate_source_keys: usize,
}

// ---------------------------------------------------------------------------
// Per-row decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    /// No source row carries this key.
    Unmatched,
    /// Matched, but no candidate outranked the target.
    Kept,
    /// At least one candidate outranked the target and overwrote it.
    Replaced,
}

impl std::fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unmatched => write!(f, "unmatched"),
            Self::Kept => write!(f, "kept"),
            Self::Replaced => write!(f, "replaced"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowDecision {
    pub target_row: usize,
    pub key: Vec<Value>,
    pub outcome: RowOutcome,
    /// Number of source rows sharing the key.
    pub candidates: usize,
    /// Source rows that overwrote this record, in the order applied.
    pub applied: Vec<usize>,
    pub target_priority: u32,
    pub final_priority: u32,
    /// Whether the original value category is listed in the ranking.
    pub target_ranked: bool,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub target_rows: usize,
    pub source_rows: usize,
    pub unmatched: usize,
    pub kept: usize,
    pub replaced: usize,
    /// Target rows with more than one candidate.
    pub multi_match: usize,
    pub source_only: usize,
    pub unranked_target: usize,
    pub unranked_source: usize,
}

/// Updated target plus the evidence for how each row was decided.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub records: RecordSet,
    pub decisions: Vec<RowDecision>,
    pub summary: ReconSummary,
}

impl Reconciliation {
    pub fn report(&self, meta: ReconMeta) -> ReconReport {
        ReconReport {
            meta,
            summary: self.summary.clone(),
            rows: self.decisions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<RowDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub key_columns: Vec<String>,
    pub value_column: String,
    pub engine_version: String,
    pub run_at: String,
}
