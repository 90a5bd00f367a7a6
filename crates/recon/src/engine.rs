use crate::config::{validate_columns, ReconConfig};
use crate::error::{ReconError, Side};
use crate::evidence::{compute_summary, SourceStats};
use crate::matcher::{key_of, match_by_key};
use crate::model::{ReconMeta, Reconciliation, RowDecision, RowOutcome};
use crate::ranking::PriorityRanking;
use crate::table::{RecordSet, Value};

/// Positions of the key and value columns within one record set.
struct Layout {
    keys: Vec<usize>,
    value: usize,
}

/// Overwrites target records with higher-priority source records that share
/// their key.
///
/// Configuration is fixed at construction; a `Reconciler` holds no mutable
/// state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Reconciler {
    key_columns: Vec<String>,
    value_column: String,
    ranking: PriorityRanking,
}

impl Reconciler {
    pub fn new<I, S>(
        key_columns: I,
        value_column: impl Into<String>,
        ranking: PriorityRanking,
    ) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_columns: Vec<String> = key_columns.into_iter().map(Into::into).collect();
        let value_column = value_column.into();
        validate_columns(&key_columns, &value_column)?;
        Ok(Self {
            key_columns,
            value_column,
            ranking,
        })
    }

    pub fn from_config(config: &ReconConfig) -> Result<Self, ReconError> {
        Self::new(
            config.key_columns.iter().cloned(),
            config.value_column.clone(),
            config.ranking()?,
        )
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn ranking(&self) -> &PriorityRanking {
        &self.ranking
    }

    /// Report metadata describing this reconciler.
    pub fn meta(&self, config_name: &str) -> ReconMeta {
        ReconMeta {
            config_name: config_name.to_string(),
            key_columns: self.key_columns.clone(),
            value_column: self.value_column.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check that `set` carries every key column and the value column.
    pub fn validate(&self, set: &RecordSet, side: Side) -> Result<(), ReconError> {
        self.layout(set, side).map(|_| ())
    }

    /// Reconcile `source` into `target`, returning the updated target.
    ///
    /// Never fails: if either input lacks a required column the error is
    /// logged and `target` is returned as-is.
    pub fn reconcile(&self, target: &RecordSet, source: &RecordSet) -> RecordSet {
        match self.try_reconcile(target, source) {
            Ok(result) => result.records,
            Err(e) => {
                log::error!("reconciliation skipped, target left unchanged: {e}");
                target.clone()
            }
        }
    }

    /// Strict variant of [`reconcile`](Self::reconcile): schema problems are
    /// returned instead of absorbed, and the per-row evidence is kept.
    pub fn try_reconcile(
        &self,
        target: &RecordSet,
        source: &RecordSet,
    ) -> Result<Reconciliation, ReconError> {
        let target_layout = self.layout(target, Side::Target)?;
        let source_layout = self.layout(source, Side::Source)?;

        // (target column, source column) for every non-key column both share.
        let transfer: Vec<(usize, usize)> = target
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !self.key_columns.contains(*name))
            .filter_map(|(ti, name)| source.column_index(name).map(|si| (ti, si)))
            .collect();

        let source_priority: Vec<u32> = source
            .rows()
            .iter()
            .map(|row| self.ranking.rank(&row[source_layout.value]))
            .collect();

        let keyed = match_by_key(target, &target_layout.keys, source, &source_layout.keys);
        if keyed.duplicate_source_keys > 0 {
            log::warn!(
                "{} source key(s) occur on more than one row; candidates are applied in source order",
                keyed.duplicate_source_keys
            );
        }

        let mut rows = Vec::with_capacity(target.len());
        let mut decisions = Vec::with_capacity(target.len());

        for m in &keyed.matches {
            let original = &target.rows()[m.target_row];
            let original_value = &original[target_layout.value];
            let target_priority = self.ranking.rank(original_value);

            let mut current: Option<Vec<Value>> = None;
            let mut priority = target_priority;
            let mut applied = Vec::new();

            for &si in &m.candidates {
                if source_priority[si] <= priority {
                    continue;
                }
                let base = current.as_deref().unwrap_or(original);
                current = Some(overlay(base, &source.rows()[si], &transfer));
                priority = source_priority[si];
                applied.push(si);
            }

            let outcome = if m.candidates.is_empty() {
                RowOutcome::Unmatched
            } else if applied.is_empty() {
                RowOutcome::Kept
            } else {
                RowOutcome::Replaced
            };

            decisions.push(RowDecision {
                target_row: m.target_row,
                key: key_of(original, &target_layout.keys).into_iter().cloned().collect(),
                outcome,
                candidates: m.candidates.len(),
                applied,
                target_priority,
                final_priority: priority,
                target_ranked: self.ranking.is_ranked(original_value),
            });
            rows.push(current.unwrap_or_else(|| original.clone()));
        }

        let unranked_source = source
            .rows()
            .iter()
            .filter(|row| !self.ranking.is_ranked(&row[source_layout.value]))
            .count();

        let summary = compute_summary(
            &decisions,
            SourceStats {
                rows: source.len(),
                source_only: keyed.source_only.len(),
                unranked: unranked_source,
            },
        );

        log::info!(
            "reconciled {} target row(s): {} replaced, {} kept, {} unmatched",
            summary.target_rows,
            summary.replaced,
            summary.kept,
            summary.unmatched
        );
        log::debug!("reconciliation summary: {summary:?}");

        Ok(Reconciliation {
            records: RecordSet {
                columns: target.columns().to_vec(),
                rows,
            },
            decisions,
            summary,
        })
    }

    fn layout(&self, set: &RecordSet, side: Side) -> Result<Layout, ReconError> {
        let missing: Vec<String> = self
            .key_columns
            .iter()
            .chain(std::iter::once(&self.value_column))
            .filter(|c| !set.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ReconError::MissingColumns { side, columns: missing });
        }

        let index = |name: &str| set.column_index(name).unwrap_or_default();
        Ok(Layout {
            keys: self.key_columns.iter().map(|c| index(c.as_str())).collect(),
            value: index(self.value_column.as_str()),
        })
    }
}

/// New record: `base` with every transferred column taken from `src`.
fn overlay(base: &[Value], src: &[Value], transfer: &[(usize, usize)]) -> Vec<Value> {
    let mut out = base.to_vec();
    for &(ti, si) in transfer {
        out[ti] = src[si].clone();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconciler() -> Reconciler {
        Reconciler::new(["ip", "name"], "value", PriorityRanking::default()).unwrap()
    }

    fn hosts(rows: &[(&str, &str, &str, &str)]) -> RecordSet {
        RecordSet::from_rows(
            ["ip", "name", "value", "x"],
            rows.iter()
                .map(|&(ip, name, value, x)| vec![ip.into(), name.into(), value.into(), x.into()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn higher_priority_source_replaces() {
        let target = hosts(&[("10.0.0.1", "PC-1", "пусто", "a")]);
        let source = hosts(&[("10.0.0.1", "PC-1", "очень важно", "b")]);
        let out = reconciler().reconcile(&target, &source);
        assert_eq!(out, hosts(&[("10.0.0.1", "PC-1", "очень важно", "b")]));
    }

    #[test]
    fn empty_source_is_passthrough() {
        let target = hosts(&[("10.0.0.2", "PC-2", "средне", "a")]);
        let source = RecordSet::new(["ip", "name", "value", "x"]).unwrap();
        assert_eq!(reconciler().reconcile(&target, &source), target);
    }

    #[test]
    fn tie_keeps_target() {
        let target = hosts(&[("10.0.0.1", "PC-1", "пусто", "a")]);
        let source = hosts(&[("10.0.0.1", "PC-1", "пусто", "b")]);
        let result = reconciler().try_reconcile(&target, &source).unwrap();
        assert_eq!(result.records, target);
        assert_eq!(result.decisions[0].outcome, RowOutcome::Kept);
    }

    #[test]
    fn lower_priority_source_ignored() {
        let target = hosts(&[("10.0.0.1", "PC-1", "важно", "a")]);
        let source = hosts(&[("10.0.0.1", "PC-1", "очень важно", "b")]);
        assert_eq!(reconciler().reconcile(&target, &source), target);
    }

    #[test]
    fn ranked_beats_unranked() {
        let target = hosts(&[("10.0.0.1", "PC-1", "что-то", "a")]);
        let source = hosts(&[("10.0.0.1", "PC-1", "пусто", "b")]);
        let result = reconciler().try_reconcile(&target, &source).unwrap();
        assert_eq!(result.records, hosts(&[("10.0.0.1", "PC-1", "пусто", "b")]));
        assert_eq!(result.decisions[0].target_priority, 0);
        assert!(!result.decisions[0].target_ranked);
    }

    #[test]
    fn cumulative_scan_over_duplicate_source_keys() {
        // 1 → 3 (replace), then 2 loses to 3, then 5 wins.
        let target = hosts(&[("10.0.0.1", "PC-1", "пусто", "t")]);
        let source = hosts(&[
            ("10.0.0.1", "PC-1", "средне", "s0"),
            ("10.0.0.1", "PC-1", "не очень", "s1"),
            ("10.0.0.1", "PC-1", "важно", "s2"),
        ]);
        let result = reconciler().try_reconcile(&target, &source).unwrap();
        assert_eq!(result.records, hosts(&[("10.0.0.1", "PC-1", "важно", "s2")]));
        let d = &result.decisions[0];
        assert_eq!(d.applied, vec![0, 2]);
        assert_eq!(d.candidates, 3);
        assert_eq!(d.final_priority, 5);
        assert_eq!(result.summary.multi_match, 1);
    }

    #[test]
    fn cumulative_scan_compares_against_updated_priority() {
        // The second candidate outranks the original target but not the
        // first replacement, so the first replacement stands.
        let target = hosts(&[("10.0.0.1", "PC-1", "пусто", "t")]);
        let source = hosts(&[
            ("10.0.0.1", "PC-1", "важно", "s0"),
            ("10.0.0.1", "PC-1", "средне", "s1"),
        ]);
        let out = reconciler().reconcile(&target, &source);
        assert_eq!(out, hosts(&[("10.0.0.1", "PC-1", "важно", "s0")]));
    }

    #[test]
    fn target_only_columns_untouched_and_source_only_columns_dropped() {
        let target = RecordSet::from_rows(
            ["owner", "ip", "name", "value", "x"],
            vec![vec!["ops".into(), "10.0.0.1".into(), "PC-1".into(), "пусто".into(), "a".into()]],
        )
        .unwrap();
        let source = RecordSet::from_rows(
            ["ip", "extra", "value", "name", "x"],
            vec![vec!["10.0.0.1".into(), 99.into(), "важно".into(), "PC-1".into(), "b".into()]],
        )
        .unwrap();
        let out = reconciler().reconcile(&target, &source);
        assert_eq!(out.columns(), target.columns());
        assert_eq!(
            out.rows()[0],
            vec![
                Value::from("ops"),
                Value::from("10.0.0.1"),
                Value::from("PC-1"),
                Value::from("важно"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn missing_value_column_returns_target_unchanged() {
        let target = hosts(&[("10.0.0.1", "PC-1", "пусто", "a")]);
        let source = RecordSet::from_rows(
            ["ip", "name", "x"],
            vec![vec!["10.0.0.1".into(), "PC-1".into(), "b".into()]],
        )
        .unwrap();
        let r = reconciler();
        assert_eq!(r.reconcile(&target, &source), target);
        let err = r.try_reconcile(&target, &source).unwrap_err();
        match err {
            ReconError::MissingColumns { side, columns } => {
                assert_eq!(side, Side::Source);
                assert_eq!(columns, vec!["value"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_key_in_target_reported_on_target_side() {
        let target = RecordSet::from_rows(["ip", "value"], vec![vec!["10.0.0.1".into(), "пусто".into()]])
            .unwrap();
        let source = hosts(&[("10.0.0.1", "PC-1", "важно", "b")]);
        let err = reconciler().try_reconcile(&target, &source).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumns { side: Side::Target, .. }));
        assert_eq!(reconciler().reconcile(&target, &source), target);
    }

    #[test]
    fn duplicate_target_keys_resolved_independently() {
        let target = hosts(&[
            ("10.0.0.1", "PC-1", "пусто", "a"),
            ("10.0.0.1", "PC-1", "важно", "b"),
        ]);
        let source = hosts(&[("10.0.0.1", "PC-1", "средне", "s")]);
        let out = reconciler().reconcile(&target, &source);
        assert_eq!(
            out,
            hosts(&[
                ("10.0.0.1", "PC-1", "средне", "s"),
                ("10.0.0.1", "PC-1", "важно", "b"),
            ])
        );
    }

    #[test]
    fn null_source_value_never_wins() {
        let target = hosts(&[("10.0.0.1", "PC-1", "неизвестно", "a")]);
        let source = RecordSet::from_rows(
            ["ip", "name", "value", "x"],
            vec![vec!["10.0.0.1".into(), "PC-1".into(), Value::Null, "b".into()]],
        )
        .unwrap();
        assert_eq!(reconciler().reconcile(&target, &source), target);
    }

    #[test]
    fn new_rejects_value_column_among_keys() {
        let err = Reconciler::new(["ip", "value"], "value", PriorityRanking::default()).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn reconciler_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
    }
}
