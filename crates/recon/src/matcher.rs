use std::collections::{HashMap, HashSet};

use crate::model::{KeyMatchOutput, TargetMatch};
use crate::table::{RecordSet, Value};

/// Borrowed key tuple of a row.
pub fn key_of<'a>(row: &'a [Value], key_cols: &[usize]) -> Vec<&'a Value> {
    key_cols.iter().map(|&i| &row[i]).collect()
}

/// Source rows grouped by exact key, each group kept in source order.
pub struct KeyIndex<'a> {
    groups: HashMap<Vec<&'a Value>, Vec<usize>>,
}

impl<'a> KeyIndex<'a> {
    pub fn build(set: &'a RecordSet, key_cols: &[usize]) -> Self {
        let mut groups: HashMap<Vec<&'a Value>, Vec<usize>> = HashMap::new();
        for (i, row) in set.rows().iter().enumerate() {
            groups.entry(key_of(row, key_cols)).or_default().push(i);
        }
        Self { groups }
    }

    pub fn candidates(&self, key: &[&'a Value]) -> &[usize] {
        self.groups.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn duplicate_keys(&self) -> usize {
        self.groups.values().filter(|rows| rows.len() > 1).count()
    }
}

/// Left outer match of `target` against `source` by exact key equality.
///
/// Every target row yields exactly one `TargetMatch`, in target order. Key
/// columns are given by position in each set so the two headers may differ.
pub fn match_by_key(
    target: &RecordSet,
    target_keys: &[usize],
    source: &RecordSet,
    source_keys: &[usize],
) -> KeyMatchOutput {
    let index = KeyIndex::build(source, source_keys);
    let mut seen: HashSet<usize> = HashSet::new();

    let matches: Vec<TargetMatch> = target
        .rows()
        .iter()
        .enumerate()
        .map(|(ti, row)| {
            let candidates = index.candidates(&key_of(row, target_keys)).to_vec();
            seen.extend(candidates.iter().copied());
            TargetMatch {
                target_row: ti,
                candidates,
            }
        })
        .collect();

    let source_only = (0..source.len()).filter(|i| !seen.contains(i)).collect();

    KeyMatchOutput {
        matches,
        source_only,
        duplicate_source_keys: index.duplicate_keys(),
    }
}
