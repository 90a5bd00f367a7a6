//! Category → rank table used to decide which side of a match wins.

use std::collections::HashMap;

use crate::error::ReconError;
use crate::table::Value;

/// Canonical host-value categories, highest first.
pub const DEFAULT_PRIORITIES: [(&str, u32); 5] = [
    ("важно", 5),
    ("очень важно", 4),
    ("средне", 3),
    ("не очень", 2),
    ("пусто", 1),
];

/// Lower-case and trim a raw category.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps normalized categories to ranks. Higher wins; anything not in the
/// table ranks 0, below every listed category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRanking {
    ranks: HashMap<String, u32>,
}

impl PriorityRanking {
    /// Build a ranking from raw entries. Entries are normalized; two entries
    /// that normalize to the same category must agree on the rank.
    pub fn new<I, S>(entries: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut ranks: HashMap<String, u32> = HashMap::new();
        for (raw, rank) in entries {
            let key = normalize(raw.as_ref());
            if key.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "priority categories must not be blank".into(),
                ));
            }
            if let Some(&existing) = ranks.get(&key) {
                if existing != rank {
                    return Err(ReconError::ConfigValidation(format!(
                        "priority '{}' is listed with ranks {existing} and {rank}",
                        key
                    )));
                }
            }
            ranks.insert(key, rank);
        }
        Ok(Self { ranks })
    }

    pub fn rank_str(&self, raw: &str) -> u32 {
        self.ranks.get(&normalize(raw)).copied().unwrap_or(0)
    }

    pub fn rank(&self, value: &Value) -> u32 {
        value.as_category().map(|c| self.rank_str(&c)).unwrap_or(0)
    }

    /// Whether the value names a category present in the table.
    pub fn is_ranked(&self, value: &Value) -> bool {
        value
            .as_category()
            .is_some_and(|c| self.ranks.contains_key(&normalize(&c)))
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Entries sorted by rank descending, then category.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut out: Vec<(&str, u32)> = self.ranks.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }
}

impl Default for PriorityRanking {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_PRIORITIES
                .iter()
                .map(|&(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}
