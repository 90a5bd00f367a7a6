use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::error::ReconError;
use crate::ranking::PriorityRanking;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub key_columns: Vec<String>,
    pub value_column: String,
    /// Collection being updated.
    #[serde(default)]
    pub target: Option<InputConfig>,
    /// Collection supplying candidate replacements.
    #[serde(default)]
    pub source: Option<InputConfig>,
    /// Category → rank. Replaces the built-in table when present.
    #[serde(default)]
    pub priority: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Inputs + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// CSV path, relative to the config file.
    pub file: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        validate_columns(&self.key_columns, &self.value_column)?;
        self.ranking()?;
        Ok(())
    }

    /// The configured ranking, or the built-in one when `[priority]` is absent.
    pub fn ranking(&self) -> Result<PriorityRanking, ReconError> {
        match &self.priority {
            None => Ok(PriorityRanking::default()),
            Some(table) if table.is_empty() => Err(ReconError::ConfigValidation(
                "[priority] table is empty; omit it to use the default ranking".into(),
            )),
            Some(table) => PriorityRanking::new(table.iter().map(|(k, &v)| (k, v))),
        }
    }
}

/// Column-role checks shared by the config and `Reconciler::new`.
pub fn validate_columns(key_columns: &[String], value_column: &str) -> Result<(), ReconError> {
    if key_columns.is_empty() {
        return Err(ReconError::ConfigValidation(
            "at least one key column is required".into(),
        ));
    }

    let mut seen = HashSet::new();
    for key in key_columns {
        if key.trim().is_empty() {
            return Err(ReconError::ConfigValidation("key column names must not be blank".into()));
        }
        if !seen.insert(key.as_str()) {
            return Err(ReconError::ConfigValidation(format!(
                "key column '{key}' is listed twice"
            )));
        }
    }

    if value_column.trim().is_empty() {
        return Err(ReconError::ConfigValidation("value column name must not be blank".into()));
    }
    if seen.contains(value_column) {
        return Err(ReconError::ConfigValidation(format!(
            "value column '{value_column}' cannot also be a key column"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Host inventory"
key_columns = ["ip", "computer_name"]
value_column = "ценность"

[target]
file = "inventory.csv"

[source]
file = "scan.csv"

[output]
csv = "merged.csv"
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Host inventory");
        assert_eq!(config.key_columns, vec!["ip", "computer_name"]);
        assert_eq!(config.value_column, "ценность");
        assert_eq!(config.target.as_ref().unwrap().file, "inventory.csv");
        assert_eq!(config.source.as_ref().unwrap().file, "scan.csv");
        assert_eq!(config.output.csv.as_deref(), Some("merged.csv"));
        assert!(config.output.json.is_none());
        assert!(config.priority.is_none());
    }

    #[test]
    fn default_ranking_when_priority_absent() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.ranking().unwrap(), PriorityRanking::default());
    }

    #[test]
    fn priority_table_replaces_default() {
        let input = format!(
            r#"{VALID}
[priority]
critical = 10
"Low" = 1
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        let ranking = config.ranking().unwrap();
        assert_eq!(ranking.rank_str("critical"), 10);
        assert_eq!(ranking.rank_str("low"), 1);
        assert_eq!(ranking.rank_str("важно"), 0);
    }

    #[test]
    fn reject_empty_priority_table() {
        let input = format!("{VALID}\n[priority]\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn reject_negative_rank() {
        let input = format!("{VALID}\n[priority]\nlow = -1\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_colliding_priorities() {
        let input = format!("{VALID}\n[priority]\nHigh = 3\nhigh = 2\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn inputs_are_optional() {
        let config = ReconConfig::from_toml(
            r#"
name = "Engine only"
key_columns = ["id"]
value_column = "tier"
"#,
        )
        .unwrap();
        assert!(config.target.is_none());
        assert!(config.source.is_none());
    }

    #[test]
    fn reject_empty_keys() {
        let err = ReconConfig::from_toml(
            r#"
name = "Bad"
key_columns = []
value_column = "tier"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least one key column"));
    }

    #[test]
    fn reject_duplicate_key() {
        let err = ReconConfig::from_toml(
            r#"
name = "Bad"
key_columns = ["ip", "ip"]
value_column = "tier"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'ip' is listed twice"));
    }

    #[test]
    fn reject_value_column_in_keys() {
        let err = ReconConfig::from_toml(
            r#"
name = "Bad"
key_columns = ["ip", "tier"]
value_column = "tier"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot also be a key column"));
    }

    #[test]
    fn reject_missing_value_column() {
        let err = ReconConfig::from_toml(
            r#"
name = "Bad"
key_columns = ["ip"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
