use std::fmt;

/// Which input a schema problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Target,
    Source,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Target => "target",
            Side::Source => "source",
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty key list, colliding priorities, etc.).
    ConfigValidation(String),
    /// Required key/value columns absent from one input.
    MissingColumns { side: Side, columns: Vec<String> },
    /// A record set header names the same column twice.
    DuplicateColumn(String),
    /// A row's width does not match the record set's column count.
    RowArity { row: usize, expected: usize, found: usize },
    /// CSV decode/encode error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumns { side, columns } => {
                write!(f, "{} is missing required column(s): {}", side.as_str(), columns.join(", "))
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
            Self::RowArity { row, expected, found } => {
                write!(f, "row {row}: expected {expected} value(s), found {found}")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_names_side_and_columns() {
        let err = ReconError::MissingColumns {
            side: Side::Source,
            columns: vec!["ip".into(), "ценность".into()],
        };
        assert_eq!(err.to_string(), "source is missing required column(s): ip, ценность");
    }

    #[test]
    fn row_arity_message() {
        let err = ReconError::RowArity { row: 3, expected: 4, found: 2 };
        assert!(err.to_string().contains("row 3"));
    }
}
