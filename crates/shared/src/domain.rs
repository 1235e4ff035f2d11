use serde::{Deserialize, Serialize};

/// One tracked entity. `name` is unique within the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub status: f64,
}

impl Record {
    pub fn new(name: impl Into<String>, status: f64) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Positive,
    Negative,
    Neutral,
}

/// Status value as it arrives from a bulk edit: a JSON number, free text, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub name: String,
    #[serde(default)]
    pub status: Option<RawStatus>,
}

impl RawRow {
    pub fn text(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Some(RawStatus::Text(status.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowIssueReason {
    /// Name was blank after trimming; the row was dropped.
    EmptyName,
    /// Name held a line break or other control character; the row was dropped.
    InvalidName,
    /// Status did not parse; the row was kept with status 0.
    InvalidStatus,
    /// A later row used the same name; this row was dropped.
    DuplicateName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub name: String,
    pub reason: RowIssueReason,
}
