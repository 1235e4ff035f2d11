use serde::{Deserialize, Serialize};

use crate::domain::{RawRow, RowIssue, StatusColor};

/// What a renderer needs to draw one dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub name: String,
    pub status: f64,
    pub formatted_status: String,
    pub color: StatusColor,
    pub bar_width_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub rows: Vec<EntityRow>,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEntityRequest {
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustRequest {
    pub name: String,
    pub delta: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustOutcome {
    Applied,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustResponse {
    pub outcome: AdjustOutcome,
    pub view: DashboardView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReplaceRequest {
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReplaceResponse {
    pub issues: Vec<RowIssue>,
    pub view: DashboardView,
}
