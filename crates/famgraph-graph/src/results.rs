//! Typed result rows, one struct per catalog entry.
//!
//! Rows are decoded immediately after execution so the metric engines never
//! handle open property maps. Relationship properties such as lead time or
//! intervention counts may be absent in the graph; those fields are
//! defaulted rather than failing the decode.

use serde::{Deserialize, Serialize};

fn default_zero() -> f64 {
    0.0
}

/// Row of [`CatalogQuery::AnticipationBurden`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnticipationRow {
    pub person: String,
    pub tasks_anticipated: u64,
    #[serde(default = "default_zero")]
    pub avg_lead_time_days: f64,
    #[serde(default = "default_zero")]
    pub anticipation_burden: f64,
}

/// Row of [`CatalogQuery::MonitoringOverhead`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringRow {
    pub monitor: String,
    pub monitoring_actions: u64,
    #[serde(default = "default_zero")]
    pub monitoring_hours_per_week: f64,
    #[serde(default = "default_zero")]
    pub avg_interventions_per_task: f64,
    #[serde(default = "default_zero")]
    pub nagging_hours_per_week: f64,
}

/// Row of [`CatalogQuery::DecisionResearchGap`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchGapRow {
    pub researcher: String,
    pub decider: String,
    #[serde(default = "default_zero")]
    pub invisible_research_minutes: f64,
    pub decisions_researched_not_made: u64,
}

/// Row of [`CatalogQuery::TaskCreationVsExecution`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationExecutionRow {
    pub person: String,
    pub created: u64,
    pub executed: u64,
    #[serde(default = "default_zero")]
    pub creation_ratio: f64,
    #[serde(default = "default_zero")]
    pub execution_ratio: f64,
}

/// Row of [`CatalogQuery::PhaseDistribution`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRow {
    pub name: String,
    #[serde(default = "default_zero")]
    pub invisible_labor_minutes: f64,
    #[serde(default = "default_zero")]
    pub visible_labor_minutes: f64,
    #[serde(default = "default_zero")]
    pub invisible_percentage: f64,
}

/// Row of [`CatalogQuery::CoordinationBottleneck`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckRow {
    pub name: String,
    #[serde(default = "default_zero")]
    pub coordination_burden: f64,
}

/// Row of [`CatalogQuery::CommunityFragmentation`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityRow {
    pub name: String,
    pub community_id: i64,
}

/// Row of [`CatalogQuery::DependencyChains`](crate::CatalogQuery). `chain`
/// holds the owner name of each task along the blocking path (task title
/// when nobody executes it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyChainRow {
    pub chain: Vec<String>,
    pub chain_length: u64,
}

/// Row of [`CatalogQuery::RippleEffect`](crate::CatalogQuery).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippleRow {
    pub initiator: String,
    pub affected_people: u64,
    pub affected_tasks: u64,
    pub ripple_severity: String,
}

/// Row of [`CatalogQuery::TemporalTaskCreation`](crate::CatalogQuery).
/// Timestamps come back as RFC3339 strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalRow {
    pub timestamp: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_rows;

    #[test]
    fn anticipation_row_defaults_missing_relationship_properties() {
        let rows = vec![serde_json::json!({
            "person": "Kim",
            "tasks_anticipated": 9
        })];
        let decoded: Vec<AnticipationRow> = decode_rows(rows).unwrap();
        assert_eq!(decoded[0].tasks_anticipated, 9);
        assert_eq!(decoded[0].avg_lead_time_days, 0.0);
    }

    #[test]
    fn dependency_chain_row_decodes_nested_list() {
        let rows = vec![serde_json::json!({
            "chain": ["Kim", "Alex", "school run"],
            "chain_length": 2
        })];
        let decoded: Vec<DependencyChainRow> = decode_rows(rows).unwrap();
        assert_eq!(decoded[0].chain.len(), 3);
        assert_eq!(decoded[0].chain_length, 2);
    }
}
