use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one family unit. Every graph query and every metric is
/// scoped to exactly one tenant; mixing tenants corrupts the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller context threaded through the natural-language router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyContext {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl FamilyContext {
    pub fn new(tenant_id: impl Into<TenantId>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            user_name: None,
        }
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Severity of a detected imbalance. `Unknown` is reserved for analyses that
/// could not run (e.g. the graph-algorithms extension is not installed) and
/// scores as zero so it never inflates an overall severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn score(&self) -> f64 {
        match self {
            Severity::None | Severity::Unknown => 0.0,
            Severity::Low => 1.0,
            Severity::Medium => 2.0,
            Severity::High => 3.0,
        }
    }

    /// Overall severity from the mean of per-metric scores.
    pub fn from_mean_score(mean: f64) -> Self {
        if mean >= 2.5 {
            Severity::High
        } else if mean >= 1.5 {
            Severity::Medium
        } else if mean >= 0.5 {
            Severity::Low
        } else {
            Severity::None
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Person node as written by the synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub tenant_id: TenantId,
    pub name: String,
    pub role: PersonRole,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub cognitive_load_score: Option<f64>,
    #[serde(default)]
    pub stress_level: Option<f64>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Parent,
    Child,
}

/// One phase of a task's lifecycle (conception, planning or execution):
/// the time it consumed and the person who carried it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPhase {
    pub time: f64,
    #[serde(default)]
    pub person: Option<String>,
}

/// Task node as written by the synchronizer. `complexity_score` is derived
/// upstream from priority, description length and subtask count, clamped to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub tenant_id: TenantId,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub complexity_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responsibility_card_id: Option<String>,
    #[serde(default)]
    pub conception_phase: Option<TaskPhase>,
    #[serde(default)]
    pub planning_phase: Option<TaskPhase>,
    #[serde(default)]
    pub execution_phase: Option<TaskPhase>,
}

/// Event node as written by the synchronizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub tenant_id: TenantId,
    pub title: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Static taxonomy entry a task may belong to. The invisible-labor share and
/// typical weekly time come from the taxonomy, not from observed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibilityCard {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub typical_time_per_week: Option<f64>,
    #[serde(default)]
    pub invisible_labor_percentage: Option<f64>,
    #[serde(default)]
    pub recurrence: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_scores_map_to_overall() {
        assert_eq!(Severity::from_mean_score(0.0), Severity::None);
        assert_eq!(Severity::from_mean_score(0.5), Severity::Low);
        assert_eq!(Severity::from_mean_score(1.5), Severity::Medium);
        assert_eq!(Severity::from_mean_score(2.5), Severity::High);
        assert_eq!(Severity::from_mean_score(3.0), Severity::High);
    }

    #[test]
    fn unknown_severity_scores_zero() {
        assert_eq!(Severity::Unknown.score(), 0.0);
        let mean = (Severity::Unknown.score() + Severity::High.score()) / 2.0;
        assert_eq!(Severity::from_mean_score(mean), Severity::Medium);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&Severity::Unknown).unwrap(),
            "\"unknown\""
        );
    }

    #[test]
    fn person_decodes_from_graph_properties() {
        let value = serde_json::json!({
            "id": "p1",
            "tenantId": "fam-1",
            "name": "Kim",
            "role": "parent",
            "isParent": true,
            "skills": ["planning"]
        });
        let person: Person = serde_json::from_value(value).unwrap();
        assert_eq!(person.role, PersonRole::Parent);
        assert_eq!(person.tenant_id.as_str(), "fam-1");
        assert!(person.cognitive_load_score.is_none());
    }
}
