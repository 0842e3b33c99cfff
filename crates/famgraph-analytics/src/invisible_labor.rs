//! Invisible-labor metrics: who notices, monitors, researches, creates, and
//! plans the household work that never shows up on a task list.

use std::sync::Arc;

use famgraph_core::{Result, Severity, SeverityThresholds, TenantId};
use famgraph_graph::{
    decode_rows, AnticipationRow, CatalogQuery, CreationExecutionRow, MonitoringRow, PhaseRow,
    QueryRunner, ResearchGapRow,
};
use serde::Serialize;
use tracing::{info, warn};

/// Gini coefficient over a non-negative input vector, in [0, 1].
///
/// Uses the mean-difference form over an ascending sort, rescaled by
/// n/(n-1) so full concentration on one person scores 1.0 at any group
/// size. Empty, zero-sum, and single-element inputs score 0.
pub fn gini_coefficient(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let sum: f64 = sorted.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }

    let n_f = n as f64;
    let numerator: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();

    let raw = (2.0 * numerator) / (n_f * sum) - (n_f + 1.0) / n_f;
    (raw * n_f / (n_f - 1.0)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryAnticipator {
    pub name: String,
    pub tasks_anticipated: u64,
    pub percentage: f64,
    pub avg_lead_time_days: f64,
    pub burden: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnticipationAnalysis {
    pub primary_anticipator: Option<PrimaryAnticipator>,
    pub anticipation_gap: f64,
    pub all_people: Vec<AnticipationRow>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryMonitor {
    pub name: String,
    pub monitoring_actions: u64,
    pub hours_per_week: f64,
    pub avg_interventions_per_task: f64,
    pub nagging_hours_per_week: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringAnalysis {
    pub primary_monitor: Option<PrimaryMonitor>,
    pub nagging_coefficient: f64,
    pub all_monitors: Vec<MonitoringRow>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchGapEntry {
    pub researcher: String,
    pub decider: String,
    pub invisible_research_minutes: f64,
    pub decisions_researched_not_made: u64,
    pub percentage_of_total_research: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchGapAnalysis {
    pub gaps: Vec<ResearchGapEntry>,
    pub total_research_minutes: f64,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSplitEntry {
    pub person: String,
    pub creation_ratio: f64,
    pub execution_ratio: f64,
    pub cognitive_load: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSplitAnalysis {
    pub splits: Vec<TaskSplitEntry>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseEntry {
    pub person: String,
    pub invisible_labor_minutes: f64,
    pub visible_labor_minutes: f64,
    pub invisible_percentage: f64,
    pub total_minutes: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAnalysis {
    pub distributions: Vec<PhaseEntry>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRecommendation {
    pub priority: u8,
    pub area: &'static str,
    pub action: String,
    pub impact: &'static str,
    pub time_to_implement: &'static str,
}

/// Combined output of all five metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    pub anticipation: AnticipationAnalysis,
    pub monitoring: MonitoringAnalysis,
    pub decision_research: ResearchGapAnalysis,
    pub task_split: TaskSplitAnalysis,
    pub phases: PhaseAnalysis,
    pub summary: String,
    pub overall_severity: Severity,
    pub top_recommendations: Vec<TopRecommendation>,
}

/// Derives the five invisible-labor metrics from catalog query results.
pub struct InvisibleLaborEngine {
    runner: Arc<dyn QueryRunner>,
    thresholds: SeverityThresholds,
}

impl InvisibleLaborEngine {
    pub fn new(runner: Arc<dyn QueryRunner>, thresholds: SeverityThresholds) -> Self {
        Self { runner, thresholds }
    }

    /// Who notices tasks before anyone assigns them.
    pub async fn analyze_anticipation_burden(
        &self,
        tenant: &TenantId,
    ) -> Result<AnticipationAnalysis> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::AnticipationBurden, tenant)
            .await?;
        let data: Vec<AnticipationRow> = decode_rows(rows)?;

        if data.is_empty() {
            return Ok(AnticipationAnalysis {
                primary_anticipator: None,
                anticipation_gap: 0.0,
                all_people: Vec::new(),
                insight: "No anticipation data available yet.".to_string(),
                severity: Severity::None,
                recommendation: String::new(),
            });
        }

        let total_tasks: u64 = data.iter().map(|d| d.tasks_anticipated).sum();
        let primary = &data[0];
        let percentage = if total_tasks == 0 {
            0.0
        } else {
            primary.tasks_anticipated as f64 / total_tasks as f64 * 100.0
        };

        let gap = gini_coefficient(
            &data
                .iter()
                .map(|d| d.tasks_anticipated as f64)
                .collect::<Vec<_>>(),
        );

        let severity = SeverityThresholds::grade(gap, self.thresholds.gini_high, self.thresholds.gini_medium);
        let gap_description = if gap > self.thresholds.gini_high {
            "very unequal"
        } else if gap > self.thresholds.gini_medium {
            "moderately unequal"
        } else {
            "relatively balanced"
        };

        let insight = format!(
            "{} notices {:.0}% of tasks that need doing before anyone assigns them ({} tasks), \
             with an average lead time of {:.1} days. This distribution is {} (Gini coefficient: \
             {:.2}), indicating significant invisible cognitive labor.",
            primary.person,
            percentage,
            primary.tasks_anticipated,
            primary.avg_lead_time_days,
            gap_description,
            gap
        );

        let recommendation = if gap < self.thresholds.gini_medium {
            "Anticipation burden is relatively balanced. Continue current practices.".to_string()
        } else if data.len() >= 2 {
            format!(
                "Consider explicitly sharing task anticipation responsibilities between {} and {}. \
                 Use shared calendars and checklists to distribute the cognitive load of noticing \
                 what needs to be done.",
                data[0].person, data[1].person
            )
        } else {
            format!(
                "{} carries the entire anticipation burden. Bring other family members into \
                 noticing and planning work, starting with shared checklists.",
                primary.person
            )
        };

        Ok(AnticipationAnalysis {
            primary_anticipator: Some(PrimaryAnticipator {
                name: primary.person.clone(),
                tasks_anticipated: primary.tasks_anticipated,
                percentage,
                avg_lead_time_days: primary.avg_lead_time_days,
                burden: primary.anticipation_burden,
            }),
            anticipation_gap: gap,
            all_people: data,
            insight,
            severity,
            recommendation,
        })
    }

    /// Follow-up burden: the "nagging coefficient".
    pub async fn analyze_monitoring_overhead(
        &self,
        tenant: &TenantId,
    ) -> Result<MonitoringAnalysis> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::MonitoringOverhead, tenant)
            .await?;
        let data: Vec<MonitoringRow> = decode_rows(rows)?;

        if data.is_empty() {
            return Ok(MonitoringAnalysis {
                primary_monitor: None,
                nagging_coefficient: 0.0,
                all_monitors: Vec::new(),
                insight: "No monitoring data available yet.".to_string(),
                severity: Severity::None,
                recommendation: String::new(),
            });
        }

        let primary = &data[0];
        let nagging = primary.nagging_hours_per_week;

        let insight = format!(
            "{} spends {:.1} hours per week following up on incomplete tasks ({} monitoring \
             actions/month), with an average of {:.1} interventions per task. This \"nagging \
             coefficient\" represents significant invisible emotional labor.",
            primary.monitor, nagging, primary.monitoring_actions, primary.avg_interventions_per_task
        );

        let recommendation = if nagging < self.thresholds.monitoring_hours_medium {
            "Monitoring overhead is manageable. Current task ownership is working well.".to_string()
        } else {
            format!(
                "{} is spending {:.1} hours/week on follow-ups. Consider using automated \
                 reminders, clearer deadlines, and transferring full ownership (conception + \
                 planning + execution) of tasks to reduce monitoring burden.",
                primary.monitor, nagging
            )
        };

        Ok(MonitoringAnalysis {
            primary_monitor: Some(PrimaryMonitor {
                name: primary.monitor.clone(),
                monitoring_actions: primary.monitoring_actions,
                hours_per_week: primary.monitoring_hours_per_week,
                avg_interventions_per_task: primary.avg_interventions_per_task,
                nagging_hours_per_week: nagging,
            }),
            nagging_coefficient: nagging,
            all_monitors: data,
            insight,
            severity: SeverityThresholds::grade(
                nagging,
                self.thresholds.monitoring_hours_high,
                self.thresholds.monitoring_hours_medium,
            ),
            recommendation,
        })
    }

    /// Invisible research behind decisions someone else makes.
    pub async fn analyze_decision_research_gap(
        &self,
        tenant: &TenantId,
    ) -> Result<ResearchGapAnalysis> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::DecisionResearchGap, tenant)
            .await?;
        let data: Vec<ResearchGapRow> = decode_rows(rows)?;

        if data.is_empty() {
            return Ok(ResearchGapAnalysis {
                gaps: Vec::new(),
                total_research_minutes: 0.0,
                insight: "No decision-research data available yet.".to_string(),
                severity: Severity::None,
                recommendation: "No decision-research gaps to address.".to_string(),
            });
        }

        let total_minutes: f64 = data.iter().map(|d| d.invisible_research_minutes).sum();
        let top = &data[0];

        let insight = format!(
            "{} spent {:.1} hours researching {} decisions that {} ultimately made. This \
             research labor is invisible but critical to decision quality.",
            top.researcher,
            top.invisible_research_minutes / 60.0,
            top.decisions_researched_not_made,
            top.decider
        );

        let recommendation = format!(
            "{} is doing significant invisible research work. Consider: 1) Sharing research \
             duties 50/50, 2) Having {} take on full decision ownership (research + decide), or \
             3) Explicitly acknowledging and valuing research time as equal to decision-making.",
            top.researcher, top.decider
        );

        let max_hours = data
            .iter()
            .map(|d| d.invisible_research_minutes / 60.0)
            .fold(0.0_f64, f64::max);

        Ok(ResearchGapAnalysis {
            gaps: data
                .iter()
                .map(|d| ResearchGapEntry {
                    researcher: d.researcher.clone(),
                    decider: d.decider.clone(),
                    invisible_research_minutes: d.invisible_research_minutes,
                    decisions_researched_not_made: d.decisions_researched_not_made,
                    percentage_of_total_research: if total_minutes == 0.0 {
                        0.0
                    } else {
                        d.invisible_research_minutes / total_minutes * 100.0
                    },
                })
                .collect(),
            total_research_minutes: total_minutes,
            insight,
            severity: SeverityThresholds::grade(
                max_hours,
                self.thresholds.research_hours_high,
                self.thresholds.research_hours_medium,
            ),
            recommendation,
        })
    }

    /// Creation vs execution split, weighted into a cognitive-load score.
    pub async fn analyze_task_creation_vs_execution(
        &self,
        tenant: &TenantId,
    ) -> Result<TaskSplitAnalysis> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::TaskCreationVsExecution, tenant)
            .await?;
        let data: Vec<CreationExecutionRow> = decode_rows(rows)?;

        if data.is_empty() {
            return Ok(TaskSplitAnalysis {
                splits: Vec::new(),
                insight: "No task creation/execution data available yet.".to_string(),
                severity: Severity::None,
                recommendation: String::new(),
            });
        }

        let w = self.thresholds.creation_weight;
        let splits: Vec<TaskSplitEntry> = data
            .iter()
            .map(|d| TaskSplitEntry {
                person: d.person.clone(),
                creation_ratio: d.creation_ratio,
                execution_ratio: d.execution_ratio,
                cognitive_load: d.creation_ratio * w + d.execution_ratio * (1.0 - w),
            })
            .collect();

        let top_creator = data
            .iter()
            .max_by(|a, b| {
                a.creation_ratio
                    .partial_cmp(&b.creation_ratio)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(&data[0]);

        let creation_pct = top_creator.creation_ratio * 100.0;
        let execution_pct = top_creator.execution_ratio * 100.0;

        let insight = format!(
            "{} creates {:.0}% of tasks but executes only {:.0}%, indicating a {:.0}/{:.0} \
             cognitive load split. Research shows task creation carries 60% of the cognitive \
             burden despite 50/50 execution.",
            top_creator.person, creation_pct, execution_pct, creation_pct, execution_pct
        );

        let recommendation = if top_creator.creation_ratio < 0.6 {
            "Task creation/execution split is balanced. Continue current approach.".to_string()
        } else {
            format!(
                "{} creates most tasks. Consider: 1) Encouraging others to proactively create \
                 tasks they notice, 2) Rotating \"family manager\" role weekly, or 3) Using a \
                 card system to distribute conception phase ownership.",
                top_creator.person
            )
        };

        let max_gap = data
            .iter()
            .map(|d| (d.creation_ratio - d.execution_ratio).abs())
            .fold(0.0_f64, f64::max);

        Ok(TaskSplitAnalysis {
            splits,
            insight,
            severity: SeverityThresholds::grade(
                max_gap,
                self.thresholds.split_gap_high,
                self.thresholds.split_gap_medium,
            ),
            recommendation,
        })
    }

    /// Invisible (conception + planning) vs visible (execution) phase time.
    pub async fn analyze_phase_distribution(&self, tenant: &TenantId) -> Result<PhaseAnalysis> {
        let rows = self
            .runner
            .run_catalog(CatalogQuery::PhaseDistribution, tenant)
            .await?;
        let data: Vec<PhaseRow> = decode_rows(rows)?;

        if data.is_empty() {
            return Ok(PhaseAnalysis {
                distributions: Vec::new(),
                insight: "No phase distribution data available yet.".to_string(),
                severity: Severity::None,
                recommendation: "Start tracking task phases to understand invisible labor."
                    .to_string(),
            });
        }

        let top_invisible = data
            .iter()
            .max_by(|a, b| {
                a.invisible_percentage
                    .partial_cmp(&b.invisible_percentage)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(&data[0]);

        let invisible_pct = top_invisible.invisible_percentage * 100.0;
        let insight = format!(
            "{} spends {:.0}% of their household work time on invisible phases (conception + \
             planning) vs {:.0}% on visible execution. Research shows 65-85% of household work \
             is invisible.",
            top_invisible.name,
            invisible_pct,
            100.0 - invisible_pct
        );

        let recommendation = if top_invisible.invisible_percentage < 0.7 {
            "Phase distribution is healthy. Invisible labor is being recognized.".to_string()
        } else {
            format!(
                "{}'s work is {:.0}% invisible. Transfer full ownership of responsibilities \
                 (all three phases) rather than just execution, making invisible work visible \
                 and valued.",
                top_invisible.name, invisible_pct
            )
        };

        let max_invisible = data
            .iter()
            .map(|d| d.invisible_percentage)
            .fold(0.0_f64, f64::max);

        Ok(PhaseAnalysis {
            distributions: data
                .iter()
                .map(|d| PhaseEntry {
                    person: d.name.clone(),
                    invisible_labor_minutes: d.invisible_labor_minutes,
                    visible_labor_minutes: d.visible_labor_minutes,
                    invisible_percentage: d.invisible_percentage,
                    total_minutes: d.invisible_labor_minutes + d.visible_labor_minutes,
                })
                .collect(),
            insight,
            severity: SeverityThresholds::grade(
                max_invisible,
                self.thresholds.invisible_share_high,
                self.thresholds.invisible_share_medium,
            ),
            recommendation,
        })
    }

    /// Run all five metrics concurrently and combine them. A failing metric
    /// degrades to an Unknown block; it never aborts the others.
    pub async fn comprehensive_report(&self, tenant: &TenantId) -> ComprehensiveReport {
        info!(tenant = %tenant, "building comprehensive invisible labor report");

        let (anticipation, monitoring, decision_research, task_split, phases) = tokio::join!(
            self.analyze_anticipation_burden(tenant),
            self.analyze_monitoring_overhead(tenant),
            self.analyze_decision_research_gap(tenant),
            self.analyze_task_creation_vs_execution(tenant),
            self.analyze_phase_distribution(tenant),
        );

        let anticipation = anticipation.unwrap_or_else(|e| {
            warn!(error = %e, "anticipation analysis failed");
            AnticipationAnalysis {
                primary_anticipator: None,
                anticipation_gap: 0.0,
                all_people: Vec::new(),
                insight: format!("Anticipation analysis unavailable: {e}"),
                severity: Severity::Unknown,
                recommendation: String::new(),
            }
        });
        let monitoring = monitoring.unwrap_or_else(|e| {
            warn!(error = %e, "monitoring analysis failed");
            MonitoringAnalysis {
                primary_monitor: None,
                nagging_coefficient: 0.0,
                all_monitors: Vec::new(),
                insight: format!("Monitoring analysis unavailable: {e}"),
                severity: Severity::Unknown,
                recommendation: String::new(),
            }
        });
        let decision_research = decision_research.unwrap_or_else(|e| {
            warn!(error = %e, "decision-research analysis failed");
            ResearchGapAnalysis {
                gaps: Vec::new(),
                total_research_minutes: 0.0,
                insight: format!("Decision-research analysis unavailable: {e}"),
                severity: Severity::Unknown,
                recommendation: String::new(),
            }
        });
        let task_split = task_split.unwrap_or_else(|e| {
            warn!(error = %e, "task split analysis failed");
            TaskSplitAnalysis {
                splits: Vec::new(),
                insight: format!("Task split analysis unavailable: {e}"),
                severity: Severity::Unknown,
                recommendation: String::new(),
            }
        });
        let phases = phases.unwrap_or_else(|e| {
            warn!(error = %e, "phase analysis failed");
            PhaseAnalysis {
                distributions: Vec::new(),
                insight: format!("Phase analysis unavailable: {e}"),
                severity: Severity::Unknown,
                recommendation: String::new(),
            }
        });

        let scores = [
            anticipation.severity.score(),
            monitoring.severity.score(),
            decision_research.severity.score(),
            task_split.severity.score(),
            phases.severity.score(),
        ];
        let overall_severity =
            Severity::from_mean_score(scores.iter().sum::<f64>() / scores.len() as f64);

        let summary = generate_summary(&anticipation, &monitoring, &decision_research);
        let top_recommendations = top_recommendations(&anticipation, &monitoring, &phases);

        ComprehensiveReport {
            anticipation,
            monitoring,
            decision_research,
            task_split,
            phases,
            summary,
            overall_severity,
            top_recommendations,
        }
    }
}

fn generate_summary(
    anticipation: &AnticipationAnalysis,
    monitoring: &MonitoringAnalysis,
    decision_research: &ResearchGapAnalysis,
) -> String {
    let mut high_areas = Vec::new();

    if anticipation.severity.is_high() {
        if let Some(primary) = &anticipation.primary_anticipator {
            high_areas.push(format!(
                "anticipation burden ({:.0}% carried by {})",
                primary.percentage, primary.name
            ));
        }
    }
    if monitoring.severity.is_high() {
        high_areas.push(format!(
            "monitoring overhead ({:.1} hours/week)",
            monitoring.nagging_coefficient
        ));
    }
    if decision_research.severity.is_high() {
        high_areas.push("decision-research gap".to_string());
    }

    if high_areas.is_empty() {
        "Your family has a relatively balanced distribution of invisible labor. Continue \
         monitoring and making small adjustments as needed."
            .to_string()
    } else {
        format!(
            "Your family shows high invisible labor imbalance in: {}. These patterns are common \
             but addressable through explicit task ownership, automated systems, and recognition \
             of invisible work.",
            high_areas.join(", ")
        )
    }
}

/// Top three interventions, ordered monitoring, anticipation, phases.
fn top_recommendations(
    anticipation: &AnticipationAnalysis,
    monitoring: &MonitoringAnalysis,
    phases: &PhaseAnalysis,
) -> Vec<TopRecommendation> {
    let mut recommendations = Vec::new();

    if monitoring.severity.is_high() {
        recommendations.push(TopRecommendation {
            priority: 1,
            area: "Monitoring Overhead",
            action: monitoring.recommendation.clone(),
            impact: "high",
            time_to_implement: "immediate",
        });
    }
    if anticipation.severity.is_high() {
        recommendations.push(TopRecommendation {
            priority: 2,
            area: "Anticipation Burden",
            action: anticipation.recommendation.clone(),
            impact: "high",
            time_to_implement: "1-2 weeks",
        });
    }
    if phases.severity.is_high() {
        recommendations.push(TopRecommendation {
            priority: 3,
            area: "Phase Distribution",
            action: phases.recommendation.clone(),
            impact: "medium",
            time_to_implement: "2-4 weeks",
        });
    }

    recommendations.truncate(3);
    recommendations
}
