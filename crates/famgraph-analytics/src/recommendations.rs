//! Turns analysis reports into an ordered, actionable recommendation list.
//! Rules fire off high-severity findings; a baseline set of automation
//! suggestions is always included.

use chrono::Utc;
use famgraph_core::TenantId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::dependency::CoordinationReport;
use crate::invisible_labor::ComprehensiveReport;
use crate::temporal::TemporalReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub what: String,
    pub who: String,
    pub how: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_reclaimed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burden_reduction: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub rec_type: &'static str,
    pub priority: Priority,
    pub category: &'static str,
    pub title: String,
    pub description: String,
    pub action: RecommendedAction,
    pub impact: Impact,
    pub timeframe: &'static str,
    pub difficulty: Difficulty,
    pub success_metrics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub total_hours_reclaimed_per_week: f64,
    pub quick_wins: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub tenant_id: TenantId,
    pub generated_at: String,
    pub total_recommendations: usize,
    pub recommendations: Vec<Recommendation>,
    pub summary: RecommendationSummary,
}

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());

/// Normalizes an impact string like "2-3 hours/week" or "30 min/day" to
/// hours per week, taking the first (conservative) number of a range.
pub fn parse_hours_per_week(impact: &str) -> f64 {
    let Some(caps) = FIRST_NUMBER.captures(impact) else {
        return 0.0;
    };
    let value: f64 = caps[1].parse().unwrap_or(0.0);
    let lower = impact.to_lowercase();
    if lower.contains("min/month") || lower.contains("minutes/month") {
        value / 60.0 / 4.0
    } else if lower.contains("min/day") || lower.contains("minutes/day") {
        value / 60.0 * 7.0
    } else if lower.contains("hours/month") || lower.contains("hour/month") {
        value / 4.0
    } else {
        value
    }
}

fn rec_id() -> String {
    Uuid::new_v4().to_string()
}

fn suggested_cards() -> Vec<String> {
    [
        "Meal planning and grocery decisions",
        "School logistics and permission slips",
        "Medical and dental appointment scheduling",
        "Household supplies and restocking",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Rule-driven recommendation generator. Every input report is optional;
/// missing reports simply skip their rules.
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_recommendations(
        &self,
        tenant: &TenantId,
        invisible: Option<&ComprehensiveReport>,
        coordination: Option<&CoordinationReport>,
        temporal: Option<&TemporalReport>,
    ) -> RecommendationReport {
        let mut recs = Vec::new();

        if let Some(report) = invisible {
            recs.extend(invisible_labor_recs(report));
        }
        if let Some(report) = coordination {
            recs.extend(coordination_recs(report));
        }
        if let Some(report) = temporal {
            recs.extend(temporal_recs(report));
        }
        recs.extend(baseline_recs());

        recs.sort_by_key(|r| r.priority.rank());

        let summary = summarize(&recs);
        info!(
            tenant = %tenant,
            total = recs.len(),
            quick_wins = summary.quick_wins.len(),
            "generated recommendations"
        );

        RecommendationReport {
            tenant_id: tenant.clone(),
            generated_at: Utc::now().to_rfc3339(),
            total_recommendations: recs.len(),
            recommendations: recs,
            summary,
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn invisible_labor_recs(report: &ComprehensiveReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if report.anticipation.severity.is_high() {
        let holder = report
            .anticipation
            .primary_anticipator
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "the primary anticipator".to_string());
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "responsibility_transfer",
            priority: Priority::Critical,
            category: "anticipation",
            title: "Transfer full responsibility cards".to_string(),
            description: format!(
                "{holder} carries most of the noticing and planning work. Transferring entire \
                 responsibility areas, not individual tasks, moves the mental load too."
            ),
            action: RecommendedAction {
                what: "Hand over complete responsibility cards including noticing, deciding, and \
                       monitoring"
                    .to_string(),
                who: format!("{holder} and one other adult"),
                how: suggested_cards(),
            },
            impact: Impact {
                time_reclaimed: None,
                burden_reduction: Some(format!(
                    "Closes an anticipation gap of {:.0}%",
                    report.anticipation.anticipation_gap * 100.0
                )),
            },
            timeframe: "2-4 weeks",
            difficulty: Difficulty::Medium,
            success_metrics: vec![
                "Card holder notices upcoming needs without prompting".to_string(),
                "Anticipation gap drops below 30%".to_string(),
            ],
        });
    }

    if report.monitoring.severity.is_high() {
        let (monitor, nagging) = report
            .monitoring
            .primary_monitor
            .as_ref()
            .map(|m| (m.name.clone(), m.nagging_hours_per_week))
            .unwrap_or_else(|| ("the primary monitor".to_string(), 0.0));
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "monitoring_elimination",
            priority: Priority::Critical,
            category: "monitoring",
            title: "Eliminate follow-up monitoring".to_string(),
            description: format!(
                "{monitor} spends significant time checking whether assigned tasks actually \
                 happen. Self-managed deadlines with automated reminders remove that loop."
            ),
            action: RecommendedAction {
                what: "Replace person-to-person reminders with automated ones and agree that \
                       missed tasks have natural consequences"
                    .to_string(),
                who: "Everyone with assigned tasks".to_string(),
                how: vec![
                    "Set app reminders on each assigned task".to_string(),
                    "Agree on a no-nagging rule for one trial month".to_string(),
                    "Review missed tasks weekly instead of chasing daily".to_string(),
                ],
            },
            impact: Impact {
                time_reclaimed: Some(format!("{nagging:.1} hours/week")),
                burden_reduction: Some("Removes the reminder loop entirely".to_string()),
            },
            timeframe: "1-2 weeks",
            difficulty: Difficulty::Low,
            success_metrics: vec![
                "Monitoring actions per task drop below 2".to_string(),
                format!("{monitor} stops sending manual reminders"),
            ],
        });
    }

    if !report.decision_research.gaps.is_empty() {
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "research_alignment",
            priority: Priority::High,
            category: "decisions",
            title: "Let researchers make the decisions they researched".to_string(),
            description: "Research done by one person and decided by another doubles the work \
                          and hides the researcher's labor."
                .to_string(),
            action: RecommendedAction {
                what: "Give whoever does the research the authority to decide".to_string(),
                who: "Each researcher-decider pair".to_string(),
                how: vec![
                    "List decisions where research and decision are split".to_string(),
                    "Transfer decision authority or transfer the research".to_string(),
                ],
            },
            impact: Impact {
                time_reclaimed: Some(format!(
                    "{:.1} hours/month",
                    report.decision_research.total_research_minutes / 60.0
                )),
                burden_reduction: Some("Makes research labor visible and owned".to_string()),
            },
            timeframe: "1 week",
            difficulty: Difficulty::Low,
            success_metrics: vec!["No decision has a different researcher and decider".to_string()],
        });
    }

    recs
}

fn coordination_recs(report: &CoordinationReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if report.bottlenecks.severity.is_high() {
        let person = report
            .bottlenecks
            .primary_bottleneck
            .as_ref()
            .map(|b| b.person.clone())
            .unwrap_or_else(|| "one person".to_string());
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "coordination_redistribution",
            priority: Priority::Critical,
            category: "coordination",
            title: "Break the coordination bottleneck".to_string(),
            description: format!(
                "Coordination routes through {person}, so everything stalls when they are \
                 unavailable. Direct communication paths remove the single point of failure."
            ),
            action: RecommendedAction {
                what: "Create direct coordination channels that bypass the central person"
                    .to_string(),
                who: "The whole household".to_string(),
                how: vec![
                    "Pair people directly for recurring handoffs".to_string(),
                    "Move status updates to a shared board".to_string(),
                    format!("Route new requests away from {person} by default"),
                ],
            },
            impact: Impact {
                time_reclaimed: None,
                burden_reduction: Some("Coordination no longer depends on one person".to_string()),
            },
            timeframe: "2-4 weeks",
            difficulty: Difficulty::High,
            success_metrics: vec![
                "Betweenness concentration drops below 0.3".to_string(),
            ],
        });
    }

    if report.dependencies.total_chains > 5 {
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "dependency_breaking",
            priority: Priority::High,
            category: "coordination",
            title: "Break long blocking chains".to_string(),
            description: format!(
                "{} blocking chains mean tasks regularly wait on other tasks. Decoupling the \
                 longest chains lets work proceed in parallel.",
                report.dependencies.total_chains
            ),
            action: RecommendedAction {
                what: "Restructure the longest dependency chains so steps can run independently"
                    .to_string(),
                who: "Whoever owns the chained tasks".to_string(),
                how: vec![
                    "Identify which dependencies are real versus habitual".to_string(),
                    "Pre-stage supplies and information so steps do not block".to_string(),
                ],
            },
            impact: Impact {
                time_reclaimed: None,
                burden_reduction: Some("Fewer tasks stuck waiting on other tasks".to_string()),
            },
            timeframe: "2-3 weeks",
            difficulty: Difficulty::Medium,
            success_metrics: vec!["No blocking chain longer than 3 tasks".to_string()],
        });
    }

    recs
}

fn temporal_recs(report: &TemporalReport) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if report.task_creation.sunday_night_spike {
        recs.push(Recommendation {
            id: rec_id(),
            rec_type: "planning_routine",
            priority: Priority::Medium,
            category: "temporal",
            title: "Move weekly planning out of Sunday night".to_string(),
            description: format!(
                "{:.1}% of tasks are created on Sunday evening, which front-loads the week with \
                 stress. A shared earlier planning slot spreads the load.",
                report.task_creation.sunday_night_percentage
            ),
            action: RecommendedAction {
                what: "Hold a 20-minute shared planning session earlier in the weekend"
                    .to_string(),
                who: "All adults, together".to_string(),
                how: vec![
                    "Pick a fixed Saturday or Sunday afternoon slot".to_string(),
                    "Plan the week together so the list is not one person's".to_string(),
                ],
            },
            impact: Impact {
                time_reclaimed: None,
                burden_reduction: Some("Ends the solo Sunday-night planning scramble".to_string()),
            },
            timeframe: "1 week",
            difficulty: Difficulty::Low,
            success_metrics: vec![
                "Sunday 6pm-11pm task creation drops below 20%".to_string(),
            ],
        });
    }

    recs
}

fn baseline_recs() -> Vec<Recommendation> {
    vec![
        Recommendation {
            id: rec_id(),
            rec_type: "automation",
            priority: Priority::Medium,
            category: "automation",
            title: "Automate recurring task reminders".to_string(),
            description: "Recurring chores do not need a human to remember them.".to_string(),
            action: RecommendedAction {
                what: "Set up recurring reminders for every weekly and monthly task".to_string(),
                who: "Any adult".to_string(),
                how: vec!["Use the task app's recurrence settings".to_string()],
            },
            impact: Impact {
                time_reclaimed: Some("2-3 hours/week".to_string()),
                burden_reduction: Some("Nobody has to remember routine chores".to_string()),
            },
            timeframe: "1 day",
            difficulty: Difficulty::Low,
            success_metrics: vec!["Zero manual reminders for recurring tasks".to_string()],
        },
        Recommendation {
            id: rec_id(),
            rec_type: "automation",
            priority: Priority::Medium,
            category: "automation",
            title: "Sync everyone onto one shared calendar".to_string(),
            description: "Scattered schedules force one person to be the human calendar."
                .to_string(),
            action: RecommendedAction {
                what: "Merge school, work, and activity calendars into one shared view"
                    .to_string(),
                who: "Everyone with a schedule".to_string(),
                how: vec!["Subscribe each source calendar into a shared family one".to_string()],
            },
            impact: Impact {
                time_reclaimed: Some("1-2 hours/week".to_string()),
                burden_reduction: Some("No single person tracks everyone's schedule".to_string()),
            },
            timeframe: "1 day",
            difficulty: Difficulty::Low,
            success_metrics: vec!["All events visible to all adults".to_string()],
        },
        Recommendation {
            id: rec_id(),
            rec_type: "automation",
            priority: Priority::Low,
            category: "automation",
            title: "Put bills and subscriptions on autopay".to_string(),
            description: "Payment deadlines are pure monitoring load.".to_string(),
            action: RecommendedAction {
                what: "Enable autopay and run a quarterly subscription audit".to_string(),
                who: "Whoever handles finances".to_string(),
                how: vec!["Enable autopay per biller".to_string()],
            },
            impact: Impact {
                time_reclaimed: Some("30 min/month".to_string()),
                burden_reduction: Some("No due-date tracking".to_string()),
            },
            timeframe: "1 week",
            difficulty: Difficulty::Low,
            success_metrics: vec!["No manual bill payments".to_string()],
        },
        Recommendation {
            id: rec_id(),
            rec_type: "automation",
            priority: Priority::Medium,
            category: "automation",
            title: "Keep a shared shopping list with recurring staples".to_string(),
            description: "Noticing that supplies are low is invisible work.".to_string(),
            action: RecommendedAction {
                what: "Maintain one shared list where anyone adds items, with staples recurring"
                    .to_string(),
                who: "Everyone".to_string(),
                how: vec!["Whoever uses the last of something adds it".to_string()],
            },
            impact: Impact {
                time_reclaimed: Some("1-2 hours/week".to_string()),
                burden_reduction: Some("Restocking stops depending on one noticer".to_string()),
            },
            timeframe: "1 day",
            difficulty: Difficulty::Low,
            success_metrics: vec!["No emergency store runs for staples".to_string()],
        },
        Recommendation {
            id: rec_id(),
            rec_type: "routine",
            priority: Priority::Medium,
            category: "routines",
            title: "Standardize the school-morning routine".to_string(),
            description: "A fixed checklist turns chaotic mornings into a routine children can \
                          run themselves."
                .to_string(),
            action: RecommendedAction {
                what: "Post a visible morning checklist each child works through independently"
                    .to_string(),
                who: "Children, with one adult as backstop".to_string(),
                how: vec![
                    "Prep bags and clothes the night before".to_string(),
                    "Put the checklist where children see it".to_string(),
                ],
            },
            impact: Impact {
                time_reclaimed: Some("30-45 min/day".to_string()),
                burden_reduction: Some("Mornings run without adult orchestration".to_string()),
            },
            timeframe: "1-2 weeks",
            difficulty: Difficulty::Medium,
            success_metrics: vec!["Children complete the checklist unprompted".to_string()],
        },
    ]
}

fn summarize(recs: &[Recommendation]) -> RecommendationSummary {
    let total_hours: f64 = recs
        .iter()
        .filter_map(|r| r.impact.time_reclaimed.as_deref())
        .map(parse_hours_per_week)
        .sum();

    let quick_wins: Vec<String> = recs
        .iter()
        .filter(|r| {
            r.difficulty == Difficulty::Low
                && matches!(r.priority, Priority::Critical | Priority::High)
        })
        .map(|r| r.title.clone())
        .collect();

    let message = if quick_wins.is_empty() {
        format!(
            "{} recommendations generated. Implementing them could reclaim roughly {:.1} \
             hours/week of invisible labor.",
            recs.len(),
            total_hours
        )
    } else {
        format!(
            "{} recommendations generated, reclaiming roughly {:.1} hours/week. Start with the \
             {} quick wins: high-impact changes that are easy to implement.",
            recs.len(),
            total_hours,
            quick_wins.len()
        )
    };

    RecommendationSummary {
        total_hours_reclaimed_per_week: total_hours,
        quick_wins,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{
        BottleneckAnalysis, BottleneckEntry, ChainEntry, CriticalPathAnalysis, DependencyAnalysis,
        FragmentationAnalysis, RippleAnalysis,
    };
    use crate::invisible_labor::{
        AnticipationAnalysis, MonitoringAnalysis, PhaseAnalysis, PrimaryMonitor,
        ResearchGapAnalysis, TaskSplitAnalysis,
    };
    use crate::temporal::{
        DayOfWeekCounts, EventPatterns, SeasonalPatterns, StressPatterns, TaskCreationPatterns,
        TimeOfDayCounts, WeeklyRhythm,
    };
    use approx::assert_relative_eq;
    use famgraph_core::Severity;

    fn quiet_invisible_report() -> ComprehensiveReport {
        ComprehensiveReport {
            anticipation: AnticipationAnalysis {
                primary_anticipator: None,
                anticipation_gap: 0.0,
                all_people: Vec::new(),
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            monitoring: MonitoringAnalysis {
                primary_monitor: None,
                nagging_coefficient: 0.0,
                all_monitors: Vec::new(),
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            decision_research: ResearchGapAnalysis {
                gaps: Vec::new(),
                total_research_minutes: 0.0,
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            task_split: TaskSplitAnalysis {
                splits: Vec::new(),
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            phases: PhaseAnalysis {
                distributions: Vec::new(),
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            summary: String::new(),
            overall_severity: Severity::None,
            top_recommendations: Vec::new(),
        }
    }

    fn quiet_coordination_report() -> CoordinationReport {
        CoordinationReport {
            tenant_id: TenantId::from("fam-1"),
            generated_at: String::new(),
            bottlenecks: BottleneckAnalysis {
                bottlenecks: Vec::new(),
                primary_bottleneck: None,
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
                install_instructions: None,
            },
            dependencies: DependencyAnalysis {
                dependencies: Vec::new(),
                total_chains: 0,
                primary_blocker: None,
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
            },
            fragmentation: FragmentationAnalysis {
                communities: Vec::new(),
                total_communities: 0,
                fragmentation_score: 0.0,
                insight: String::new(),
                severity: Severity::None,
                recommendation: String::new(),
                install_instructions: None,
            },
            critical_paths: CriticalPathAnalysis {
                critical_paths: Vec::new(),
                insight: String::new(),
                risk: Severity::None,
                recommendation: String::new(),
            },
            ripple_effects: RippleAnalysis {
                ripple_effects: Vec::new(),
                max_impact: 0,
                insight: String::new(),
                impact: Severity::None,
                recommendation: String::new(),
            },
            summary: String::new(),
            severity: Severity::None,
        }
    }

    #[test]
    fn parses_impact_strings_to_hours_per_week() {
        assert_relative_eq!(parse_hours_per_week("2-3 hours/week"), 2.0);
        assert_relative_eq!(parse_hours_per_week("4.5 hours/week"), 4.5);
        assert_relative_eq!(parse_hours_per_week("30 min/month"), 0.125);
        assert_relative_eq!(parse_hours_per_week("30-45 min/day"), 3.5);
        assert_relative_eq!(parse_hours_per_week("8 hours/month"), 2.0);
        assert_relative_eq!(parse_hours_per_week("no numbers here"), 0.0);
    }

    #[test]
    fn baseline_recommendations_always_present() {
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, None, None);

        assert_eq!(report.total_recommendations, 5);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.rec_type == "routine"));
        // 2 + 1 + 0.125 + 1 + 3.5 hours/week from the baseline set.
        assert_relative_eq!(report.summary.total_hours_reclaimed_per_week, 7.625);
        assert!(report.summary.quick_wins.is_empty());
    }

    #[test]
    fn high_monitoring_triggers_critical_quick_win() {
        let mut invisible = quiet_invisible_report();
        invisible.monitoring.severity = Severity::High;
        invisible.monitoring.primary_monitor = Some(PrimaryMonitor {
            name: "Kim".to_string(),
            monitoring_actions: 40,
            hours_per_week: 5.0,
            avg_interventions_per_task: 3.2,
            nagging_hours_per_week: 4.5,
        });
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, Some(&invisible), None, None);

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.rec_type == "monitoring_elimination")
            .unwrap();
        assert_eq!(rec.priority, Priority::Critical);
        assert_eq!(rec.impact.time_reclaimed.as_deref(), Some("4.5 hours/week"));
        assert!(rec.description.contains("Kim"));
        assert!(report
            .summary
            .quick_wins
            .contains(&"Eliminate follow-up monitoring".to_string()));
        // Critical recommendations sort ahead of the baseline set.
        assert_eq!(report.recommendations[0].rec_type, "monitoring_elimination");
    }

    #[test]
    fn long_chain_count_triggers_dependency_breaking() {
        let mut coordination = quiet_coordination_report();
        coordination.dependencies.total_chains = 6;
        coordination.dependencies.dependencies = vec![ChainEntry {
            chain: vec!["a".to_string(), "b".to_string()],
            length: 2,
            blocked_by: Some("Kim".to_string()),
            severity: Severity::Medium,
        }];
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, Some(&coordination), None);

        assert!(report
            .recommendations
            .iter()
            .any(|r| r.rec_type == "dependency_breaking" && r.priority == Priority::High));
    }

    #[test]
    fn five_chains_do_not_trigger_dependency_breaking() {
        let mut coordination = quiet_coordination_report();
        coordination.dependencies.total_chains = 5;
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, Some(&coordination), None);

        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.rec_type == "dependency_breaking"));
    }

    #[test]
    fn bottleneck_recommendation_names_the_person() {
        let mut coordination = quiet_coordination_report();
        coordination.bottlenecks.severity = Severity::High;
        coordination.bottlenecks.primary_bottleneck = Some(BottleneckEntry {
            person: "Alex".to_string(),
            score: 0.62,
            rank: 1,
            interpretation: "severe bottleneck",
        });
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, Some(&coordination), None);

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.rec_type == "coordination_redistribution")
            .unwrap();
        assert_eq!(rec.priority, Priority::Critical);
        assert!(rec.description.contains("Alex"));
    }

    #[test]
    fn sunday_night_spike_triggers_planning_routine() {
        let temporal = TemporalReport {
            tenant_id: TenantId::from("fam-1"),
            generated_at: String::new(),
            task_creation: TaskCreationPatterns {
                day_of_week: DayOfWeekCounts::default(),
                hour_of_day: Default::default(),
                peak_day: None,
                peak_hour: None,
                sunday_night_spike: true,
                sunday_night_percentage: 42.0,
                insight: String::new(),
            },
            events: EventPatterns {
                day_of_week: DayOfWeekCounts::default(),
                time_of_day: TimeOfDayCounts::default(),
                busiest_day: None,
                busiest_time: None,
                insight: String::new(),
            },
            stress: StressPatterns {
                day_of_week: DayOfWeekCounts::default(),
                highest_stress_day: None,
                insight: String::new(),
            },
            seasonal: SeasonalPatterns {
                monthly_distribution: Vec::new(),
                back_to_school_spike: false,
                holiday_spike: false,
                insight: String::new(),
            },
            weekly: WeeklyRhythm {
                weekly_rhythm: DayOfWeekCounts::default(),
                rhythm_score: 0.0,
                interpretation: "consistent",
                insight: String::new(),
            },
            summary: String::new(),
        };
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, None, Some(&temporal));

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.rec_type == "planning_routine")
            .unwrap();
        assert_eq!(rec.priority, Priority::Medium);
        assert!(rec.description.contains("42.0%"));
    }

    #[test]
    fn recommendations_sorted_by_priority() {
        let mut invisible = quiet_invisible_report();
        invisible.anticipation.severity = Severity::High;
        invisible.monitoring.severity = Severity::High;
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, Some(&invisible), None, None);

        let ranks: Vec<u8> = report
            .recommendations
            .iter()
            .map(|r| r.priority.rank())
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted);
        assert_eq!(report.recommendations[0].priority, Priority::Critical);
    }

    #[test]
    fn every_recommendation_gets_a_unique_id() {
        let engine = RecommendationEngine::new();
        let tenant = TenantId::from("fam-1");

        let report = engine.generate_recommendations(&tenant, None, None, None);

        let mut ids: Vec<&String> = report.recommendations.iter().map(|r| &r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), report.total_recommendations);
    }
}
