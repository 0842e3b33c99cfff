//! Coordination analysis: bottlenecks, blocking chains, task-community
//! fragmentation, and ripple effects. The centrality and community queries
//! need the store's graph-algorithms extension; when it is missing each
//! analysis degrades to an Unknown block with install guidance instead of
//! failing the whole report.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use famgraph_core::{FamGraphError, Result, Severity, SeverityThresholds, TenantId};
use famgraph_graph::{
    decode_rows, BottleneckRow, CatalogQuery, CommunityRow, DependencyChainRow, QueryRunner,
    RippleRow, GDS_INSTALL_GUIDANCE,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckEntry {
    pub person: String,
    pub score: f64,
    pub rank: usize,
    pub interpretation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckAnalysis {
    pub bottlenecks: Vec<BottleneckEntry>,
    pub primary_bottleneck: Option<BottleneckEntry>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEntry {
    pub chain: Vec<String>,
    pub length: u64,
    pub blocked_by: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryBlocker {
    pub person: String,
    pub chains_blocked: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAnalysis {
    pub dependencies: Vec<ChainEntry>,
    pub total_chains: usize,
    pub primary_blocker: Option<PrimaryBlocker>,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: i64,
    pub people: Vec<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentationAnalysis {
    pub communities: Vec<Community>,
    pub total_communities: usize,
    pub fragmentation_score: f64,
    pub insight: String,
    pub severity: Severity,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPath {
    pub chain: Vec<String>,
    pub length: u64,
    pub risk: Severity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathAnalysis {
    pub critical_paths: Vec<CriticalPath>,
    pub insight: String,
    pub risk: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RippleEntry {
    pub initiator: String,
    pub affected_people: u64,
    pub affected_tasks: u64,
    pub severity_label: String,
    pub impact: Severity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RippleAnalysis {
    pub ripple_effects: Vec<RippleEntry>,
    pub max_impact: u64,
    pub insight: String,
    pub impact: Severity,
    pub recommendation: String,
}

/// Combined coordination picture for a tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationReport {
    pub tenant_id: TenantId,
    pub generated_at: String,
    pub bottlenecks: BottleneckAnalysis,
    pub dependencies: DependencyAnalysis,
    pub fragmentation: FragmentationAnalysis,
    pub critical_paths: CriticalPathAnalysis,
    pub ripple_effects: RippleAnalysis,
    pub summary: String,
    pub severity: Severity,
}

pub struct DependencyAnalyzer {
    runner: Arc<dyn QueryRunner>,
    thresholds: SeverityThresholds,
}

impl DependencyAnalyzer {
    pub fn new(runner: Arc<dyn QueryRunner>, thresholds: SeverityThresholds) -> Self {
        Self { runner, thresholds }
    }

    /// Betweenness-style centrality: through whom does coordination flow.
    pub async fn detect_coordination_bottlenecks(
        &self,
        tenant: &TenantId,
    ) -> BottleneckAnalysis {
        let rows = match self
            .runner
            .run_catalog(CatalogQuery::CoordinationBottleneck, tenant)
            .await
            .and_then(decode_rows::<BottleneckRow>)
        {
            Ok(rows) => rows,
            Err(e) => return degraded_bottlenecks(e),
        };

        if rows.is_empty() {
            return BottleneckAnalysis {
                bottlenecks: Vec::new(),
                primary_bottleneck: None,
                insight: "No coordination bottlenecks detected (not enough graph data yet)."
                    .to_string(),
                severity: Severity::None,
                recommendation: String::new(),
                install_instructions: None,
            };
        }

        let bottlenecks: Vec<BottleneckEntry> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| BottleneckEntry {
                person: r.name.clone(),
                score: r.coordination_burden,
                rank: i + 1,
                interpretation: interpret_betweenness(r.coordination_burden),
            })
            .collect();

        let primary = bottlenecks[0].clone();
        let gap = if bottlenecks.len() > 1 && bottlenecks[1].score > 0.0 {
            format!("{:.1}x", primary.score / bottlenecks[1].score)
        } else {
            "N/A".to_string()
        };

        let insight = format!(
            "{} is the primary coordination hub (betweenness score: {:.2}), {} higher than the \
             next person. Most family coordination flows through them, creating a potential \
             bottleneck.",
            primary.person, primary.score, gap
        );

        let recommendation = format!(
            "Reduce {}'s coordination burden by: 1) Delegating full task ownership (not just \
             execution), 2) Using shared calendars/systems instead of verbal coordination, 3) \
             Establishing standard routines that don't require coordination.",
            primary.person
        );

        BottleneckAnalysis {
            severity: SeverityThresholds::grade(
                primary.score,
                self.thresholds.bottleneck_high,
                self.thresholds.bottleneck_medium,
            ),
            primary_bottleneck: Some(primary),
            bottlenecks,
            insight,
            recommendation,
            install_instructions: None,
        }
    }

    /// Blocking chains and the person who heads the most of them.
    pub async fn analyze_dependency_burden(&self, tenant: &TenantId) -> DependencyAnalysis {
        let rows = match self
            .runner
            .run_catalog(CatalogQuery::DependencyChains, tenant)
            .await
            .and_then(decode_rows::<DependencyChainRow>)
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "dependency chain query failed");
                return DependencyAnalysis {
                    dependencies: Vec::new(),
                    total_chains: 0,
                    primary_blocker: None,
                    insight: "Dependency analysis requires more task and relationship data."
                        .to_string(),
                    severity: Severity::Unknown,
                    recommendation: String::new(),
                };
            }
        };

        if rows.is_empty() {
            return DependencyAnalysis {
                dependencies: Vec::new(),
                total_chains: 0,
                primary_blocker: None,
                insight: "No dependency chains detected yet.".to_string(),
                severity: Severity::None,
                recommendation: "Dependency structure is healthy.".to_string(),
            };
        }

        let chain_high = self.thresholds.chain_length_high as u64;
        let dependencies: Vec<ChainEntry> = rows
            .iter()
            .map(|r| ChainEntry {
                chain: r.chain.clone(),
                length: r.chain_length,
                blocked_by: r.chain.first().cloned(),
                severity: if r.chain_length > chain_high {
                    Severity::High
                } else if r.chain_length > 1 {
                    Severity::Medium
                } else {
                    Severity::Low
                },
            })
            .collect();

        let mut blockers: HashMap<&str, usize> = HashMap::new();
        for dep in &dependencies {
            if let Some(blocker) = &dep.blocked_by {
                *blockers.entry(blocker.as_str()).or_insert(0) += 1;
            }
        }
        let primary_blocker = blockers
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(person, chains_blocked)| PrimaryBlocker {
                person: person.to_string(),
                chains_blocked,
            });

        let long_chains = dependencies
            .iter()
            .filter(|d| d.length > chain_high)
            .count();

        let (insight, recommendation) = match &primary_blocker {
            Some(blocker) => (
                format!(
                    "{} is the blocking point for {} dependency chains. {} chains are {}+ steps \
                     long, indicating complex dependencies that create delays and coordination \
                     overhead.",
                    blocker.person,
                    blocker.chains_blocked,
                    long_chains,
                    chain_high
                ),
                format!(
                    "Reduce dependency chains by: 1) Parallel task ownership (multiple people can \
                     complete similar tasks), 2) Explicit deadlines with buffer time, 3) Breaking \
                     {}'s blocking tasks into smaller, independent pieces.",
                    blocker.person
                ),
            ),
            None => (
                "No major dependency bottlenecks detected.".to_string(),
                "Dependency structure is healthy.".to_string(),
            ),
        };

        DependencyAnalysis {
            severity: if dependencies.iter().any(|d| d.severity.is_high()) {
                Severity::High
            } else {
                Severity::Medium
            },
            total_chains: dependencies.len(),
            dependencies,
            primary_blocker,
            insight,
            recommendation,
        }
    }

    /// Task-community clustering as a proxy for context-switching burden.
    pub async fn detect_community_fragmentation(
        &self,
        tenant: &TenantId,
    ) -> FragmentationAnalysis {
        let rows = match self
            .runner
            .run_catalog(CatalogQuery::CommunityFragmentation, tenant)
            .await
            .and_then(decode_rows::<CommunityRow>)
        {
            Ok(rows) => rows,
            Err(e) => return degraded_fragmentation(e),
        };

        if rows.is_empty() {
            return FragmentationAnalysis {
                communities: Vec::new(),
                total_communities: 0,
                fragmentation_score: 0.0,
                insight: "Not enough data to detect task communities yet.".to_string(),
                severity: Severity::None,
                recommendation: String::new(),
                install_instructions: None,
            };
        }

        let mut by_id: HashMap<i64, Vec<String>> = HashMap::new();
        for row in &rows {
            by_id.entry(row.community_id).or_default().push(row.name.clone());
        }

        let mut communities: Vec<Community> = by_id
            .into_iter()
            .map(|(id, people)| Community {
                id,
                size: people.len(),
                people,
            })
            .collect();
        communities.sort_by_key(|c| c.id);

        let fragmentation = communities.len() as f64 / rows.len() as f64;

        // A lone community means no context-switching between clusters, even
        // when the communities/people ratio is numerically high (one person).
        if communities.len() <= 1 {
            return FragmentationAnalysis {
                total_communities: communities.len(),
                communities,
                fragmentation_score: fragmentation,
                insight: "Family works as a unified team with low context-switching.".to_string(),
                severity: Severity::None,
                recommendation: "Task clustering is healthy. Maintain the current structure."
                    .to_string(),
                install_instructions: None,
            };
        }

        let insight = format!(
            "Tasks cluster into {} separate communities (fragmentation: {:.0}%). High \
             fragmentation indicates context-switching burden where people juggle \
             disconnected responsibilities.",
            communities.len(),
            fragmentation * 100.0
        );

        let recommendation = if fragmentation < self.thresholds.fragmentation_medium {
            "Task clustering is healthy. Maintain the current structure.".to_string()
        } else {
            "Reduce fragmentation by: 1) Grouping related tasks under a single owner, 2) \
             Assigning full responsibility categories instead of individual tasks, 3) Batching \
             similar tasks together (e.g., all school tasks handled by one person)."
                .to_string()
        };

        FragmentationAnalysis {
            total_communities: communities.len(),
            communities,
            fragmentation_score: fragmentation,
            insight,
            severity: SeverityThresholds::grade(
                fragmentation,
                self.thresholds.fragmentation_high,
                self.thresholds.fragmentation_medium,
            ),
            recommendation,
            install_instructions: None,
        }
    }

    /// Longest blocking chains, where one delay cascades furthest.
    pub async fn find_critical_paths(&self, tenant: &TenantId) -> CriticalPathAnalysis {
        let rows = match self
            .runner
            .run_catalog(CatalogQuery::DependencyChains, tenant)
            .await
            .and_then(decode_rows::<DependencyChainRow>)
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "critical path query failed");
                return CriticalPathAnalysis {
                    critical_paths: Vec::new(),
                    insight: "Critical path analysis requires more task dependency data."
                        .to_string(),
                    risk: Severity::Unknown,
                    recommendation: String::new(),
                };
            }
        };

        if rows.is_empty() {
            return CriticalPathAnalysis {
                critical_paths: Vec::new(),
                insight: "No critical paths detected yet.".to_string(),
                risk: Severity::Low,
                recommendation: "No critical paths to address.".to_string(),
            };
        }

        let chain_high = self.thresholds.chain_length_high as u64;
        let mut sorted = rows;
        sorted.sort_by(|a, b| b.chain_length.cmp(&a.chain_length));

        let critical_paths: Vec<CriticalPath> = sorted
            .iter()
            .take(5)
            .map(|p| CriticalPath {
                chain: p.chain.clone(),
                length: p.chain_length,
                risk: if p.chain_length > chain_high {
                    Severity::High
                } else if p.chain_length > 1 {
                    Severity::Medium
                } else {
                    Severity::Low
                },
            })
            .collect();

        let longest = &critical_paths[0];
        let insight = format!(
            "Longest dependency chain: {} steps ({}). This creates a single point of failure \
             where one delay cascades through the entire chain.",
            longest.length,
            longest.chain.join(" -> ")
        );

        CriticalPathAnalysis {
            risk: if longest.length > chain_high {
                Severity::High
            } else {
                Severity::Medium
            },
            critical_paths,
            insight,
            recommendation: "Shorten critical paths by: 1) Parallelizing independent tasks, 2) \
                             Adding buffer time at each step, 3) Creating backup plans for \
                             high-risk steps, 4) Reducing handoffs between people."
                .to_string(),
        }
    }

    /// Cascading disruption: whose changes touch the most tasks and people.
    pub async fn analyze_ripple_effects(&self, tenant: &TenantId) -> RippleAnalysis {
        let rows = match self
            .runner
            .run_catalog(CatalogQuery::RippleEffect, tenant)
            .await
            .and_then(decode_rows::<RippleRow>)
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "ripple effect query failed");
                return RippleAnalysis {
                    ripple_effects: Vec::new(),
                    max_impact: 0,
                    insight: "Ripple effect analysis requires more task relationship data."
                        .to_string(),
                    impact: Severity::Unknown,
                    recommendation: String::new(),
                };
            }
        };

        if rows.is_empty() {
            return RippleAnalysis {
                ripple_effects: Vec::new(),
                max_impact: 0,
                insight: "No ripple effect patterns detected yet.".to_string(),
                impact: Severity::Low,
                recommendation: "Ripple effects are minimal.".to_string(),
            };
        }

        let tasks_high = self.thresholds.ripple_tasks_high as u64;
        let tasks_medium = self.thresholds.ripple_tasks_medium as u64;
        let grade_tasks = |tasks: u64| {
            if tasks > tasks_high {
                Severity::High
            } else if tasks > tasks_medium {
                Severity::Medium
            } else {
                Severity::Low
            }
        };

        let ripple_effects: Vec<RippleEntry> = rows
            .iter()
            .map(|r| RippleEntry {
                initiator: r.initiator.clone(),
                affected_people: r.affected_people,
                affected_tasks: r.affected_tasks,
                severity_label: r.ripple_severity.clone(),
                impact: grade_tasks(r.affected_tasks),
            })
            .collect();

        let max_effect = ripple_effects
            .iter()
            .max_by_key(|r| r.affected_tasks)
            .cloned()
            .unwrap_or_else(|| ripple_effects[0].clone());

        let insight = format!(
            "{} has the highest ripple effect ({} tasks affected, {} people impacted). Changes \
             to their tasks cascade throughout the family system.",
            max_effect.initiator, max_effect.affected_tasks, max_effect.affected_people
        );

        let recommendation = format!(
            "Reduce {}'s ripple effects by: 1) Decoupling their tasks from others (reduce \
             dependencies), 2) Over-communicating changes early, 3) Building redundancy so \
             others can complete their tasks if needed.",
            max_effect.initiator
        );

        RippleAnalysis {
            max_impact: max_effect.affected_tasks,
            impact: grade_tasks(max_effect.affected_tasks),
            ripple_effects,
            insight,
            recommendation,
        }
    }

    /// Run every coordination analysis concurrently and combine them.
    pub async fn analyze_coordination_patterns(&self, tenant: &TenantId) -> CoordinationReport {
        info!(tenant = %tenant, "analyzing coordination patterns");

        let (bottlenecks, dependencies, fragmentation, critical_paths, ripple_effects) = tokio::join!(
            self.detect_coordination_bottlenecks(tenant),
            self.analyze_dependency_burden(tenant),
            self.detect_community_fragmentation(tenant),
            self.find_critical_paths(tenant),
            self.analyze_ripple_effects(tenant),
        );

        let scores = [
            bottlenecks.severity.score(),
            dependencies.severity.score(),
            fragmentation.severity.score(),
            critical_paths.risk.score(),
        ];
        let severity = Severity::from_mean_score(scores.iter().sum::<f64>() / scores.len() as f64);

        let summary = coordination_summary(&bottlenecks, &dependencies, &fragmentation);

        CoordinationReport {
            tenant_id: tenant.clone(),
            generated_at: Utc::now().to_rfc3339(),
            bottlenecks,
            dependencies,
            fragmentation,
            critical_paths,
            ripple_effects,
            summary,
            severity,
        }
    }
}

fn interpret_betweenness(score: f64) -> &'static str {
    if score > 0.5 {
        "Critical bottleneck: many paths flow through this person"
    } else if score > 0.3 {
        "Moderate bottleneck with significant coordination burden"
    } else if score > 0.1 {
        "Minor bottleneck, some coordination required"
    } else {
        "Minimal coordination burden"
    }
}

fn degraded_bottlenecks(error: FamGraphError) -> BottleneckAnalysis {
    let install = install_instructions_for(&error);
    warn!(error = %error, "bottleneck analysis degraded");
    BottleneckAnalysis {
        bottlenecks: Vec::new(),
        primary_bottleneck: None,
        insight: "Coordination bottleneck analysis requires the graph-algorithms extension."
            .to_string(),
        severity: Severity::Unknown,
        recommendation: String::new(),
        install_instructions: Some(install),
    }
}

fn degraded_fragmentation(error: FamGraphError) -> FragmentationAnalysis {
    let install = install_instructions_for(&error);
    warn!(error = %error, "fragmentation analysis degraded");
    FragmentationAnalysis {
        communities: Vec::new(),
        total_communities: 0,
        fragmentation_score: 0.0,
        insight: "Community fragmentation analysis requires the graph-algorithms extension."
            .to_string(),
        severity: Severity::Unknown,
        recommendation: String::new(),
        install_instructions: Some(install),
    }
}

fn install_instructions_for(error: &FamGraphError) -> String {
    match error {
        FamGraphError::GdsUnavailable(guidance) => guidance.clone(),
        _ => GDS_INSTALL_GUIDANCE.to_string(),
    }
}

fn coordination_summary(
    bottlenecks: &BottleneckAnalysis,
    dependencies: &DependencyAnalysis,
    fragmentation: &FragmentationAnalysis,
) -> String {
    let mut issues = Vec::new();

    if bottlenecks.severity.is_high() {
        if let Some(primary) = &bottlenecks.primary_bottleneck {
            issues.push(format!(
                "{} is a critical coordination bottleneck",
                primary.person
            ));
        }
    }
    if dependencies.severity.is_high() {
        issues.push(format!(
            "{} dependency chains create delays",
            dependencies.total_chains
        ));
    }
    if fragmentation.severity.is_high() {
        issues.push(format!(
            "high task fragmentation ({:.1} score) increases context-switching",
            fragmentation.fragmentation_score
        ));
    }

    if issues.is_empty() {
        "Family coordination is healthy: tasks are well-distributed and dependencies are \
         manageable."
            .to_string()
    } else {
        format!(
            "Coordination challenges: {}. These patterns create invisible coordination burden.",
            issues.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap as Map;

    struct StubRunner {
        responses: Map<CatalogQuery, Vec<Value>>,
        gds_missing: bool,
    }

    #[async_trait]
    impl QueryRunner for StubRunner {
        async fn run_catalog(
            &self,
            query: CatalogQuery,
            _tenant: &TenantId,
        ) -> Result<Vec<Value>> {
            if self.gds_missing && query.descriptor().requires_gds {
                return Err(FamGraphError::GdsUnavailable(
                    GDS_INSTALL_GUIDANCE.to_string(),
                ));
            }
            Ok(self.responses.get(&query).cloned().unwrap_or_default())
        }

        async fn run_cypher(&self, _cypher: &str, _tenant: &TenantId) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn analyzer(responses: Map<CatalogQuery, Vec<Value>>, gds_missing: bool) -> DependencyAnalyzer {
        DependencyAnalyzer::new(
            Arc::new(StubRunner {
                responses,
                gds_missing,
            }),
            SeverityThresholds::default(),
        )
    }

    #[tokio::test]
    async fn missing_extension_degrades_to_unknown_with_guidance() {
        let responses = Map::from([(
            CatalogQuery::DependencyChains,
            vec![json!({"chain": ["Kim", "Alex"], "chain_length": 2})],
        )]);
        let analyzer = analyzer(responses, true);
        let tenant = TenantId::from("fam-1");

        let report = analyzer.analyze_coordination_patterns(&tenant).await;

        assert_eq!(report.bottlenecks.severity, Severity::Unknown);
        assert!(report
            .bottlenecks
            .install_instructions
            .as_deref()
            .is_some_and(|s| !s.is_empty()));
        assert_eq!(report.fragmentation.severity, Severity::Unknown);
        // Non-extension analyses still complete.
        assert_eq!(report.dependencies.total_chains, 1);
        assert_eq!(report.critical_paths.critical_paths.len(), 1);
    }

    #[tokio::test]
    async fn bottleneck_severity_follows_top_score() {
        let responses = Map::from([(
            CatalogQuery::CoordinationBottleneck,
            vec![
                json!({"name": "Kim", "coordination_burden": 0.62}),
                json!({"name": "Sam", "coordination_burden": 0.2}),
            ],
        )]);
        let analyzer = analyzer(responses, false);
        let tenant = TenantId::from("fam-1");

        let analysis = analyzer.detect_coordination_bottlenecks(&tenant).await;

        assert_eq!(analysis.severity, Severity::High);
        let primary = analysis.primary_bottleneck.unwrap();
        assert_eq!(primary.person, "Kim");
        assert_eq!(primary.rank, 1);
        assert!(analysis.insight.contains("3.1x"));
    }

    #[tokio::test]
    async fn long_chain_marks_dependency_analysis_high() {
        let responses = Map::from([(
            CatalogQuery::DependencyChains,
            vec![
                json!({"chain": ["Kim", "Alex", "Sam", "Jo", "laundry"], "chain_length": 4}),
                json!({"chain": ["Sam", "Jo"], "chain_length": 1}),
                json!({"chain": ["Kim", "Jo"], "chain_length": 1}),
            ],
        )]);
        let analyzer = analyzer(responses, false);
        let tenant = TenantId::from("fam-1");

        let analysis = analyzer.analyze_dependency_burden(&tenant).await;

        assert_eq!(analysis.severity, Severity::High);
        assert_eq!(analysis.total_chains, 3);
        assert_eq!(analysis.primary_blocker.unwrap().person, "Kim");
    }

    #[tokio::test]
    async fn single_community_grades_none_despite_high_ratio() {
        let responses = Map::from([(
            CatalogQuery::CommunityFragmentation,
            vec![json!({"name": "Kim", "community_id": 0})],
        )]);
        let analyzer = analyzer(responses, false);
        let tenant = TenantId::from("fam-1");

        let analysis = analyzer.detect_community_fragmentation(&tenant).await;

        // One person, one community: ratio is 1.0 but nothing fragments.
        assert_eq!(analysis.total_communities, 1);
        assert_eq!(analysis.severity, Severity::None);
        assert!(analysis.insight.contains("unified team"));
    }

    #[tokio::test]
    async fn fragmentation_score_is_communities_over_people() {
        let responses = Map::from([(
            CatalogQuery::CommunityFragmentation,
            vec![
                json!({"name": "Kim", "community_id": 0}),
                json!({"name": "Sam", "community_id": 1}),
                json!({"name": "Alex", "community_id": 2}),
                json!({"name": "Jo", "community_id": 2}),
            ],
        )]);
        let analyzer = analyzer(responses, false);
        let tenant = TenantId::from("fam-1");

        let analysis = analyzer.detect_community_fragmentation(&tenant).await;

        assert_eq!(analysis.total_communities, 3);
        assert!((analysis.fragmentation_score - 0.75).abs() < 1e-9);
        assert_eq!(analysis.severity, Severity::High);
    }

    #[tokio::test]
    async fn ripple_impact_graded_by_affected_tasks() {
        let responses = Map::from([(
            CatalogQuery::RippleEffect,
            vec![
                json!({"initiator": "Kim", "affected_people": 3, "affected_tasks": 7, "ripple_severity": "high"}),
                json!({"initiator": "Sam", "affected_people": 1, "affected_tasks": 1, "ripple_severity": "low"}),
            ],
        )]);
        let analyzer = analyzer(responses, false);
        let tenant = TenantId::from("fam-1");

        let analysis = analyzer.analyze_ripple_effects(&tenant).await;

        assert_eq!(analysis.impact, Severity::High);
        assert_eq!(analysis.max_impact, 7);
        assert!(analysis.insight.contains("Kim"));
        assert_eq!(analysis.ripple_effects[1].impact, Severity::Low);
    }

    #[tokio::test]
    async fn empty_graph_reports_none_severity_blocks() {
        let analyzer = analyzer(Map::new(), false);
        let tenant = TenantId::from("fam-1");

        let report = analyzer.analyze_coordination_patterns(&tenant).await;

        assert_eq!(report.bottlenecks.severity, Severity::None);
        assert_eq!(report.dependencies.severity, Severity::None);
        assert_eq!(report.fragmentation.severity, Severity::None);
        assert_eq!(report.severity, Severity::None);
        assert!(report.summary.contains("healthy"));
    }
}
