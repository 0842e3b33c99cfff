use famgraph_core::{FamGraphError, Result, TenantId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{decode_rows, GraphClient};

/// Guidance returned when a graph-algorithms query fails because the GDS
/// plugin is not installed on the store.
pub const GDS_INSTALL_GUIDANCE: &str = "Coordination analyses require the Neo4j Graph Data \
     Science plugin. Download the plugin jar into the server's plugins directory and restart \
     the database, then re-run the analysis.";

/// The fixed set of analytical queries. Each entry answers one
/// invisible-labor or coordination question, always filtered by tenant and
/// always returning plain scalar records with an explicit ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogQuery {
    /// Who notices tasks before anyone assigns them.
    AnticipationBurden,
    /// Who follows up on other people's incomplete tasks, and for how long.
    MonitoringOverhead,
    /// Who researches decisions they do not get to make.
    DecisionResearchGap,
    /// Per-person ratio of task creation to task execution.
    TaskCreationVsExecution,
    /// Per-person split between invisible phases and visible execution.
    PhaseDistribution,
    /// Person sitting on the most coordination paths between others.
    CoordinationBottleneck,
    /// Task clusters per person (context-switching fragmentation).
    CommunityFragmentation,
    /// Longest chains of blocking tasks.
    DependencyChains,
    /// Cascading effects of a disruption event.
    RippleEffect,
    /// Raw task-creation timestamps for temporal bucketing.
    TemporalTaskCreation,
}

/// Static description of one catalog entry.
pub struct QueryDescriptor {
    pub name: &'static str,
    pub cypher: &'static str,
    /// Whether the query calls into the graph-algorithms extension, which
    /// may not be installed.
    pub requires_gds: bool,
}

impl CatalogQuery {
    pub const ALL: [CatalogQuery; 10] = [
        CatalogQuery::AnticipationBurden,
        CatalogQuery::MonitoringOverhead,
        CatalogQuery::DecisionResearchGap,
        CatalogQuery::TaskCreationVsExecution,
        CatalogQuery::PhaseDistribution,
        CatalogQuery::CoordinationBottleneck,
        CatalogQuery::CommunityFragmentation,
        CatalogQuery::DependencyChains,
        CatalogQuery::RippleEffect,
        CatalogQuery::TemporalTaskCreation,
    ];

    /// Lookup by external name. This is the only string entry point (used by
    /// the natural-language router); everything else matches on the enum.
    pub fn from_name(name: &str) -> Result<Self> {
        let q = match name {
            "anticipationBurden" => CatalogQuery::AnticipationBurden,
            "monitoringOverhead" => CatalogQuery::MonitoringOverhead,
            "decisionResearchGap" => CatalogQuery::DecisionResearchGap,
            "taskCreationVsExecution" => CatalogQuery::TaskCreationVsExecution,
            "phaseDistribution" => CatalogQuery::PhaseDistribution,
            "coordinationBottleneck" => CatalogQuery::CoordinationBottleneck,
            "communityFragmentation" => CatalogQuery::CommunityFragmentation,
            "dependencyChains" => CatalogQuery::DependencyChains,
            "rippleEffect" => CatalogQuery::RippleEffect,
            "temporalTaskCreation" => CatalogQuery::TemporalTaskCreation,
            other => return Err(FamGraphError::QueryNotFound(other.to_string())),
        };
        Ok(q)
    }

    pub fn descriptor(&self) -> QueryDescriptor {
        match self {
            CatalogQuery::AnticipationBurden => QueryDescriptor {
                name: "anticipationBurden",
                requires_gds: false,
                cypher: r#"
MATCH (p:Person {tenantId: $tenantId})-[a:ANTICIPATES]->(t:Task {tenantId: $tenantId})
WHERE NOT (p)-[:ASSIGNED_TO]->(t)
WITH p,
     count(t) AS tasks_anticipated,
     avg(coalesce(a.leadTime, 0.0)) AS avg_lead_time_days
RETURN p.name AS person,
       tasks_anticipated,
       avg_lead_time_days,
       tasks_anticipated * (1.0 + avg_lead_time_days / 7.0) AS anticipation_burden
ORDER BY tasks_anticipated DESC
"#,
            },
            CatalogQuery::MonitoringOverhead => QueryDescriptor {
                name: "monitoringOverhead",
                requires_gds: false,
                cypher: r#"
MATCH (p:Person {tenantId: $tenantId})-[m:MONITORS]->(t:Task {tenantId: $tenantId})
WHERE NOT (p)-[:EXECUTES]->(t)
WITH p,
     count(m) AS monitoring_actions,
     sum(coalesce(m.timeSpent, 0.0)) AS total_minutes,
     avg(coalesce(m.interventionCount, 0.0)) AS avg_interventions_per_task
RETURN p.name AS monitor,
       monitoring_actions,
       total_minutes / 60.0 AS monitoring_hours_per_week,
       avg_interventions_per_task,
       total_minutes / 60.0 / 4.0 AS nagging_hours_per_week
ORDER BY nagging_hours_per_week DESC
"#,
            },
            CatalogQuery::DecisionResearchGap => QueryDescriptor {
                name: "decisionResearchGap",
                requires_gds: false,
                cypher: r#"
MATCH (r:Person {tenantId: $tenantId})-[io:IDENTIFIES_OPTIONS]->(d:Task {tenantId: $tenantId})
MATCH (d)<-[:DECIDES]-(dec:Person {tenantId: $tenantId})
WHERE r <> dec
WITH r, dec,
     count(DISTINCT d) AS decisions_researched_not_made,
     sum(coalesce(io.timeSpent, 30.0)) AS invisible_research_minutes
RETURN r.name AS researcher,
       dec.name AS decider,
       invisible_research_minutes,
       decisions_researched_not_made
ORDER BY invisible_research_minutes DESC
"#,
            },
            CatalogQuery::TaskCreationVsExecution => QueryDescriptor {
                name: "taskCreationVsExecution",
                requires_gds: false,
                cypher: r#"
MATCH (p:Person {tenantId: $tenantId})
OPTIONAL MATCH (p)-[:CREATED]->(c:Task {tenantId: $tenantId})
WITH p, count(c) AS created
OPTIONAL MATCH (p)-[:EXECUTES]->(e:Task {tenantId: $tenantId})
WITH p, created, count(e) AS executed
WHERE created + executed > 0
RETURN p.name AS person,
       created,
       executed,
       toFloat(created) / (created + executed) AS creation_ratio,
       toFloat(executed) / (created + executed) AS execution_ratio
ORDER BY creation_ratio DESC
"#,
            },
            CatalogQuery::PhaseDistribution => QueryDescriptor {
                name: "phaseDistribution",
                requires_gds: false,
                cypher: r#"
MATCH (p:Person {tenantId: $tenantId})
OPTIONAL MATCH (tc:Task {tenantId: $tenantId}) WHERE tc.conceptionPhasePerson = p.id
WITH p, sum(coalesce(tc.conceptionPhaseTime, 0.0)) AS conception
OPTIONAL MATCH (tp:Task {tenantId: $tenantId}) WHERE tp.planningPhasePerson = p.id
WITH p, conception, sum(coalesce(tp.planningPhaseTime, 0.0)) AS planning
OPTIONAL MATCH (te:Task {tenantId: $tenantId}) WHERE te.executionPhasePerson = p.id
WITH p, conception, planning, sum(coalesce(te.executionPhaseTime, 0.0)) AS execution
WITH p,
     conception + planning AS invisible_labor_minutes,
     execution AS visible_labor_minutes
WHERE invisible_labor_minutes + visible_labor_minutes > 0
RETURN p.name AS name,
       invisible_labor_minutes,
       visible_labor_minutes,
       invisible_labor_minutes / (invisible_labor_minutes + visible_labor_minutes)
           AS invisible_percentage
ORDER BY invisible_percentage DESC
"#,
            },
            CatalogQuery::CoordinationBottleneck => QueryDescriptor {
                name: "coordinationBottleneck",
                requires_gds: true,
                cypher: r#"
MATCH (q:Person {tenantId: $tenantId})
WITH count(q) AS people
CALL gds.betweenness.stream({
    nodeQuery: 'MATCH (p:Person) WHERE p.tenantId = $tenantId RETURN id(p) AS id',
    relationshipQuery: 'MATCH (a:Person)-[:CREATED|ANTICIPATES|MONITORS|EXECUTES]->(t:Task)<-[:CREATED|ANTICIPATES|MONITORS|EXECUTES]-(b:Person)
                        WHERE a.tenantId = $tenantId AND b.tenantId = $tenantId AND a <> b
                        RETURN id(a) AS source, id(b) AS target',
    parameters: { tenantId: $tenantId }
})
YIELD nodeId, score
WITH gds.util.asNode(nodeId) AS person, score, people
WITH person,
     CASE WHEN people > 2
          THEN score / ((people - 1) * (people - 2) / 2.0)
          ELSE score END AS coordination_burden
WHERE coordination_burden > 0
RETURN person.name AS name, coordination_burden
ORDER BY coordination_burden DESC
"#,
            },
            CatalogQuery::CommunityFragmentation => QueryDescriptor {
                name: "communityFragmentation",
                requires_gds: true,
                cypher: r#"
CALL gds.louvain.stream({
    nodeQuery: 'MATCH (p:Person) WHERE p.tenantId = $tenantId RETURN id(p) AS id',
    relationshipQuery: 'MATCH (a:Person)-[:CREATED|EXECUTES]->(t:Task)<-[:CREATED|EXECUTES]-(b:Person)
                        WHERE a.tenantId = $tenantId AND b.tenantId = $tenantId AND a <> b
                        RETURN id(a) AS source, id(b) AS target',
    parameters: { tenantId: $tenantId }
})
YIELD nodeId, communityId
WITH gds.util.asNode(nodeId) AS person, communityId
RETURN person.name AS name, communityId AS community_id
ORDER BY community_id, name
"#,
            },
            CatalogQuery::DependencyChains => QueryDescriptor {
                name: "dependencyChains",
                requires_gds: false,
                cypher: r#"
MATCH path = (start:Task {tenantId: $tenantId})-[:DEPENDS_ON*1..6]->(end:Task {tenantId: $tenantId})
WHERE NOT (end)-[:DEPENDS_ON]->(:Task)
  AND NOT (:Task)-[:DEPENDS_ON]->(start)
WITH path,
     [t IN nodes(path) |
        coalesce([(owner:Person)-[:EXECUTES]->(t) | owner.name][0], t.title)] AS chain
RETURN chain, length(path) AS chain_length
ORDER BY chain_length DESC
LIMIT 20
"#,
            },
            CatalogQuery::RippleEffect => QueryDescriptor {
                name: "rippleEffect",
                requires_gds: false,
                cypher: r#"
MATCH (org:Person {tenantId: $tenantId})-[:ORGANIZES]->(e:Event {tenantId: $tenantId})
MATCH (org)-[:CREATED|EXECUTES]->(t0:Task {tenantId: $tenantId})
MATCH (t0)<-[:DEPENDS_ON*1..4]-(affected:Task {tenantId: $tenantId})
OPTIONAL MATCH (affected)<-[:EXECUTES|ASSIGNED_TO]-(ap:Person)
WITH org.name AS initiator,
     count(DISTINCT affected) AS affected_tasks,
     count(DISTINCT ap) AS affected_people
RETURN initiator,
       affected_people,
       affected_tasks,
       CASE WHEN affected_tasks > 5 THEN 'high'
            WHEN affected_tasks > 2 THEN 'medium'
            ELSE 'low' END AS ripple_severity
ORDER BY affected_tasks DESC
"#,
            },
            CatalogQuery::TemporalTaskCreation => QueryDescriptor {
                name: "temporalTaskCreation",
                requires_gds: false,
                cypher: r#"
MATCH (t:Task {tenantId: $tenantId})
WHERE t.createdAt IS NOT NULL
RETURN t.createdAt AS timestamp, t.id AS task_id, t.title AS title
ORDER BY t.createdAt ASC
"#,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Run this catalog entry for one tenant and return normalized rows.
    ///
    /// GDS-backed entries map a missing-procedure failure to
    /// [`FamGraphError::GdsUnavailable`] so the analyzers can degrade instead
    /// of treating it as a database outage.
    pub async fn execute(&self, tenant: &TenantId, client: &GraphClient) -> Result<Vec<Value>> {
        let descriptor = self.descriptor();
        debug!(query = descriptor.name, tenant = %tenant, "executing catalog query");

        let params = [("tenantId", Value::String(tenant.as_str().to_string()))];
        let result = client.run_query(descriptor.cypher, &params).await;

        match result {
            Err(FamGraphError::Database(msg)) if descriptor.requires_gds && looks_like_missing_gds(&msg) => {
                Err(FamGraphError::GdsUnavailable(GDS_INSTALL_GUIDANCE.to_string()))
            }
            other => other,
        }
    }

    /// Run and decode into the entry's typed row struct.
    pub async fn execute_typed<T: DeserializeOwned>(
        &self,
        tenant: &TenantId,
        client: &GraphClient,
    ) -> Result<Vec<T>> {
        let rows = self.execute(tenant, client).await?;
        decode_rows(rows)
    }
}

fn looks_like_missing_gds(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no procedure") || lower.contains("gds") || lower.contains("unknown function")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_query_not_found() {
        let err = CatalogQuery::from_name("nopeNotAQuery").unwrap_err();
        assert!(matches!(err, FamGraphError::QueryNotFound(_)));
    }

    #[test]
    fn names_round_trip() {
        for q in CatalogQuery::ALL {
            assert_eq!(CatalogQuery::from_name(q.name()).unwrap(), q);
        }
    }

    #[test]
    fn every_entry_filters_by_tenant() {
        for q in CatalogQuery::ALL {
            let d = q.descriptor();
            assert!(
                d.cypher.contains("$tenantId"),
                "{} does not filter by tenant",
                d.name
            );
        }
    }

    #[test]
    fn every_entry_orders_explicitly() {
        for q in CatalogQuery::ALL {
            let d = q.descriptor();
            assert!(
                d.cypher.contains("ORDER BY"),
                "{} has no explicit ordering",
                d.name
            );
        }
    }

    #[test]
    fn no_entry_returns_raw_nodes() {
        // RETURN clauses must project scalars; a bare alias like `RETURN p`
        // would leak driver node wrappers into the metric engines.
        for q in CatalogQuery::ALL {
            let d = q.descriptor();
            for line in d.cypher.lines() {
                let trimmed = line.trim();
                if let Some(rest) = trimmed.strip_prefix("RETURN ") {
                    for part in rest.split(',') {
                        let part = part.trim();
                        assert!(
                            part.contains('.')
                                || part.contains(" AS ")
                                || part.contains('(')
                                || part
                                    .chars()
                                    .all(|c| c.is_ascii_lowercase() || c == '_'),
                            "{} may return a raw node: {part}",
                            d.name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn gds_detection_matches_driver_messages() {
        assert!(looks_like_missing_gds(
            "There is no procedure with the name `gds.betweenness.stream` registered"
        ));
        assert!(looks_like_missing_gds("Unknown function 'gds.util.asNode'"));
        assert!(!looks_like_missing_gds("connection refused"));
    }
}
