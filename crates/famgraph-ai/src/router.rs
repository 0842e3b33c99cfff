use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use famgraph_cache::ResponseCache;
use famgraph_core::{FamGraphError, FamilyContext, TenantId};
use famgraph_graph::{CatalogQuery, QueryRunner};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::generator::{build_generation_prompt, validate_query};
use crate::intent::{classify_intent, Intent, IntentType};
use crate::llm_provider::LLMProvider;

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    Template,
    Generated,
    TemplateFallback,
}

/// A ranked observation pulled out of the raw rows for conversational use.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyInsight {
    AnticipationLeader {
        person: String,
        value: f64,
        metric: &'static str,
    },
    MonitoringLeader {
        person: String,
        value: f64,
        metric: &'static str,
    },
    CreationImbalance {
        highest: RatioPoint,
        lowest: RatioPoint,
        gap: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RatioPoint {
    pub person: String,
    #[serde(rename = "creationRatio")]
    pub creation_ratio: f64,
}

/// Conversation-ready shape of a result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedResults {
    pub summary: String,
    pub key_insights: Vec<KeyInsight>,
    pub raw_data: Vec<Value>,
    pub total_records: usize,
}

/// Full response envelope for a natural-language question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub question: String,
    pub intent: Option<IntentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_description: Option<&'static str>,
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<QueryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FormattedResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
    pub processing_time_ms: u64,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_query: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PathMetrics {
    pub count: u64,
    pub total_time_ms: u64,
}

impl PathMetrics {
    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total_time_ms += elapsed.as_millis() as u64;
    }

    fn average_ms(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total_time_ms / self.count
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub template_queries: PathMetrics,
    pub generated_queries: PathMetrics,
    pub cache_hits: u64,
    pub average_template_ms: u64,
    pub average_generated_ms: u64,
    pub cache_hit_rate: f64,
}

#[derive(Default)]
struct RouterMetrics {
    template: PathMetrics,
    generated: PathMetrics,
    cache_hits: u64,
}

/// Routes free-text questions to catalog queries, with a validated
/// generated-query fallback when a language model is available.
pub struct NlQueryRouter {
    runner: Arc<dyn QueryRunner>,
    provider: Option<Arc<dyn LLMProvider>>,
    cache: ResponseCache<QueryResponse>,
    metrics: Mutex<RouterMetrics>,
    llm_timeout: Duration,
}

impl NlQueryRouter {
    pub fn new(
        runner: Arc<dyn QueryRunner>,
        provider: Option<Arc<dyn LLMProvider>>,
        cache_ttl: Duration,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            provider,
            cache: ResponseCache::new(cache_ttl),
            metrics: Mutex::new(RouterMetrics::default()),
            llm_timeout,
        }
    }

    /// Process a natural-language question for a caller.
    ///
    /// Failures are folded into the response envelope rather than returned as
    /// errors; only a rejected generated query produces `success: false`.
    pub async fn process(&self, question: &str, context: &FamilyContext) -> QueryResponse {
        let start = Instant::now();
        let tenant = &context.tenant_id;
        let key = ResponseCache::<QueryResponse>::key(tenant, question);

        if let Some((mut cached, age)) = self.cache.get(&key) {
            self.metrics.lock().cache_hits += 1;
            debug!(question, "cache hit");
            cached.cached = true;
            cached.cache_age_ms = Some(age.as_millis() as u64);
            return cached;
        }

        let intent = classify_intent(question);
        info!(
            question,
            tenant = %tenant,
            user = context.user_name.as_deref().unwrap_or("unknown"),
            intent = intent.intent_type.as_str(),
            confidence = intent.confidence,
            "classified question"
        );

        let (rows, method, generated_query) =
            if intent.intent_type != IntentType::General && intent.confidence >= 0.7 {
                let query_start = Instant::now();
                let rows = self.run_templates(&intent, tenant).await;
                self.metrics.lock().template.record(query_start.elapsed());
                (rows, QueryMethod::Template, None)
            } else if let Some(provider) = self.provider.clone() {
                let query_start = Instant::now();
                match self.run_generated(provider, question, tenant).await {
                    Ok((rows, cypher)) => {
                        self.metrics.lock().generated.record(query_start.elapsed());
                        (rows, QueryMethod::Generated, Some(cypher))
                    }
                    Err(FamGraphError::QueryValidation(reason)) => {
                        // A rejected query never reaches the store; surface the
                        // rejection instead of silently degrading.
                        warn!(question, %reason, "generated query rejected");
                        return QueryResponse {
                            success: false,
                            question: question.to_string(),
                            intent: Some(intent.intent_type),
                            intent_description: Some(intent.description),
                            confidence: Some(intent.confidence),
                            method: Some(QueryMethod::Generated),
                            data: None,
                            error: Some(reason),
                            timestamp: Utc::now().to_rfc3339(),
                            processing_time_ms: start.elapsed().as_millis() as u64,
                            cached: false,
                            cache_age_ms: None,
                            generated_query: None,
                        };
                    }
                    Err(e) => {
                        warn!(question, error = %e, "generation failed, using templates");
                        let fallback_start = Instant::now();
                        let rows = self.run_templates(&intent, tenant).await;
                        self.metrics.lock().template.record(fallback_start.elapsed());
                        (rows, QueryMethod::TemplateFallback, None)
                    }
                }
            } else {
                let query_start = Instant::now();
                let rows = self.run_templates(&intent, tenant).await;
                self.metrics.lock().template.record(query_start.elapsed());
                (rows, QueryMethod::TemplateFallback, None)
            };

        let data = format_results(&rows, &intent);

        let response = QueryResponse {
            success: true,
            question: question.to_string(),
            intent: Some(intent.intent_type),
            intent_description: Some(intent.description),
            confidence: Some(intent.confidence),
            method: Some(method),
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            cached: false,
            cache_age_ms: None,
            generated_query,
        };

        self.cache.insert(key, response.clone());
        response
    }

    /// Execute every catalog query the intent maps to, tagging each row with
    /// the query it came from. Per-query failures are logged and skipped.
    async fn run_templates(&self, intent: &Intent, tenant: &TenantId) -> Vec<Value> {
        let futures = intent.queries.iter().map(|&query| {
            let runner = self.runner.clone();
            let tenant = tenant.clone();
            async move { (query, runner.run_catalog(query, &tenant).await) }
        });

        let mut rows = Vec::new();
        for (query, result) in join_all(futures).await {
            match result {
                Ok(records) => {
                    for mut record in records {
                        if let Some(obj) = record.as_object_mut() {
                            obj.insert(
                                "_source".to_string(),
                                Value::String(query.descriptor().name.to_string()),
                            );
                        }
                        rows.push(record);
                    }
                }
                Err(e) => {
                    warn!(query = query.descriptor().name, error = %e, "template query failed");
                }
            }
        }
        rows
    }

    /// Generate a query via the language model, validate it, and execute it.
    async fn run_generated(
        &self,
        provider: Arc<dyn LLMProvider>,
        question: &str,
        tenant: &TenantId,
    ) -> famgraph_core::Result<(Vec<Value>, String)> {
        let prompt = build_generation_prompt(question, tenant);

        let response = tokio::time::timeout(self.llm_timeout, provider.generate(&prompt))
            .await
            .map_err(|_| {
                FamGraphError::LlmUnavailable("query generation timed out".to_string())
            })?
            .map_err(|e| FamGraphError::LlmUnavailable(e.to_string()))?;

        let cleaned = validate_query(&response.content)?;
        debug!(cypher = %cleaned, "executing generated query");

        let rows = self.runner.run_cypher(&cleaned, tenant).await?;
        Ok((rows, cleaned))
    }

    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        let metrics = self.metrics.lock();
        let total_queries = metrics.cache_hits + metrics.template.count + metrics.generated.count;
        PerformanceMetrics {
            template_queries: metrics.template,
            generated_queries: metrics.generated,
            cache_hits: metrics.cache_hits,
            average_template_ms: metrics.template.average_ms(),
            average_generated_ms: metrics.generated.average_ms(),
            cache_hit_rate: if total_queries == 0 {
                0.0
            } else {
                metrics.cache_hits as f64 / total_queries as f64
            },
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Shape rows into a conversational payload: summary line, ranked insights,
/// and the first ten raw records.
fn format_results(rows: &[Value], intent: &Intent) -> FormattedResults {
    if rows.is_empty() {
        return FormattedResults {
            summary: "No data found for this question. The family might not have enough \
                      activity in the knowledge graph yet."
                .to_string(),
            key_insights: Vec::new(),
            raw_data: Vec::new(),
            total_records: 0,
        };
    }

    FormattedResults {
        summary: generate_summary(rows.len(), intent.intent_type),
        key_insights: extract_key_insights(rows, intent.intent_type),
        raw_data: rows.iter().take(10).cloned().collect(),
        total_records: rows.len(),
    }
}

fn generate_summary(count: usize, intent_type: IntentType) -> String {
    match intent_type {
        IntentType::Anticipation => {
            format!("Found {count} data points about task anticipation and mental load patterns.")
        }
        IntentType::Monitoring => {
            format!("Found {count} data points about task monitoring and follow-up patterns.")
        }
        IntentType::Burnout => {
            format!("Analyzed {count} data points related to cognitive load and burnout risk.")
        }
        IntentType::Fairness => {
            format!("Found {count} data points about workload distribution and fairness.")
        }
        IntentType::Bottleneck => {
            format!("Identified {count} potential bottlenecks and dependencies.")
        }
        IntentType::Temporal => {
            format!("Found {count} temporal patterns in task creation and scheduling.")
        }
        IntentType::Research | IntentType::General => {
            format!("Retrieved {count} data points from the family knowledge graph.")
        }
    }
}

fn field_f64(row: &Value, field: &str) -> Option<f64> {
    row.get(field).and_then(Value::as_f64)
}

fn field_str<'a>(row: &'a Value, field: &str) -> Option<&'a str> {
    row.get(field).and_then(Value::as_str)
}

fn extract_key_insights(rows: &[Value], intent_type: IntentType) -> Vec<KeyInsight> {
    let mut insights = Vec::new();

    match intent_type {
        IntentType::Anticipation | IntentType::Burnout => {
            // Person carrying the heaviest anticipation load.
            let leader = rows
                .iter()
                .filter(|r| field_str(r, "person").is_some())
                .max_by(|a, b| {
                    anticipation_value(a)
                        .partial_cmp(&anticipation_value(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some(row) = leader {
                let (value, metric) = if let Some(v) = field_f64(row, "tasks_anticipated") {
                    (v, "tasks_anticipated")
                } else {
                    (
                        field_f64(row, "anticipation_burden").unwrap_or(0.0),
                        "anticipation_burden",
                    )
                };
                if let Some(person) = field_str(row, "person") {
                    insights.push(KeyInsight::AnticipationLeader {
                        person: person.to_string(),
                        value,
                        metric,
                    });
                }
            }
        }

        IntentType::Monitoring => {
            let leader = rows
                .iter()
                .filter(|r| field_str(r, "monitor").is_some())
                .max_by(|a, b| {
                    monitoring_value(a)
                        .partial_cmp(&monitoring_value(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some(row) = leader {
                let (value, metric) = if let Some(v) = field_f64(row, "monitoring_actions") {
                    (v, "monitoring_actions")
                } else {
                    (
                        field_f64(row, "nagging_hours_per_week").unwrap_or(0.0),
                        "nagging_hours_per_week",
                    )
                };
                if let Some(person) = field_str(row, "monitor") {
                    insights.push(KeyInsight::MonitoringLeader {
                        person: person.to_string(),
                        value,
                        metric,
                    });
                }
            }
        }

        IntentType::Fairness => {
            let mut people: Vec<(&str, f64)> = rows
                .iter()
                .filter_map(|r| {
                    let person = field_str(r, "person")?;
                    let ratio = field_f64(r, "creation_ratio")?;
                    Some((person, ratio))
                })
                .collect();

            if people.len() >= 2 {
                people.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                let highest = &people[0];
                let lowest = &people[people.len() - 1];
                insights.push(KeyInsight::CreationImbalance {
                    highest: RatioPoint {
                        person: highest.0.to_string(),
                        creation_ratio: highest.1,
                    },
                    lowest: RatioPoint {
                        person: lowest.0.to_string(),
                        creation_ratio: lowest.1,
                    },
                    gap: highest.1 - lowest.1,
                });
            }
        }

        _ => {}
    }

    insights
}

fn anticipation_value(row: &Value) -> f64 {
    field_f64(row, "tasks_anticipated")
        .or_else(|| field_f64(row, "anticipation_burden"))
        .unwrap_or(0.0)
}

fn monitoring_value(row: &Value) -> f64 {
    field_f64(row, "monitoring_actions")
        .or_else(|| field_f64(row, "nagging_hours_per_week"))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_provider::{GenerationConfig, LLMResponse, LLMResult, Message};
    use async_trait::async_trait;
    use famgraph_core::Result;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRunner {
        catalog_rows: Vec<Value>,
        cypher_rows: Vec<Value>,
        cypher_calls: AtomicUsize,
    }

    impl StubRunner {
        fn new(catalog_rows: Vec<Value>) -> Self {
            Self {
                catalog_rows,
                cypher_rows: Vec::new(),
                cypher_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryRunner for StubRunner {
        async fn run_catalog(&self, _query: CatalogQuery, _tenant: &TenantId) -> Result<Vec<Value>> {
            Ok(self.catalog_rows.clone())
        }

        async fn run_cypher(&self, _cypher: &str, _tenant: &TenantId) -> Result<Vec<Value>> {
            self.cypher_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cypher_rows.clone())
        }
    }

    struct StubProvider {
        reply: std::result::Result<String, String>,
    }

    #[async_trait]
    impl LLMProvider for StubProvider {
        async fn generate_chat(
            &self,
            _messages: &[Message],
            _config: &GenerationConfig,
        ) -> LLMResult<LLMResponse> {
            match &self.reply {
                Ok(content) => Ok(LLMResponse {
                    content: content.clone(),
                    total_tokens: Some(42),
                    finish_reason: Some("stop".to_string()),
                    model: "stub".to_string(),
                }),
                Err(e) => Err(anyhow::anyhow!(e.clone())),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn provider_name(&self) -> &str {
            "stub"
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn router_with(runner: Arc<StubRunner>, provider: Option<Arc<dyn LLMProvider>>) -> NlQueryRouter {
        NlQueryRouter::new(
            runner,
            provider,
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn template_path_tags_rows_with_source() {
        let runner = Arc::new(StubRunner::new(vec![
            json!({"monitor": "Maria", "monitoring_actions": 12.0}),
        ]));
        let router = router_with(runner, None);
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Who has to nag everyone?", &ctx).await;

        assert!(response.success);
        assert_eq!(response.method, Some(QueryMethod::Template));
        let data = response.data.unwrap();
        assert_eq!(data.total_records, 1);
        assert_eq!(data.raw_data[0]["_source"], "monitoringOverhead");
        assert!(matches!(
            data.key_insights[0],
            KeyInsight::MonitoringLeader { .. }
        ));
    }

    #[tokio::test]
    async fn second_identical_question_is_served_from_cache() {
        let runner = Arc::new(StubRunner::new(vec![json!({"person": "Kim"})]));
        let router = router_with(runner, None);
        let ctx = FamilyContext::new("fam-1");

        let first = router.process("Who notices tasks?", &ctx).await;
        assert!(!first.cached);

        let second = router.process("Who Notices Tasks?", &ctx).await;
        assert!(second.cached);
        assert!(second.cache_age_ms.is_some());

        let metrics = router.get_performance_metrics();
        assert_eq!(metrics.cache_hits, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed_and_reported_uncached() {
        let runner = Arc::new(StubRunner::new(vec![json!({"person": "Kim"})]));
        let router = NlQueryRouter::new(
            runner,
            None,
            Duration::from_millis(50),
            Duration::from_secs(5),
        );
        let ctx = FamilyContext::new("fam-1");

        let first = router.process("Who notices tasks?", &ctx).await;
        assert!(!first.cached);

        let second = router.process("Who notices tasks?", &ctx).await;
        assert!(second.cached);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let third = router.process("Who notices tasks?", &ctx).await;
        assert!(!third.cached);
        assert!(third.cache_age_ms.is_none());
        assert_eq!(router.get_performance_metrics().cache_hits, 1);
    }

    #[tokio::test]
    async fn cache_entries_do_not_cross_tenants() {
        let runner = Arc::new(StubRunner::new(vec![json!({"person": "Kim"})]));
        let router = router_with(runner, None);

        let first = router
            .process("Who notices tasks?", &FamilyContext::new("fam-1"))
            .await;
        assert!(!first.cached);

        let other_family = router
            .process("Who notices tasks?", &FamilyContext::new("fam-2"))
            .await;
        assert!(!other_family.cached);
        assert_eq!(router.get_performance_metrics().cache_hits, 0);
    }

    #[tokio::test]
    async fn response_carries_intent_description() {
        let runner = Arc::new(StubRunner::new(vec![
            json!({"monitor": "Maria", "monitoring_actions": 12.0}),
        ]));
        let router = router_with(runner, None);
        let ctx = FamilyContext {
            tenant_id: TenantId::from("fam-1"),
            user_id: Some("u-1".to_string()),
            user_name: Some("Maria".to_string()),
        };

        let response = router.process("Who has to nag everyone?", &ctx).await;

        assert_eq!(
            response.intent_description,
            Some("Questions about following up on tasks")
        );
    }

    #[tokio::test]
    async fn general_question_without_provider_uses_template_fallback() {
        let runner = Arc::new(StubRunner::new(vec![json!({"person": "Kim"})]));
        let router = router_with(runner, None);
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Tell me something", &ctx).await;

        assert!(response.success);
        assert_eq!(response.intent, Some(IntentType::General));
        assert_eq!(response.method, Some(QueryMethod::TemplateFallback));
    }

    #[tokio::test]
    async fn invalid_generated_query_is_rejected_before_execution() {
        let runner = Arc::new(StubRunner::new(Vec::new()));
        let provider: Arc<dyn LLMProvider> = Arc::new(StubProvider {
            reply: Ok("MATCH (p:Person) RETURN p.name".to_string()),
        });
        let router = router_with(runner.clone(), Some(provider));
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Tell me something", &ctx).await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("tenant filter"));
        assert_eq!(runner.cypher_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_generated_query_reports_generated_method() {
        let runner = Arc::new(StubRunner::new(Vec::new()));
        let provider: Arc<dyn LLMProvider> = Arc::new(StubProvider {
            reply: Ok(
                "MATCH (p:Person {tenantId: $tenantId}) RETURN p.name AS person LIMIT 10"
                    .to_string(),
            ),
        });
        let router = router_with(runner.clone(), Some(provider));
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Tell me something", &ctx).await;

        assert!(response.success);
        assert_eq!(response.method, Some(QueryMethod::Generated));
        assert!(response.generated_query.unwrap().contains("tenantId"));
        assert_eq!(runner.cypher_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_templates() {
        let runner = Arc::new(StubRunner::new(vec![json!({"person": "Kim"})]));
        let provider: Arc<dyn LLMProvider> = Arc::new(StubProvider {
            reply: Err("model overloaded".to_string()),
        });
        let router = router_with(runner, Some(provider));
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Tell me something", &ctx).await;

        assert!(response.success);
        assert_eq!(response.method, Some(QueryMethod::TemplateFallback));
        assert!(response.data.unwrap().total_records > 0);
    }

    #[tokio::test]
    async fn empty_results_produce_no_data_summary() {
        let runner = Arc::new(StubRunner::new(Vec::new()));
        let router = router_with(runner, None);
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Who has to nag everyone?", &ctx).await;

        let data = response.data.unwrap();
        assert!(data.summary.contains("No data found"));
        assert_eq!(data.total_records, 0);
        assert!(data.key_insights.is_empty());
    }

    #[tokio::test]
    async fn fairness_insight_reports_creation_gap() {
        let runner = Arc::new(StubRunner::new(vec![
            json!({"person": "Kim", "creation_ratio": 0.8, "execution_ratio": 0.3}),
            json!({"person": "Sam", "creation_ratio": 0.2, "execution_ratio": 0.7}),
        ]));
        let router = router_with(runner, None);
        let ctx = FamilyContext::new("fam-1");

        let response = router.process("Is the split fair?", &ctx).await;

        let data = response.data.unwrap();
        match &data.key_insights[0] {
            KeyInsight::CreationImbalance { highest, lowest, gap } => {
                assert_eq!(highest.person, "Kim");
                assert_eq!(lowest.person, "Sam");
                assert!((gap - 0.6).abs() < 1e-9);
            }
            other => panic!("unexpected insight: {other:?}"),
        }
    }
}
