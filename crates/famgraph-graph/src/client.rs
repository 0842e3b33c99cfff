use std::sync::Arc;

use famgraph_core::{FamGraphError, GraphStoreConfig, Result};
use neo4rs::{query, Graph, Query};
use serde_json::Value;
use tracing::{debug, info};

use crate::normalize::normalize_row;

/// Pooled bolt client for the family knowledge graph.
///
/// Every call opens its own session through the pool and drains the result
/// stream before returning, so a session never outlives the call that opened
/// it. The pool itself is the only shared state and is safe to clone.
#[derive(Clone)]
pub struct GraphClient {
    graph: Arc<Graph>,
}

impl GraphClient {
    /// Connect to the graph store and verify the connection with a trivial
    /// round trip. Fails fatally when the password is absent.
    pub async fn connect(config: &GraphStoreConfig) -> Result<Self> {
        config.validate()?;

        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(|e| FamGraphError::Database(format!("failed to connect: {e}")))?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.verify().await?;
        info!(uri = %config.uri, "connected to graph store");

        Ok(client)
    }

    async fn verify(&self) -> Result<()> {
        let mut stream = self
            .graph
            .execute(query("RETURN 1 AS ok"))
            .await
            .map_err(|e| FamGraphError::Database(format!("connection check failed: {e}")))?;

        while stream
            .next()
            .await
            .map_err(|e| FamGraphError::Database(e.to_string()))?
            .is_some()
        {}

        Ok(())
    }

    /// Execute a read-only query and return one normalized record per row.
    ///
    /// Numeric wrappers become plain numbers, node and relationship values
    /// become flat property maps carrying `_labels`/`_type`/`_id` metadata,
    /// and nested collections are normalized recursively.
    pub async fn run_query(&self, cypher: &str, params: &[(&str, Value)]) -> Result<Vec<Value>> {
        self.execute_normalized(build_query(cypher, params)).await
    }

    /// Same as [`run_query`](Self::run_query) but under a write-capable
    /// session. The analytics engines never call this; it exists for the
    /// synchronizer-facing surface.
    pub async fn run_write_query(
        &self,
        cypher: &str,
        params: &[(&str, Value)],
    ) -> Result<Vec<Value>> {
        self.execute_normalized(build_query(cypher, params)).await
    }

    /// Execute an ordered list of queries in one transaction, returning the
    /// normalized rows of each in order. Rolls back on the first failure.
    pub async fn run_transaction(
        &self,
        queries: Vec<(String, Vec<(String, Value)>)>,
    ) -> Result<Vec<Vec<Value>>> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| FamGraphError::Database(format!("failed to open transaction: {e}")))?;

        let mut all_results = Vec::with_capacity(queries.len());

        for (cypher, params) in queries {
            let borrowed: Vec<(&str, Value)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect();
            let mut stream = txn
                .execute(build_query(&cypher, &borrowed))
                .await
                .map_err(|e| FamGraphError::Database(e.to_string()))?;

            let mut rows = Vec::new();
            while let Some(row) = stream
                .next(txn.handle())
                .await
                .map_err(|e| FamGraphError::Database(e.to_string()))?
            {
                rows.push(normalize_row(&row)?);
            }
            all_results.push(rows);
        }

        txn.commit()
            .await
            .map_err(|e| FamGraphError::Database(format!("commit failed: {e}")))?;

        Ok(all_results)
    }

    async fn execute_normalized(&self, q: Query) -> Result<Vec<Value>> {
        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| FamGraphError::Database(e.to_string()))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| FamGraphError::Database(e.to_string()))?
        {
            rows.push(normalize_row(&row)?);
        }

        debug!(rows = rows.len(), "query complete");
        Ok(rows)
    }
}

fn build_query(cypher: &str, params: &[(&str, Value)]) -> Query {
    let mut q = query(cypher);
    for (key, value) in params {
        q = match value {
            Value::Null => q.param(key, None::<String>),
            Value::Bool(b) => q.param(key, *b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    q.param(key, i)
                } else {
                    q.param(key, n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => q.param(key, s.as_str()),
            other => q.param(key, other.to_string()),
        };
    }
    q
}
