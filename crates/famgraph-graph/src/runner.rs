use async_trait::async_trait;
use famgraph_core::{Result, TenantId};
use serde_json::Value;

use crate::{CatalogQuery, GraphClient};

/// Read-side seam between the metric engines and the graph store.
///
/// The production implementation is [`GraphClient`]; tests substitute a stub
/// that serves canned rows, so engine logic is exercised without a database.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Run one catalog entry for a tenant.
    async fn run_catalog(&self, query: CatalogQuery, tenant: &TenantId) -> Result<Vec<Value>>;

    /// Run an ad hoc read-only query with the tenant bound as `$tenantId`.
    /// Only the natural-language router's validated generated queries and the
    /// temporal detector's raw timestamp scans come through here.
    async fn run_cypher(&self, cypher: &str, tenant: &TenantId) -> Result<Vec<Value>>;
}

#[async_trait]
impl QueryRunner for GraphClient {
    async fn run_catalog(&self, query: CatalogQuery, tenant: &TenantId) -> Result<Vec<Value>> {
        query.execute(tenant, self).await
    }

    async fn run_cypher(&self, cypher: &str, tenant: &TenantId) -> Result<Vec<Value>> {
        let params = [("tenantId", Value::String(tenant.as_str().to_string()))];
        self.run_query(cypher, &params).await
    }
}
