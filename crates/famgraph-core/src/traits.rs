use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, TenantId};

/// Entity counts reported by one synchronization pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub members: usize,
    pub tasks: usize,
    pub events: usize,
}

/// One-way feed from the document store into the graph. The engine never
/// drives writes itself; it can only request an on-demand pass before
/// answering a question against stale data.
#[async_trait]
pub trait FamilyDataFeed: Send + Sync {
    async fn sync_family_data(&self, tenant: &TenantId) -> Result<SyncCounts>;
}
