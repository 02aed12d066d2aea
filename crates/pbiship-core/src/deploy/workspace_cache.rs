//! Per-run memo of workspace lookups.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::api::{PowerBiApi, ResolvedWorkspace};
use crate::error::Result;

/// Caches resolved workspaces for the lifetime of one run so that artifacts
/// sharing a workspace reference trigger a single remote lookup. Failed
/// lookups are not cached.
#[derive(Debug, Default)]
pub struct WorkspaceCache {
    entries: HashMap<String, ResolvedWorkspace>,
    lookups: usize,
}

impl WorkspaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(
        &mut self,
        reference: &str,
        api: &dyn PowerBiApi,
    ) -> Result<ResolvedWorkspace> {
        if let Some(hit) = self.entries.get(reference) {
            debug!(workspace = %reference, id = %hit.group.id, "workspace cache hit");
            return Ok(hit.clone());
        }

        self.lookups += 1;
        let resolved = api.resolve_workspace(reference).await?;
        info!(
            workspace = %resolved.group.name,
            id = %resolved.group.id,
            capacity = resolved
                .capacity
                .as_ref()
                .map(|c| c.display_name.as_deref().unwrap_or(&c.id))
                .unwrap_or("shared"),
            "resolved workspace"
        );
        self.entries.insert(reference.to_string(), resolved.clone());
        Ok(resolved)
    }

    pub fn get(&self, reference: &str) -> Option<&ResolvedWorkspace> {
        self.entries.get(reference)
    }

    /// Number of remote lookups performed so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
