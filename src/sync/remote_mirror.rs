// ==========================================
// PrintFlow APS - Remote mirror interface
// ==========================================
// REPLACE-style sync: delete the remote future
// window, then rewrite it in full, keyed by stable
// identifiers so repeated syncs cannot accrete.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

// ==========================================
// SyncError
// ==========================================
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no authenticated user for remote sync")]
    NoUser,

    #[error("no workspace selected for remote sync")]
    NoWorkspace,

    #[error("deferred: {orphaned} cycle(s) reference projects without a remote identifier")]
    DeferredRace { orphaned: usize },

    #[error("{failed} of {total} cycle upserts failed")]
    UpsertFailed { failed: usize, total: usize },

    #[error("transport failure: {0}")]
    Transport(String),
}

// ==========================================
// SyncContext - who is syncing, where to
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    pub user_id: Option<String>,
    pub workspace_id: Option<String>,
}

impl SyncContext {
    pub fn require_workspace(&self) -> Result<&str, SyncError> {
        if self.user_id.is_none() {
            return Err(SyncError::NoUser);
        }
        self.workspace_id.as_deref().ok_or(SyncError::NoWorkspace)
    }
}

// ==========================================
// RemoteMirror trait
// ==========================================
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Delete remote planned/scheduled cycles from `from` forward.
    /// Returns how many were removed.
    async fn delete_cycles_from(
        &self,
        workspace_id: &str,
        from: NaiveDateTime,
    ) -> Result<usize, SyncError>;

    /// Upsert one cycle under its stable identifier. `remote_project_id`
    /// is the mirror-side project key the cycle must reference.
    async fn upsert_cycle(
        &self,
        workspace_id: &str,
        legacy_id: &str,
        remote_project_id: &str,
        cycle: &PlannedCycle,
    ) -> Result<(), SyncError>;
}

// ==========================================
// NoopRemoteMirror - offline operation
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct NoopRemoteMirror;

#[async_trait]
impl RemoteMirror for NoopRemoteMirror {
    async fn delete_cycles_from(
        &self,
        workspace_id: &str,
        from: NaiveDateTime,
    ) -> Result<usize, SyncError> {
        tracing::debug!(workspace_id, %from, "noop mirror: skipping delete");
        Ok(0)
    }

    async fn upsert_cycle(
        &self,
        _workspace_id: &str,
        _legacy_id: &str,
        _remote_project_id: &str,
        _cycle: &PlannedCycle,
    ) -> Result<(), SyncError> {
        Ok(())
    }
}

// ==========================================
// InMemoryRemoteMirror - test double
// ==========================================
#[derive(Debug, Default)]
pub struct InMemoryRemoteMirror {
    cycles: Mutex<HashMap<String, (String, PlannedCycle)>>,
}

impl InMemoryRemoteMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.lock().expect("mirror lock").len()
    }

    pub fn get(&self, legacy_id: &str) -> Option<PlannedCycle> {
        self.cycles
            .lock()
            .expect("mirror lock")
            .get(legacy_id)
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl RemoteMirror for InMemoryRemoteMirror {
    async fn delete_cycles_from(
        &self,
        _workspace_id: &str,
        from: NaiveDateTime,
    ) -> Result<usize, SyncError> {
        let mut cycles = self.cycles.lock().expect("mirror lock");
        let before = cycles.len();
        cycles.retain(|_, (_, c)| c.start_time < from);
        Ok(before - cycles.len())
    }

    async fn upsert_cycle(
        &self,
        _workspace_id: &str,
        legacy_id: &str,
        remote_project_id: &str,
        cycle: &PlannedCycle,
    ) -> Result<(), SyncError> {
        self.cycles
            .lock()
            .expect("mirror lock")
            .insert(legacy_id.to_string(), (remote_project_id.to_string(), cycle.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_context_requires_user_then_workspace() {
        let empty = SyncContext::default();
        assert!(matches!(empty.require_workspace(), Err(SyncError::NoUser)));

        let user_only = SyncContext {
            user_id: Some("u1".to_string()),
            workspace_id: None,
        };
        assert!(matches!(
            user_only.require_workspace(),
            Err(SyncError::NoWorkspace)
        ));

        let full = SyncContext {
            user_id: Some("u1".to_string()),
            workspace_id: Some("w1".to_string()),
        };
        assert_eq!(full.require_workspace().unwrap(), "w1");
    }
}
