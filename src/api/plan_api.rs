// ==========================================
// PrintFlow APS - Planning API
// ==========================================
// Composition root for the planner: owns the
// repositories, the engine and the recalculator, and
// exposes the operations the application calls.
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::meta::PlanningRunSummary;
use crate::domain::types::PlanScope;
use crate::engine::capacity::{CapacityCalculator, CapacityInfo};
use crate::engine::events::RunLog;
use crate::engine::impact::{DeadlineImpactChecker, DeadlineImpactResult, ProjectDraft};
use crate::engine::planner::PlanningEngine;
use crate::engine::recalc::{RecalcEngine, RecalculateResult};
use crate::engine::repositories::PlanningRepositories;
use crate::engine::snapshot::{PlanOptions, PlanResult};
use crate::engine::validate::{PlanValidation, PlanValidator};
use crate::repository::RepositoryResult;
use crate::sync::{NoopRemoteMirror, RemoteMirror, SyncContext};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// PlanApi
// ==========================================
pub struct PlanApi {
    repos: PlanningRepositories,
    engine: PlanningEngine,
    recalc: RecalcEngine,
}

impl PlanApi {
    /// Open (and bootstrap) the store at `db_path`, with a remote
    /// mirror and sync identity.
    pub fn open(
        db_path: &str,
        mirror: Arc<dyn RemoteMirror>,
        sync_ctx: SyncContext,
    ) -> Result<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn)), mirror, sync_ctx))
    }

    /// Offline variant: no mirror, no identity.
    pub fn open_local(db_path: &str) -> Result<Self> {
        Self::open(db_path, Arc::new(NoopRemoteMirror), SyncContext::default())
    }

    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        mirror: Arc<dyn RemoteMirror>,
        sync_ctx: SyncContext,
    ) -> Self {
        {
            // Idempotent: keep PRAGMA behavior uniform for injected
            // connections too.
            if let Ok(guard) = conn.lock() {
                let _ = configure_sqlite_connection(&guard);
                let _ = init_schema(&guard);
            }
        }
        let repos = PlanningRepositories::from_connection(conn);
        let recalc = RecalcEngine::new(repos.clone(), mirror, sync_ctx);
        Self {
            repos,
            engine: PlanningEngine::new(),
            recalc,
        }
    }

    pub fn repos(&self) -> &PlanningRepositories {
        &self.repos
    }

    // ==========================================
    // Planning operations
    // ==========================================

    /// Pure plan generation: reads a snapshot, returns the result,
    /// persists nothing.
    pub fn generate_plan(&self, options: PlanOptions) -> RepositoryResult<PlanResult> {
        let snapshot = self.repos.snapshot(options.start_time)?;
        let mut log = RunLog::new();
        Ok(self.engine.generate_plan(&snapshot, &options, &mut log))
    }

    /// Recalculate and persist, locally first, then mirror. `now` is
    /// the injected planning clock.
    pub async fn recalculate_plan(
        &self,
        scope: PlanScope,
        lock_in_progress: bool,
        reason: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<RecalculateResult> {
        self.recalc
            .recalculate(scope, lock_in_progress, reason, now)
            .await
    }

    /// Synchronous convenience wrapper around a FROM_NOW recalculation.
    pub fn run_replan_now(
        &self,
        reason: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<RecalculateResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        runtime.block_on(self.recalculate_plan(PlanScope::FromNow, true, reason, now))
    }

    // ==========================================
    // Queries
    // ==========================================

    pub fn check_deadline_impact(
        &self,
        draft: &ProjectDraft,
        now: NaiveDateTime,
    ) -> RepositoryResult<DeadlineImpactResult> {
        let snapshot = self.repos.snapshot(now)?;
        Ok(DeadlineImpactChecker::new().check(&snapshot, draft))
    }

    pub fn validate_existing_plan(&self, now: NaiveDateTime) -> RepositoryResult<PlanValidation> {
        let snapshot = self.repos.snapshot(now)?;
        Ok(PlanValidator::new().validate(&snapshot))
    }

    pub fn calculate_week_capacity(
        &self,
        start_date: NaiveDate,
        now: NaiveDateTime,
    ) -> RepositoryResult<CapacityInfo> {
        let snapshot = self.repos.snapshot(now)?;
        Ok(CapacityCalculator::new().week_capacity(&snapshot, start_date))
    }

    pub fn recent_planning_runs(&self, limit: usize) -> RepositoryResult<Vec<PlanningRunSummary>> {
        self.repos.settings.recent_planning_runs(limit)
    }
}
