// ==========================================
// PrintFlow APS - Recalculation engine
// ==========================================
// The only component that writes the plan. Preserves
// in-flight and manually locked work, replaces the
// future atomically in the local store, then pushes
// a REPLACE-style sync to the remote mirror. Local
// success stands even when the mirror is unreachable.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::meta::PlanningRunSummary;
use crate::domain::types::PlanScope;
use crate::engine::events::RunLog;
use crate::engine::planner::PlanningEngine;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::snapshot::{BlockingIssue, PlanOptions, PlanWarning};
use crate::sync::{RemoteMirror, SyncContext, SyncError};
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Planning window the recalculator asks the engine for.
pub const RECALC_DAYS_TO_PLAN: i64 = 7;

// ==========================================
// RecalculateResult
// ==========================================
#[derive(Debug)]
pub struct RecalculateResult {
    /// Local plan write succeeded.
    pub success: bool,
    pub cycles_created: i64,
    pub units_planned: i64,
    pub cycles_preserved: i64,
    pub blocking_issues: Vec<BlockingIssue>,
    pub warnings: Vec<PlanWarning>,
    /// Remote mirror reconciled. A false here with success=true means
    /// the plan is local-only until the next sync.
    pub cloud_sync_success: bool,
    /// The sync was deferred because some project has no remote
    /// identifier yet; the caller should retry later.
    pub deferred: bool,
    /// Cycles that were not pushed to the mirror.
    pub skipped_cycles: i64,
    pub sync_errors: Vec<String>,
    pub duration_ms: i64,
}

// ==========================================
// RecalcEngine
// ==========================================
pub struct RecalcEngine {
    repos: PlanningRepositories,
    mirror: Arc<dyn RemoteMirror>,
    sync_ctx: SyncContext,
    engine: PlanningEngine,
}

impl RecalcEngine {
    pub fn new(
        repos: PlanningRepositories,
        mirror: Arc<dyn RemoteMirror>,
        sync_ctx: SyncContext,
    ) -> Self {
        Self {
            repos,
            mirror,
            sync_ctx,
            engine: PlanningEngine::new(),
        }
    }

    /// Full recalculation: classify, replan, persist, sync, log.
    /// `now` is the injected planning clock.
    pub async fn recalculate(
        &self,
        scope: PlanScope,
        lock_in_progress: bool,
        reason: &str,
        now: NaiveDateTime,
    ) -> crate::repository::RepositoryResult<RecalculateResult> {
        let started = std::time::Instant::now();
        info!(%scope, lock_in_progress, reason, "recalculation started");

        // ==========================================
        // Step 1: classify existing cycles
        // ==========================================
        let mut snapshot = self.repos.snapshot(now)?;
        let (preserved, discarded): (Vec<PlannedCycle>, Vec<PlannedCycle>) = snapshot
            .existing_cycles
            .iter()
            .cloned()
            .partition(|c| c.is_preserved(lock_in_progress));
        info!(
            preserved = preserved.len(),
            discarded = discarded.len(),
            "existing cycles classified"
        );

        // ==========================================
        // Step 2: scope start & engine run
        // ==========================================
        let start_time = Self::start_time_for_scope(scope, now);
        snapshot.existing_cycles = preserved.clone();

        let options = PlanOptions {
            start_time,
            days_to_plan: RECALC_DAYS_TO_PLAN,
            scope,
            lock_in_progress,
        };
        let mut log = RunLog::new();
        let result = self.engine.generate_plan(&snapshot, &options, &mut log);

        // ==========================================
        // Step 3: merge, dedup, persist locally
        // ==========================================
        let combined = Self::merge_and_dedup(preserved.clone(), result.cycles.clone());
        self.repos.cycles.replace_all(&combined)?;

        // ==========================================
        // Step 4: remote mirror sync (best effort)
        // ==========================================
        let new_cycle_count = result.cycles.len();
        let mut cloud_sync_success = true;
        let mut deferred = false;
        let mut skipped_cycles: i64 = 0;
        let mut sync_errors: Vec<String> = Vec::new();

        match self.sync_to_mirror(&combined, start_time).await {
            Ok(()) => {}
            Err(e) => {
                cloud_sync_success = false;
                if let SyncError::DeferredRace { .. } = e {
                    deferred = true;
                    skipped_cycles = new_cycle_count as i64;
                }
                warn!(error = %e, "remote sync failed; plan is local-only");
                sync_errors.push(e.to_string());
            }
        }

        // ==========================================
        // Step 5: meta + planning log
        // ==========================================
        let mut meta = self.repos.settings.get_planning_meta()?;
        meta.last_recalculated_at = Some(now);
        meta.capacity_changed_since_last_recalculation = false;
        meta.last_capacity_change_reason = None;
        self.repos.settings.save_planning_meta(&meta)?;

        let duration_ms = started.elapsed().as_millis() as i64;
        self.repos.settings.append_planning_log(&PlanningRunSummary {
            entry_id: Uuid::new_v4().to_string(),
            started_at: now,
            reason: reason.to_string(),
            scope: scope.to_string(),
            projects_considered: snapshot.projects.len() as i64,
            printers_available: snapshot.printers.len() as i64,
            cycles_preserved: preserved.len() as i64,
            cycles_created: new_cycle_count as i64,
            units_planned: result.units_planned,
            warnings: result.warnings.len() as i64,
            errors: result.blocking_issues.len() as i64,
            duration_ms,
        })?;

        info!(
            cycles_created = new_cycle_count,
            units_planned = result.units_planned,
            cloud_sync_success,
            duration_ms,
            "recalculation finished"
        );

        Ok(RecalculateResult {
            success: true,
            cycles_created: new_cycle_count as i64,
            units_planned: result.units_planned,
            cycles_preserved: preserved.len() as i64,
            blocking_issues: result.blocking_issues,
            warnings: result.warnings,
            cloud_sync_success,
            deferred,
            skipped_cycles,
            sync_errors,
            duration_ms,
        })
    }

    /// FROM_NOW keeps the injected clock; FROM_TOMORROW and WHOLE_WEEK
    /// snap to midnight boundaries.
    fn start_time_for_scope(scope: PlanScope, now: NaiveDateTime) -> NaiveDateTime {
        match scope {
            PlanScope::FromNow => now,
            PlanScope::FromTomorrow => (now.date() + Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .expect("valid midnight"),
            PlanScope::WholeWeek => now.date().and_hms_opt(0, 0, 0).expect("valid midnight"),
        }
    }

    /// Preserved first, new cycles after; duplicates on
    /// (printer, start) keep the last occurrence and warn.
    fn merge_and_dedup(
        preserved: Vec<PlannedCycle>,
        produced: Vec<PlannedCycle>,
    ) -> Vec<PlannedCycle> {
        let mut by_key: HashMap<(String, NaiveDateTime), usize> = HashMap::new();
        let mut merged: Vec<Option<PlannedCycle>> = Vec::new();

        for cycle in preserved.into_iter().chain(produced.into_iter()) {
            let key = (cycle.printer_id.clone(), cycle.start_time);
            if let Some(prev_idx) = by_key.get(&key) {
                warn!(
                    printer_id = %key.0,
                    start_time = %key.1,
                    "duplicate cycle slot; keeping the last occurrence"
                );
                merged[*prev_idx] = None;
            }
            by_key.insert(key, merged.len());
            merged.push(Some(cycle));
        }

        merged.into_iter().flatten().collect()
    }

    /// REPLACE-style mirror sync: resolve remote project identifiers,
    /// delete the remote future window, upsert the new set. Any
    /// project without a remote identifier defers the whole sync.
    async fn sync_to_mirror(
        &self,
        combined: &[PlannedCycle],
        start_time: NaiveDateTime,
    ) -> Result<(), SyncError> {
        let workspace_id = self.sync_ctx.require_workspace()?.to_string();

        let window: Vec<&PlannedCycle> = combined
            .iter()
            .filter(|c| c.start_time >= start_time)
            .collect();
        if window.is_empty() {
            return Ok(());
        }

        // Local -> remote project identifier lookup, rebuilt per sync.
        let all_projects = self
            .repos
            .projects
            .list_all()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let mut remote_ids: HashMap<&str, String> = HashMap::new();
        for project in &all_projects {
            if let Some(remote) = project.cloud_id.clone().or_else(|| project.legacy_id.clone()) {
                remote_ids.insert(project.project_id.as_str(), remote);
            }
        }

        // A referenced project without a remote identifier is a race
        // with project sync; retry later rather than write a broken
        // remote plan.
        let orphaned = window
            .iter()
            .filter(|c| !remote_ids.contains_key(c.project_id.as_str()))
            .count();
        if orphaned > 0 {
            return Err(SyncError::DeferredRace { orphaned });
        }

        let deleted = self
            .mirror
            .delete_cycles_from(&workspace_id, start_time)
            .await?;
        tracing::debug!(deleted, "remote window cleared");

        let total = window.len();
        let mut failed = 0usize;
        for cycle in window {
            let remote_project = &remote_ids[cycle.project_id.as_str()];
            if let Err(e) = self
                .mirror
                .upsert_cycle(&workspace_id, &cycle.cycle_id, remote_project, cycle)
                .await
            {
                warn!(cycle_id = %cycle.cycle_id, error = %e, "cycle upsert failed");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(SyncError::UpsertFailed { failed, total });
        }
        Ok(())
    }
}
