// ==========================================
// Recalculation engine integration tests
// ==========================================
// Store-backed runs: preservation of in-flight and
// locked work, REPLACE-style mirror sync, deferred
// races, planning meta and the run-log ring.
// ==========================================


use chrono::Duration;
use printflow_aps::domain::types::{CycleSource, CycleStatus, PlanScope, Urgency};
use printflow_aps::engine::{PlanningRepositories, RecalcEngine};
use printflow_aps::{InMemoryRemoteMirror, SyncContext};
use std::sync::Arc;
use test_helpers::*;

fn sync_ctx() -> SyncContext {
    SyncContext {
        user_id: Some("operator".to_string()),
        workspace_id: Some("ws-1".to_string()),
    }
}

/// Seed a plannable world: settings saved, one product, one printer
/// with black mounted, material on hand.
fn seed(repos: &PlanningRepositories) {
    repos.settings.save_settings(&settings()).unwrap();
    repos
        .products
        .upsert(&product("PROD-1", 50.0, vec![preset("P1", 8, 2.0, true, true)]))
        .unwrap();
    repos.printers.upsert(&printer("PR-1", Some("black"), false)).unwrap();
    repos.spools.upsert_inventory(&inventory("black", 10_000.0)).unwrap();
    repos.spools.upsert_spool(&spool("S1", "black", 900.0)).unwrap();
}

#[tokio::test]
async fn recalculate_persists_locally_and_mirrors() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    repos
        .projects
        .upsert(&project("Proj1", "PROD-1", "black", 16, monday() + Duration::days(5), Urgency::Normal))
        .unwrap();

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(repos.clone(), mirror.clone(), sync_ctx());

    let result = engine
        .recalculate(PlanScope::FromNow, true, "test", dt(2, 9, 0))
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.cloud_sync_success);
    assert_eq!(result.cycles_created, 2);
    assert_eq!(result.units_planned, 16);

    // Local store holds the plan.
    let stored = repos.cycles.list_all().unwrap();
    assert_eq!(stored.len(), 2);

    // Mirror holds the same window.
    assert_eq!(mirror.cycle_count(), 2);
    for cycle in &stored {
        assert!(mirror.get(&cycle.cycle_id).is_some());
    }

    // Meta stamped, log appended.
    let meta = repos.settings.get_planning_meta().unwrap();
    assert_eq!(meta.last_recalculated_at, Some(dt(2, 9, 0)));
    assert!(!meta.capacity_changed_since_last_recalculation);
    let runs = repos.settings.recent_planning_runs(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].cycles_created, 2);
}

#[tokio::test]
async fn preserved_cycles_survive_recalculation_unchanged() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    repos
        .projects
        .upsert(&project("Proj1", "PROD-1", "black", 32, monday() + Duration::days(5), Urgency::Normal))
        .unwrap();

    // History, in-flight work, a manual lock, and a stale auto plan.
    let done = cycle("done", "Proj1", "PR-1", dt(1, 9, 0), dt(1, 11, 0), CycleStatus::Completed);
    let in_flight = cycle("flight", "Proj1", "PR-1", dt(2, 8, 0), dt(2, 10, 0), CycleStatus::InProgress);
    let mut manual = cycle("manual", "Proj1", "PR-1", dt(2, 12, 0), dt(2, 14, 0), CycleStatus::Planned);
    manual.locked = true;
    manual.source = CycleSource::Manual;
    let stale = cycle("stale", "Proj1", "PR-1", dt(2, 10, 30), dt(2, 12, 30), CycleStatus::Planned);
    for c in [&done, &in_flight, &manual, &stale] {
        repos.cycles.insert(c).unwrap();
    }

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(repos.clone(), mirror, sync_ctx());
    let result = engine
        .recalculate(PlanScope::FromNow, true, "test", dt(2, 9, 0))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.cycles_preserved, 3);

    let stored = repos.cycles.list_all().unwrap();
    let find = |id: &str| stored.iter().find(|c| c.cycle_id == id);

    // Preserved cycles come back byte-for-byte.
    assert_eq!(find("done"), Some(&done));
    assert_eq!(find("flight"), Some(&in_flight));
    assert_eq!(find("manual"), Some(&manual));
    // The stale auto plan was discarded and replaced.
    assert!(find("stale").is_none());

    // New work flows around the preserved cycles: nothing overlaps.
    let mut non_terminal: Vec<_> = stored
        .iter()
        .filter(|c| !c.status.is_terminal())
        .collect();
    non_terminal.sort_by_key(|c| c.start_time);
    for pair in non_terminal.windows(2) {
        assert!(
            pair[0].end_time <= pair[1].start_time,
            "overlap: {:?} then {:?}",
            (pair[0].cycle_id.clone(), pair[0].start_time, pair[0].end_time),
            (pair[1].cycle_id.clone(), pair[1].start_time, pair[1].end_time)
        );
    }
}

#[tokio::test]
async fn missing_remote_identifier_defers_sync_but_keeps_local_plan() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    let mut orphan = project("Orphan", "PROD-1", "black", 8, monday() + Duration::days(5), Urgency::Normal);
    orphan.cloud_id = None;
    orphan.legacy_id = None;
    repos.projects.upsert(&orphan).unwrap();

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(repos.clone(), mirror.clone(), sync_ctx());
    let result = engine
        .recalculate(PlanScope::FromNow, true, "test", dt(2, 9, 0))
        .await
        .unwrap();

    assert!(result.success, "local write still succeeds");
    assert!(!result.cloud_sync_success);
    assert!(result.deferred);
    assert_eq!(result.skipped_cycles, result.cycles_created);

    // Nothing reached the mirror, everything reached the store.
    assert_eq!(mirror.cycle_count(), 0);
    assert_eq!(repos.cycles.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_workspace_fails_sync_only() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    repos
        .projects
        .upsert(&project("Proj1", "PROD-1", "black", 8, monday() + Duration::days(5), Urgency::Normal))
        .unwrap();

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(
        repos.clone(),
        mirror,
        SyncContext {
            user_id: Some("operator".to_string()),
            workspace_id: None,
        },
    );
    let result = engine
        .recalculate(PlanScope::FromNow, true, "test", dt(2, 9, 0))
        .await
        .unwrap();

    assert!(result.success);
    assert!(!result.cloud_sync_success);
    assert!(!result.sync_errors.is_empty());
}

#[tokio::test]
async fn recalculation_is_idempotent_by_value() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    repos
        .projects
        .upsert(&project("Proj1", "PROD-1", "black", 24, monday() + Duration::days(5), Urgency::Normal))
        .unwrap();

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(repos.clone(), mirror, sync_ctx());

    let strip = |cycles: &[printflow_aps::PlannedCycle]| {
        let mut v: Vec<_> = cycles
            .iter()
            .map(|c| {
                (
                    c.project_id.clone(),
                    c.printer_id.clone(),
                    c.start_time,
                    c.end_time,
                    c.units_planned,
                    c.plate_type,
                    c.readiness_state,
                    c.plate_index,
                )
            })
            .collect();
        v.sort();
        v
    };

    engine
        .recalculate(PlanScope::FromNow, true, "first", dt(2, 9, 0))
        .await
        .unwrap();
    let first = strip(&repos.cycles.list_all().unwrap());

    engine
        .recalculate(PlanScope::FromNow, true, "second", dt(2, 9, 0))
        .await
        .unwrap();
    let second = strip(&repos.cycles.list_all().unwrap());

    assert_eq!(first, second);
}

#[tokio::test]
async fn from_tomorrow_scope_keeps_today_clear() {
    let (_tmp, conn) = create_test_db().unwrap();
    let repos = PlanningRepositories::from_connection(conn);
    seed(&repos);
    repos
        .projects
        .upsert(&project("Proj1", "PROD-1", "black", 8, monday() + Duration::days(5), Urgency::Normal))
        .unwrap();

    let mirror = Arc::new(InMemoryRemoteMirror::new());
    let engine = RecalcEngine::new(repos.clone(), mirror, sync_ctx());
    let result = engine
        .recalculate(PlanScope::FromTomorrow, true, "test", dt(2, 9, 0))
        .await
        .unwrap();
    assert!(result.success);

    let stored = repos.cycles.list_all().unwrap();
    assert!(!stored.is_empty());
    // Nothing lands before Tuesday.
    assert!(stored.iter().all(|c| c.start_time >= dt(3, 0, 0)));
}
