// ==========================================
// PrintFlow APS - CLI entry
// ==========================================
// Thin operations shell over the library:
//   printflow-aps replan [reason]
//   printflow-aps validate
//   printflow-aps capacity
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::Local;
use printflow_aps::{logging, PlanApi};

fn default_db_path() -> String {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("printflow-aps");
    std::fs::create_dir_all(&dir).ok();
    dir.join("printflow.db").to_string_lossy().to_string()
}

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", printflow_aps::APP_NAME, printflow_aps::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::var("PRINTFLOW_DB").unwrap_or_else(|_| default_db_path());
    tracing::info!(db_path = %db_path, "opening store");
    let api = PlanApi::open_local(&db_path).context("failed to open the store")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let now = Local::now().naive_local();

    match args.first().map(String::as_str) {
        Some("replan") => {
            let reason = args
                .get(1)
                .cloned()
                .unwrap_or_else(|| "cli replan".to_string());
            let result = api.run_replan_now(&reason, now)?;
            tracing::info!(
                cycles_created = result.cycles_created,
                units_planned = result.units_planned,
                cloud_sync_success = result.cloud_sync_success,
                duration_ms = result.duration_ms,
                "replan complete"
            );
            for issue in &result.blocking_issues {
                tracing::warn!(kind = issue.kind.as_str(), details = %issue.details, "blocking issue");
            }
            for warning in &result.warnings {
                tracing::info!(kind = warning.kind.as_str(), details = %warning.details, "warning");
            }
        }
        Some("validate") => {
            let validation = api.validate_existing_plan(now)?;
            if validation.is_valid {
                tracing::info!("plan is consistent");
            } else {
                for issue in &validation.issues {
                    tracing::warn!(cycle_id = %issue.cycle_id, details = %issue.details, "plan issue");
                }
                bail!("plan has {} issue(s)", validation.issues.len());
            }
        }
        Some("capacity") => {
            let info = api.calculate_week_capacity(now.date(), now)?;
            tracing::info!(
                total_available_hours = info.total_available_hours,
                scheduled_hours = info.scheduled_hours,
                utilization_pct = info.utilization_pct,
                estimated_units_capacity = info.estimated_units_capacity,
                "week capacity"
            );
        }
        Some(other) => bail!("unknown command '{}'; use replan | validate | capacity", other),
        None => bail!("usage: printflow-aps <replan [reason] | validate | capacity>"),
    }

    Ok(())
}
