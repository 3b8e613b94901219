// ==========================================
// PrintFlow APS - Planning orchestrator
// ==========================================
// Coordinates the engine pipeline for one run:
// prioritize -> feasibility -> minimum printers ->
// placement -> plate post-pass. Pure over the
// snapshot; the only outputs are the PlanResult and
// the run log.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::product::PlatePreset;
use crate::engine::calendar::Calendar;
use crate::engine::colors::normalize_color;
use crate::engine::events::RunLog;
use crate::engine::feasibility::FeasibilityValidator;
use crate::engine::legacy_fill::LegacyFillScheduler;
use crate::engine::material_view::MaterialView;
use crate::engine::plate_limit::PlateLimitPass;
use crate::engine::prioritizer::Prioritizer;
use crate::engine::scheduler::CycleScheduler;
use crate::engine::slot::PrinterSlot;
use crate::engine::snapshot::{
    BlockingIssue, BlockingIssueKind, PlanOptions, PlanResult, PlanWarning, PlanningSnapshot,
    WarningKind, WarningSeverity,
};
use chrono::{Duration, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

// ==========================================
// PlanningEngine
// ==========================================
pub struct PlanningEngine;

impl PlanningEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_plan(
        &self,
        snapshot: &PlanningSnapshot,
        options: &PlanOptions,
        log: &mut RunLog,
    ) -> PlanResult {
        log.clear();

        let mut blocking_issues: Vec<BlockingIssue> = Vec::new();
        let mut warnings: Vec<PlanWarning> = Vec::new();

        // ==========================================
        // Step 0: input guards
        // ==========================================
        if snapshot.printers.iter().filter(|p| p.active).count() == 0 {
            blocking_issues.push(BlockingIssue {
                kind: BlockingIssueKind::NoPrinters,
                project_id: None,
                details: "no active printers".to_string(),
            });
        }
        if !snapshot.settings_present {
            blocking_issues.push(BlockingIssue {
                kind: BlockingIssueKind::NoSettings,
                project_id: None,
                details: "factory settings were never configured".to_string(),
            });
        }
        if !blocking_issues.is_empty() {
            return PlanResult {
                cycles: Vec::new(),
                blocking_issues,
                warnings,
                units_planned: 0,
                projects_planned: 0,
                log_summary: log.summarize(),
            };
        }

        let settings = &snapshot.settings;
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let material = MaterialView::build(&snapshot.inventory, &snapshot.spools);
        let today = options.start_time.date();

        // ==========================================
        // Step 1: prioritize projects
        // ==========================================
        debug!("step 1: prioritizing projects");
        let prioritizer = Prioritizer::new(settings.priority_rules.clone());
        let states = prioritizer.prioritize(
            &snapshot.projects,
            &snapshot.products,
            &snapshot.existing_cycles,
            today,
        );
        info!(project_count = states.len(), "projects prioritized");

        if states.is_empty() {
            warnings.push(PlanWarning {
                kind: WarningKind::CapacityUnused,
                severity: WarningSeverity::Info,
                project_id: None,
                details: "no plannable projects; printer capacity unused".to_string(),
            });
            return PlanResult {
                cycles: Vec::new(),
                blocking_issues,
                warnings,
                units_planned: 0,
                projects_planned: 0,
                log_summary: log.summarize(),
            };
        }

        // ==========================================
        // Step 2: feasibility checks
        // ==========================================
        debug!("step 2: validating feasibility");
        let active_printer_count = snapshot.printers.iter().filter(|p| p.active).count();
        let feasibility = FeasibilityValidator::new(
            settings.transition_minutes,
            settings.planning_horizon_days,
        )
        .validate(&states, &material, &calendar, active_printer_count, today);
        warnings.extend(feasibility.warnings);
        blocking_issues.extend(feasibility.blocking_issues);

        // ==========================================
        // Step 3: build printer slots around preserved work
        // ==========================================
        debug!("step 3: building printer slots");
        let mut slots = self.build_slots(snapshot, options, &calendar);

        // ==========================================
        // Step 4: placement
        // ==========================================
        let horizon_end = options.start_time + Duration::days(options.days_to_plan);
        let mut cycles = if settings.feature_toggles.planner_v2_project_centric {
            debug!("step 4: project-centric placement");
            CycleScheduler::new().schedule(
                &states,
                &mut slots,
                &material,
                &calendar,
                settings,
                options.start_time,
                horizon_end,
                log,
            )
        } else {
            debug!("step 4: legacy fill-printer-first placement");
            LegacyFillScheduler::new().schedule(
                &states,
                &mut slots,
                &material,
                &calendar,
                settings,
                horizon_end,
                log,
            )
        };

        // ==========================================
        // Step 5: physical plate post-pass
        // ==========================================
        if settings.feature_toggles.physical_plates_limit {
            debug!("step 5: physical plate post-pass");
            let presets_by_id: HashMap<String, PlatePreset> = snapshot
                .products
                .iter()
                .flat_map(|p| p.presets.iter())
                .map(|p| (p.preset_id.clone(), p.clone()))
                .collect();
            let downgraded = PlateLimitPass::new().apply(
                &mut cycles,
                &snapshot.printers,
                &presets_by_id,
                &calendar,
                settings,
            );
            if downgraded > 0 {
                info!(downgraded, "night cycles downgraded to plate reload");
            }
        }

        // ==========================================
        // Step 6: advisory warnings from the run
        // ==========================================
        self.derive_warnings(&cycles, log, &blocking_issues, &mut warnings);

        let units_planned: i64 = cycles.iter().map(|c| c.units_planned).sum();
        let projects_planned = cycles
            .iter()
            .map(|c| c.project_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        info!(
            cycles = cycles.len(),
            units_planned,
            projects_planned,
            blocking = blocking_issues.len(),
            warnings = warnings.len(),
            "plan generated"
        );

        PlanResult {
            cycles,
            blocking_issues,
            warnings,
            units_planned,
            projects_planned,
            log_summary: log.summarize(),
        }
    }

    /// One slot per active printer, pushed past any preserved work
    /// (in-flight or manually locked cycles the plan flows around).
    fn build_slots(
        &self,
        snapshot: &PlanningSnapshot,
        options: &PlanOptions,
        calendar: &Calendar,
    ) -> Vec<PrinterSlot> {
        let mut preserved_end: HashMap<&str, NaiveDateTime> = HashMap::new();
        let mut preserved_color: HashMap<&str, (&str, NaiveDateTime)> = HashMap::new();
        for cycle in &snapshot.existing_cycles {
            // Completed/failed history does not occupy the future, and
            // non-preserved cycles are about to be replaced anyway.
            if cycle.status.is_terminal() || !cycle.is_preserved(options.lock_in_progress) {
                continue;
            }
            let printer_id = cycle.printer_id.as_str();
            let is_later = preserved_end
                .get(printer_id)
                .map(|end| cycle.end_time > *end)
                .unwrap_or(true);
            if is_later {
                preserved_end.insert(printer_id, cycle.end_time);
                preserved_color.insert(printer_id, (&cycle.required_color, cycle.end_time));
            }
        }

        snapshot
            .printers
            .iter()
            .filter(|p| p.active)
            .enumerate()
            .map(|(order, printer)| {
                let mut slot = PrinterSlot::new(
                    printer.clone(),
                    order,
                    options.start_time,
                    preserved_end.get(printer.printer_id.as_str()).copied(),
                    calendar,
                    &snapshot.settings,
                );
                if let Some((color, _)) = preserved_color.get(printer.printer_id.as_str()) {
                    slot.last_scheduled_color = Some(normalize_color(color));
                }
                slot
            })
            .collect()
    }

    /// Advisory warnings derived from the produced plan.
    fn derive_warnings(
        &self,
        cycles: &[PlannedCycle],
        log: &RunLog,
        blocking_issues: &[BlockingIssue],
        warnings: &mut Vec<PlanWarning>,
    ) {
        // Deadline risk: a selection whose best estimate still misses
        // the deadline, unless feasibility already flagged it harder.
        let already_impossible: HashSet<&str> = blocking_issues
            .iter()
            .filter(|i| i.kind == BlockingIssueKind::DeadlineImpossible)
            .filter_map(|i| i.project_id.as_deref())
            .collect();
        for decision in log.decisions() {
            if !decision.meets_deadline && !already_impossible.contains(decision.project_id.as_str())
            {
                warnings.push(PlanWarning {
                    kind: WarningKind::DeadlineRisk,
                    severity: WarningSeverity::Warn,
                    project_id: Some(decision.project_id.clone()),
                    details: format!(
                        "estimated finish misses the deadline by {:.1}h",
                        -decision.margin_hours
                    ),
                });
            }
        }

        // Printer overload: one printer carrying the bulk of the plan
        // while others idle.
        let mut hours_by_printer: HashMap<&str, f64> = HashMap::new();
        for cycle in cycles {
            *hours_by_printer.entry(cycle.printer_id.as_str()).or_insert(0.0) +=
                (cycle.end_time - cycle.start_time).num_minutes() as f64 / 60.0;
        }
        if hours_by_printer.len() > 1 {
            let total: f64 = hours_by_printer.values().sum();
            let avg = total / hours_by_printer.len() as f64;
            let mut printers: Vec<_> = hours_by_printer.iter().collect();
            printers.sort_by(|a, b| a.0.cmp(b.0));
            for (printer_id, hours) in printers {
                if *hours > 2.0 * avg {
                    warnings.push(PlanWarning {
                        kind: WarningKind::PrinterOverload,
                        severity: WarningSeverity::Info,
                        project_id: None,
                        details: format!(
                            "printer '{}' carries {:.1}h of {:.1}h total",
                            printer_id, hours, total
                        ),
                    });
                }
            }
        }
    }
}

impl Default for PlanningEngine {
    fn default() -> Self {
        Self::new()
    }
}
