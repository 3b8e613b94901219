// ==========================================
// PrintFlow APS - Decision & block log
// ==========================================
// Append-only, in-memory for one planning run. Every
// skipped slot and every printer-set selection leaves
// a structured trace so the plan is explainable after
// the fact.
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// BlockReason - why a slot was skipped
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    AfterHoursPolicy,
    NoNightPreset,
    ColorLockNight,
    PlatesLimit,
    InsufficientMaterial,
    NoWorkdayWithinHorizon,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::AfterHoursPolicy => "after_hours_policy",
            BlockReason::NoNightPreset => "no_night_preset",
            BlockReason::ColorLockNight => "color_lock_night",
            BlockReason::PlatesLimit => "plates_limit",
            BlockReason::InsufficientMaterial => "insufficient_material",
            BlockReason::NoWorkdayWithinHorizon => "no_workday_within_horizon",
        }
    }
}

// ==========================================
// BlockEvent
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEvent {
    pub reason: BlockReason,
    pub project_id: Option<String>,
    pub printer_id: Option<String>,
    pub preset_id: Option<String>,
    pub details: String,
    pub scheduled_date: Option<NaiveDate>,
    pub cycle_hours: Option<f64>,
}

// ==========================================
// PrinterScoreRecord - one scored candidate
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterScoreRecord {
    pub printer_id: String,
    pub score: f64,
    pub wait_hours: f64,
    pub reasons: Vec<String>,
}

// ==========================================
// DecisionEvent - one printer-set selection
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub project_id: String,
    pub deadline: NaiveDate,
    pub remaining_units: i64,
    pub selected_printers: Vec<String>,
    pub estimated_finish_time: Option<NaiveDateTime>,
    pub meets_deadline: bool,
    pub margin_hours: f64,
    pub per_printer_scores: Vec<PrinterScoreRecord>,
}

// ==========================================
// RunLogSummary
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogSummary {
    pub blocks_by_reason: HashMap<String, usize>,
    pub top_block_reasons: Vec<(String, usize)>,
    pub decision_count: usize,
}

// ==========================================
// RunLog - one planning run's event stream
// ==========================================
#[derive(Debug, Default)]
pub struct RunLog {
    blocks: Vec<BlockEvent>,
    decisions: Vec<DecisionEvent>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleared at the start of every planning run.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.decisions.clear();
    }

    pub fn record_block(&mut self, event: BlockEvent) {
        tracing::debug!(
            reason = event.reason.as_str(),
            project_id = event.project_id.as_deref().unwrap_or("-"),
            printer_id = event.printer_id.as_deref().unwrap_or("-"),
            details = %event.details,
            "slot blocked"
        );
        self.blocks.push(event);
    }

    pub fn record_decision(&mut self, event: DecisionEvent) {
        tracing::debug!(
            project_id = %event.project_id,
            selected = event.selected_printers.len(),
            meets_deadline = event.meets_deadline,
            "printer set selected"
        );
        self.decisions.push(event);
    }

    pub fn blocks(&self) -> &[BlockEvent] {
        &self.blocks
    }

    pub fn decisions(&self) -> &[DecisionEvent] {
        &self.decisions
    }

    /// By-reason counts plus the top three reasons, computed at run end.
    pub fn summarize(&self) -> RunLogSummary {
        let mut by_reason: HashMap<String, usize> = HashMap::new();
        for block in &self.blocks {
            *by_reason.entry(block.reason.as_str().to_string()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, usize)> =
            by_reason.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(3);

        RunLogSummary {
            blocks_by_reason: by_reason,
            top_block_reasons: ranked,
            decision_count: self.decisions.len(),
        }
    }
}
