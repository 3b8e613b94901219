// ==========================================
// PrintFlow APS - Domain type definitions
// ==========================================
// Enum vocabulary shared by the engine, the
// repositories and the planning API.
// Serialization: SCREAMING_SNAKE_CASE (same
// strings the database stores)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Urgency - project urgency level
// ==========================================
// Ordering matters: Normal < Urgent < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Normal,
    Urgent,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Normal => write!(f, "NORMAL"),
            Urgency::Urgent => write!(f, "URGENT"),
            Urgency::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl Urgency {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "URGENT" => Urgency::Urgent,
            "CRITICAL" => Urgency::Critical,
            _ => Urgency::Normal,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "NORMAL",
            Urgency::Urgent => "URGENT",
            Urgency::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// ProjectStatus - order lifecycle
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    OnHold,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Pending => write!(f, "PENDING"),
            ProjectStatus::InProgress => write!(f, "IN_PROGRESS"),
            ProjectStatus::OnHold => write!(f, "ON_HOLD"),
            ProjectStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl ProjectStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => ProjectStatus::InProgress,
            "ON_HOLD" => ProjectStatus::OnHold,
            "COMPLETED" => ProjectStatus::Completed,
            _ => ProjectStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "PENDING",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Completed => "COMPLETED",
        }
    }

    /// A project the planner may still produce work for.
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Pending | ProjectStatus::InProgress)
    }
}

// ==========================================
// CycleStatus - temporal state of a cycle
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    Planned,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleStatus::Planned => write!(f, "PLANNED"),
            CycleStatus::InProgress => write!(f, "IN_PROGRESS"),
            CycleStatus::Completed => write!(f, "COMPLETED"),
            CycleStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl CycleStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => CycleStatus::InProgress,
            "COMPLETED" => CycleStatus::Completed,
            "FAILED" => CycleStatus::Failed,
            _ => CycleStatus::Planned,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CycleStatus::Planned => "PLANNED",
            CycleStatus::InProgress => "IN_PROGRESS",
            CycleStatus::Completed => "COMPLETED",
            CycleStatus::Failed => "FAILED",
        }
    }

    /// Terminal cycles are immutable facts for the planner.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleStatus::Completed | CycleStatus::Failed)
    }
}

// ==========================================
// ReadinessState - gating state of a cycle
// ==========================================
// Orthogonal to CycleStatus: a planned cycle can be
// ready to run or waiting on an operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadinessState {
    Ready,
    WaitingForSpool,
    WaitingForPlateReload,
    BlockedInventory,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Ready => write!(f, "READY"),
            ReadinessState::WaitingForSpool => write!(f, "WAITING_FOR_SPOOL"),
            ReadinessState::WaitingForPlateReload => write!(f, "WAITING_FOR_PLATE_RELOAD"),
            ReadinessState::BlockedInventory => write!(f, "BLOCKED_INVENTORY"),
        }
    }
}

impl ReadinessState {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WAITING_FOR_SPOOL" => ReadinessState::WaitingForSpool,
            "WAITING_FOR_PLATE_RELOAD" => ReadinessState::WaitingForPlateReload,
            "BLOCKED_INVENTORY" => ReadinessState::BlockedInventory,
            _ => ReadinessState::Ready,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReadinessState::Ready => "READY",
            ReadinessState::WaitingForSpool => "WAITING_FOR_SPOOL",
            ReadinessState::WaitingForPlateReload => "WAITING_FOR_PLATE_RELOAD",
            ReadinessState::BlockedInventory => "BLOCKED_INVENTORY",
        }
    }
}

// ==========================================
// PlateType - how full the plate layout is
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlateType {
    Full,
    Reduced,
    Closeout,
}

impl fmt::Display for PlateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateType::Full => write!(f, "FULL"),
            PlateType::Reduced => write!(f, "REDUCED"),
            PlateType::Closeout => write!(f, "CLOSEOUT"),
        }
    }
}

impl PlateType {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "REDUCED" => PlateType::Reduced,
            "CLOSEOUT" => PlateType::Closeout,
            _ => PlateType::Full,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlateType::Full => "FULL",
            PlateType::Reduced => "REDUCED",
            PlateType::Closeout => "CLOSEOUT",
        }
    }
}

// ==========================================
// ShiftKind - which shift a cycle starts in
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftKind {
    Day,
    EndOfDay,
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftKind::Day => write!(f, "DAY"),
            ShiftKind::EndOfDay => write!(f, "END_OF_DAY"),
        }
    }
}

impl ShiftKind {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "END_OF_DAY" => ShiftKind::EndOfDay,
            _ => ShiftKind::Day,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftKind::Day => "DAY",
            ShiftKind::EndOfDay => "END_OF_DAY",
        }
    }
}

// ==========================================
// CycleSource - who authored the cycle
// ==========================================
// Manual + locked cycles are immovable facts the
// planner flows around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleSource {
    Auto,
    Manual,
}

impl fmt::Display for CycleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleSource::Auto => write!(f, "AUTO"),
            CycleSource::Manual => write!(f, "MANUAL"),
        }
    }
}

impl CycleSource {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MANUAL" => CycleSource::Manual,
            _ => CycleSource::Auto,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CycleSource::Auto => "AUTO",
            CycleSource::Manual => "MANUAL",
        }
    }
}

// ==========================================
// RiskLevel - plate layout risk
// ==========================================
// Ordering: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

impl RiskLevel {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MEDIUM" => RiskLevel::Medium,
            "HIGH" => RiskLevel::High,
            _ => RiskLevel::Low,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

// ==========================================
// AfterHoursBehavior - factory night policy
// ==========================================
// Three-level control: nothing after hours, one
// operator-started cycle at shift close, or full
// autonomous operation through the night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AfterHoursBehavior {
    None,
    OneCycleEndOfDay,
    FullAutomation,
}

impl fmt::Display for AfterHoursBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AfterHoursBehavior::None => write!(f, "NONE"),
            AfterHoursBehavior::OneCycleEndOfDay => write!(f, "ONE_CYCLE_END_OF_DAY"),
            AfterHoursBehavior::FullAutomation => write!(f, "FULL_AUTOMATION"),
        }
    }
}

impl AfterHoursBehavior {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ONE_CYCLE_END_OF_DAY" => AfterHoursBehavior::OneCycleEndOfDay,
            "FULL_AUTOMATION" => AfterHoursBehavior::FullAutomation,
            _ => AfterHoursBehavior::None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AfterHoursBehavior::None => "NONE",
            AfterHoursBehavior::OneCycleEndOfDay => "ONE_CYCLE_END_OF_DAY",
            AfterHoursBehavior::FullAutomation => "FULL_AUTOMATION",
        }
    }
}

// ==========================================
// SpoolState
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpoolState {
    Available,
    InUse,
    Empty,
}

impl fmt::Display for SpoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpoolState::Available => write!(f, "AVAILABLE"),
            SpoolState::InUse => write!(f, "IN_USE"),
            SpoolState::Empty => write!(f, "EMPTY"),
        }
    }
}

impl SpoolState {
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_USE" => SpoolState::InUse,
            "EMPTY" => SpoolState::Empty,
            _ => SpoolState::Available,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SpoolState::Available => "AVAILABLE",
            SpoolState::InUse => "IN_USE",
            SpoolState::Empty => "EMPTY",
        }
    }
}

// ==========================================
// PlanScope - recalculation window anchor
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanScope {
    FromNow,
    FromTomorrow,
    WholeWeek,
}

impl fmt::Display for PlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanScope::FromNow => write!(f, "FROM_NOW"),
            PlanScope::FromTomorrow => write!(f, "FROM_TOMORROW"),
            PlanScope::WholeWeek => write!(f, "WHOLE_WEEK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_ordering() {
        assert!(Urgency::Normal < Urgency::Urgent);
        assert!(Urgency::Urgent < Urgency::Critical);
    }

    #[test]
    fn cycle_status_terminal() {
        assert!(CycleStatus::Completed.is_terminal());
        assert!(CycleStatus::Failed.is_terminal());
        assert!(!CycleStatus::Planned.is_terminal());
        assert!(!CycleStatus::InProgress.is_terminal());
    }

    #[test]
    fn db_round_trip() {
        for s in [
            "READY",
            "WAITING_FOR_SPOOL",
            "WAITING_FOR_PLATE_RELOAD",
            "BLOCKED_INVENTORY",
        ] {
            assert_eq!(ReadinessState::from_db_str(s).to_db_str(), s);
        }
        for s in ["NONE", "ONE_CYCLE_END_OF_DAY", "FULL_AUTOMATION"] {
            assert_eq!(AfterHoursBehavior::from_db_str(s).to_db_str(), s);
        }
    }
}
