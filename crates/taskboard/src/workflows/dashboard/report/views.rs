use super::super::domain::TaskStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounters {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Tasks without a due date; part of `total` but of no status bucket.
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffSummary {
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyEntry {
    /// Calendar month, 1 = January.
    pub month: u32,
    pub label: &'static str,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSlice {
    pub status: TaskStatus,
    pub label: &'static str,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub counters: StatusCounters,
    pub completion_rate: f64,
    pub status_distribution: Vec<StatusSlice>,
    pub monthly: Vec<MonthlyEntry>,
    pub trailing_months: Vec<MonthlyEntry>,
    pub staff: Vec<StaffSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl PerformanceBand {
    pub const fn for_progress(progress_percent: u8) -> Self {
        if progress_percent >= 80 {
            Self::Excellent
        } else if progress_percent >= 60 {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffPerformanceEntry {
    pub name: String,
    pub progress_percent: u8,
    pub band: PerformanceBand,
    pub band_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardInsights {
    pub completion_rate: f64,
    /// Display approximation only; the engine does not track late completion per task.
    pub on_time_pct: f64,
    pub late_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_staff: Option<usize>,
    pub staff_performance: Vec<StaffPerformanceEntry>,
    pub top_performers: Vec<StaffSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<String>,
}
