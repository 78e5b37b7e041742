//! Fetch cycles: generation tokens and the snapshots they publish.

mod coordinator;
mod service;

pub use coordinator::{FetchCoordinator, FetchTicket};
pub use service::{DashboardService, RefreshOutcome, ViewerKey};

use crate::workflows::dashboard::report::views::{DashboardInsights, DashboardSummary};
use crate::workflows::dashboard::{evaluate_rows, ClassifiedTask, RawRow, Viewer};
use chrono::NaiveDate;
use serde::Serialize;

/// Immutable result of one fetch cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generation: u64,
    pub sheet: String,
    pub evaluated_on: NaiveDate,
    pub tasks: Vec<ClassifiedTask>,
    pub summary: DashboardSummary,
    pub insights: DashboardInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_staff: Option<usize>,
}

impl DashboardSnapshot {
    pub fn from_rows(
        generation: u64,
        sheet: &str,
        now: NaiveDate,
        rows: &[RawRow],
        viewer: Option<&Viewer>,
        active_staff: Option<usize>,
    ) -> Self {
        let evaluation = evaluate_rows(rows, now, viewer);
        let summary = evaluation.report.summary(now);
        let insights = summary.insights(active_staff);

        Self {
            generation,
            sheet: sheet.to_string(),
            evaluated_on: now,
            tasks: evaluation.tasks,
            summary,
            insights,
            active_staff,
        }
    }
}
