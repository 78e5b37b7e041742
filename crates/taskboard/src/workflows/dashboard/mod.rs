//! Classification and aggregation of task rows for the operations dashboard.
//!
//! Data flows `dates` -> `classifier` -> `report`, with `filter` working on the
//! classifier output independently of the aggregates.

mod classifier;
pub mod dates;
pub mod domain;
pub mod filter;
mod layout;
pub mod report;
mod task;

pub use classifier::{derive_status, Classifier};
pub use domain::{CellValue, Frequency, RawRow, Role, TaskStatus, UnknownVariant, Viewer};
pub use filter::{filter_tasks, FilterCriteria, TextScope, ViewWindow};
pub use layout::{ColumnLayout, LayoutMismatch};
pub use report::DashboardReport;
pub use task::{ClassifiedTask, TaskDetailView};

use chrono::NaiveDate;

/// Classified tasks of one fetch cycle together with their aggregates.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub tasks: Vec<ClassifiedTask>,
    pub report: DashboardReport,
}

/// Classifies `rows` as seen by `viewer` on `now` and folds the result.
pub fn evaluate_rows(rows: &[RawRow], now: NaiveDate, viewer: Option<&Viewer>) -> Evaluation {
    let tasks = Classifier::default().classify_rows(rows, now, viewer);
    let report = DashboardReport::aggregate(&tasks);
    Evaluation { tasks, report }
}
