use super::dates;
use super::domain::{Frequency, RawRow, TaskStatus, Viewer};
use super::layout::ColumnLayout;
use super::task::ClassifiedTask;
use chrono::NaiveDate;

/// Turns raw sheet rows into classified tasks for one evaluation date.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    layout: ColumnLayout,
}

impl Classifier {
    pub const fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// Classifies one row. `None` means the row is invisible to `viewer` or is not a task.
    ///
    /// `row_number` is 1-based and only used to synthesize an id for rows
    /// without a task id.
    pub fn classify(
        &self,
        row_number: usize,
        row: &RawRow,
        now: NaiveDate,
        viewer: Option<&Viewer>,
    ) -> Option<ClassifiedTask> {
        let assigned_to = row.text(self.layout.assignee).unwrap_or_default();
        if let Some(viewer) = viewer {
            if !viewer.can_see(&assigned_to) {
                return None;
            }
        }

        let title = row.text(self.layout.title)?;

        let due_date = dates::normalize(row.cell(self.layout.due_date));
        let completed_date = dates::normalize(row.cell(self.layout.completed_date));
        let status = derive_status(due_date, completed_date, now);

        let id = row
            .text(self.layout.task_id)
            .unwrap_or_else(|| format!("task-{row_number}"));

        Some(ClassifiedTask {
            id,
            title,
            assigned_to,
            due_date,
            completed_date,
            status,
            frequency: Frequency::from_cell(row.cell(self.layout.frequency)),
        })
    }

    /// Classifies every row in order, dropping invisible and non-task rows.
    pub fn classify_rows(
        &self,
        rows: &[RawRow],
        now: NaiveDate,
        viewer: Option<&Viewer>,
    ) -> Vec<ClassifiedTask> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| self.classify(index + 1, row, now, viewer))
            .collect()
    }
}

/// Status from the normalized due and completion dates.
///
/// Completion wins over lateness: a completed task is never re-examined for
/// overdue-ness, however old its due date.
pub fn derive_status(
    due_date: Option<NaiveDate>,
    completed_date: Option<NaiveDate>,
    now: NaiveDate,
) -> TaskStatus {
    match (due_date, completed_date) {
        (Some(_), Some(_)) => TaskStatus::Completed,
        (Some(due), None) if due < now => TaskStatus::Overdue,
        (Some(_), None) => TaskStatus::Pending,
        (None, _) => TaskStatus::Unknown,
    }
}
