use super::dates::format_day_first;
use super::domain::{Frequency, TaskStatus};
use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of classifying one sheet row. Never edited in place; re-classify instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedTask {
    pub id: String,
    pub title: String,
    /// Trimmed assignee name; empty when the sheet leaves it blank.
    pub assigned_to: String,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub frequency: Frequency,
}

impl ClassifiedTask {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_to.is_empty()
    }

    /// String forms of every field, used by the all-fields text search.
    pub fn field_strings(&self) -> Vec<String> {
        let mut fields = vec![
            self.id.clone(),
            self.title.clone(),
            self.assigned_to.clone(),
            self.frequency.label().to_string(),
            self.status.label().to_string(),
        ];
        fields.extend(self.due_date.map(format_day_first));
        fields.extend(self.completed_date.map(format_day_first));
        fields
    }

    pub fn to_view(&self) -> TaskDetailView {
        TaskDetailView {
            id: self.id.clone(),
            title: self.title.clone(),
            assigned_to: if self.is_assigned() {
                self.assigned_to.clone()
            } else {
                "Unassigned".to_string()
            },
            due_date: self.due_date,
            completed_date: self.completed_date,
            status: self.status,
            status_label: self.status.label(),
            frequency: self.frequency,
            frequency_label: self.frequency.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskDetailView {
    pub id: String,
    pub title: String,
    pub assigned_to: String,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub status_label: &'static str,
    pub frequency: Frequency,
    pub frequency_label: &'static str,
}
