use super::domain::{TaskStatus, UnknownVariant};
use super::task::ClassifiedTask;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the free-text query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScope {
    #[default]
    Title,
    AllFields,
}

/// User-chosen filters. `None` stands for "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
    pub text: Option<String>,
    pub text_scope: TextScope,
}

impl FilterCriteria {
    /// Builds criteria from dropdown-style inputs where `"all"` or blank disables a filter.
    pub fn from_inputs(
        status: Option<&str>,
        assignee: Option<&str>,
        text: Option<&str>,
        text_scope: TextScope,
    ) -> Result<Self, UnknownVariant> {
        let status = match selection(status) {
            Some(value) => Some(value.parse::<TaskStatus>()?),
            None => None,
        };

        Ok(Self {
            status,
            assignee: selection(assignee).map(str::to_string),
            text: text
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            text_scope,
        })
    }

    pub fn matches(&self, task: &ClassifiedTask) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }

        if let Some(assignee) = &self.assignee {
            if task.assigned_to != assignee.trim() {
                return false;
            }
        }

        match &self.text {
            Some(query) => {
                let query = query.to_lowercase();
                match self.text_scope {
                    TextScope::Title => task.title.to_lowercase().contains(&query),
                    TextScope::AllFields => task
                        .field_strings()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&query)),
                }
            }
            None => true,
        }
    }
}

fn selection(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
}

/// Date-relative slice applied for display, compared by calendar day only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewWindow {
    #[default]
    All,
    /// Due today.
    Recent,
    /// Due tomorrow.
    Upcoming,
    /// Due before today.
    Overdue,
}

impl ViewWindow {
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All tasks",
            Self::Recent => "Due today",
            Self::Upcoming => "Due tomorrow",
            Self::Overdue => "Overdue",
        }
    }

    pub fn contains(self, task: &ClassifiedTask, today: NaiveDate) -> bool {
        if self == Self::All {
            return true;
        }
        if task.status == TaskStatus::Completed {
            return false;
        }

        let Some(due) = task.due_date else {
            return false;
        };
        match self {
            Self::All => true,
            Self::Recent => due == today,
            Self::Upcoming => Some(due) == today.checked_add_signed(Duration::days(1)),
            Self::Overdue => due < today,
        }
    }
}

impl FromStr for ViewWindow {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "recent" | "today" => Ok(Self::Recent),
            "upcoming" | "tomorrow" => Ok(Self::Upcoming),
            "overdue" => Ok(Self::Overdue),
            other => Err(UnknownVariant {
                kind: "view",
                value: other.to_string(),
            }),
        }
    }
}

/// Applies the criteria and then the view window, preserving input order.
pub fn filter_tasks<'a>(
    tasks: &'a [ClassifiedTask],
    criteria: &FilterCriteria,
    view: ViewWindow,
    today: NaiveDate,
) -> Vec<&'a ClassifiedTask> {
    tasks
        .iter()
        .filter(|task| criteria.matches(task))
        .filter(|task| view.contains(task, today))
        .collect()
}
