use super::super::domain::TaskStatus;
use super::super::task::ClassifiedTask;
use super::views::{
    DashboardInsights, DashboardSummary, MonthlyEntry, StaffSummary, StatusCounters, StatusSlice,
};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Months shown in the trailing chart window, ending with the evaluation month.
pub const TRAILING_CHART_MONTHS: usize = 7;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCounts {
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StaffTally {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl StaffTally {
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0)
            .round()
            .clamp(0.0, 100.0) as u8
    }
}

/// Counters, monthly buckets and per-staff tallies folded from classified tasks.
#[derive(Debug, Default, Clone)]
pub struct DashboardReport {
    pub counters: StatusCounters,
    /// Index 0 is January. Years are not distinguished.
    pub monthly: [MonthlyCounts; 12],
    pub staff: HashMap<String, StaffTally>,
    staff_order: Vec<String>,
}

impl DashboardReport {
    pub fn aggregate<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a ClassifiedTask>,
    {
        let mut report = Self::default();
        for task in tasks {
            report.fold(task);
        }
        report
    }

    pub fn fold(&mut self, task: &ClassifiedTask) {
        self.counters.total += 1;
        match task.status {
            TaskStatus::Completed => self.counters.completed += 1,
            TaskStatus::Pending => self.counters.pending += 1,
            TaskStatus::Overdue => self.counters.overdue += 1,
            TaskStatus::Unknown => self.counters.unknown += 1,
        }

        let bucket_date = match task.status {
            TaskStatus::Completed => task.completed_date,
            TaskStatus::Pending => task.due_date,
            TaskStatus::Overdue | TaskStatus::Unknown => None,
        };
        if let Some(date) = bucket_date {
            let bucket = &mut self.monthly[date.month0() as usize];
            match task.status {
                TaskStatus::Completed => bucket.completed += 1,
                _ => bucket.pending += 1,
            }
        }

        if task.is_assigned() {
            if !self.staff.contains_key(&task.assigned_to) {
                self.staff_order.push(task.assigned_to.clone());
            }
            let tally = self.staff.entry(task.assigned_to.clone()).or_default();
            tally.total += 1;
            match task.status {
                TaskStatus::Completed => tally.completed += 1,
                TaskStatus::Pending => tally.pending += 1,
                TaskStatus::Overdue | TaskStatus::Unknown => {}
            }
        }
    }

    /// Percentage of completed tasks with one decimal place; 0 for an empty report.
    pub fn completion_rate(&self) -> f64 {
        if self.counters.total == 0 {
            return 0.0;
        }
        round_tenths(self.counters.completed as f64 / self.counters.total as f64 * 100.0)
    }

    /// One summary per assignee, in order of first appearance.
    pub fn staff_summaries(&self) -> Vec<StaffSummary> {
        self.staff_order
            .iter()
            .filter_map(|name| {
                self.staff.get(name).map(|tally| StaffSummary {
                    name: name.clone(),
                    total_tasks: tally.total,
                    completed_tasks: tally.completed,
                    pending_tasks: tally.pending,
                    progress_percent: tally.progress_percent(),
                })
            })
            .collect()
    }

    pub fn monthly_entries(&self) -> Vec<MonthlyEntry> {
        (0..12).map(|month0| self.month_entry(month0)).collect()
    }

    /// The `count` calendar months ending with the month of `now`, oldest first.
    pub fn trailing_months(&self, now: NaiveDate, count: usize) -> Vec<MonthlyEntry> {
        let current = now.month0() as usize;
        let count = count.min(12);
        (0..count)
            .rev()
            .map(|offset| self.month_entry((current + 12 - offset) % 12))
            .collect()
    }

    pub fn status_distribution(&self) -> Vec<StatusSlice> {
        TaskStatus::bucketed()
            .into_iter()
            .map(|status| StatusSlice {
                status,
                label: status.label(),
                value: match status {
                    TaskStatus::Completed => self.counters.completed,
                    TaskStatus::Pending => self.counters.pending,
                    TaskStatus::Overdue => self.counters.overdue,
                    TaskStatus::Unknown => self.counters.unknown,
                },
                color: status.chart_color(),
            })
            .collect()
    }

    pub fn summary(&self, now: NaiveDate) -> DashboardSummary {
        DashboardSummary {
            counters: self.counters,
            completion_rate: self.completion_rate(),
            status_distribution: self.status_distribution(),
            monthly: self.monthly_entries(),
            trailing_months: self.trailing_months(now, TRAILING_CHART_MONTHS),
            staff: self.staff_summaries(),
        }
    }

    fn month_entry(&self, month0: usize) -> MonthlyEntry {
        let counts = self.monthly[month0];
        MonthlyEntry {
            month: month0 as u32 + 1,
            label: MONTH_LABELS[month0],
            completed: counts.completed,
            pending: counts.pending,
        }
    }
}

impl DashboardSummary {
    /// `active_staff` comes from the roster sheet when it was fetched.
    pub fn insights(&self, active_staff: Option<usize>) -> DashboardInsights {
        super::generate_insights(self, active_staff)
    }
}

pub(crate) fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
