use super::summary::round_tenths;
use super::views::{
    DashboardInsights, DashboardSummary, PerformanceBand, StaffPerformanceEntry, StaffSummary,
};

/// Share of completions shown as on time. The sheet has no per-task lateness signal.
const ON_TIME_SHARE: f64 = 0.9;
const TOP_PERFORMER_COUNT: usize = 3;

pub(crate) fn generate_insights(
    summary: &DashboardSummary,
    active_staff: Option<usize>,
) -> DashboardInsights {
    let completion_rate = summary.completion_rate;
    let on_time_pct = round_tenths(completion_rate * ON_TIME_SHARE);
    let late_pct = round_tenths(completion_rate - on_time_pct);

    let staff_performance = summary
        .staff
        .iter()
        .map(|staff| {
            let band = PerformanceBand::for_progress(staff.progress_percent);
            StaffPerformanceEntry {
                name: staff.name.clone(),
                progress_percent: staff.progress_percent,
                band,
                band_label: band.label(),
            }
        })
        .collect();

    let mut ranked: Vec<&StaffSummary> = summary.staff.iter().collect();
    // Stable sort keeps first-appearance order among ties.
    ranked.sort_by(|a, b| b.progress_percent.cmp(&a.progress_percent));
    let top_performers = ranked
        .into_iter()
        .take(TOP_PERFORMER_COUNT)
        .cloned()
        .collect();

    let counters = &summary.counters;
    let mut observations = Vec::new();
    if counters.total == 0 {
        observations.push("No tasks recorded for this view".to_string());
    } else {
        observations.push(format!(
            "{} of {} tasks complete ({completion_rate:.1}% completion)",
            counters.completed, counters.total
        ));
    }

    if counters.overdue > 0 {
        observations.push(format!(
            "{} task{} past due without a completion date",
            counters.overdue,
            if counters.overdue == 1 { "" } else { "s" }
        ));
    }

    if counters.unknown > 0 {
        observations.push(format!(
            "{} task{} missing a due date; excluded from date-based views",
            counters.unknown,
            if counters.unknown == 1 { "" } else { "s" }
        ));
    }

    if let Some(active) = active_staff {
        let assigned = summary.staff.len();
        if active > assigned {
            observations.push(format!(
                "{} of {active} active staff have no tasks assigned",
                active - assigned
            ));
        }
    }

    DashboardInsights {
        completion_rate,
        on_time_pct,
        late_pct,
        active_staff,
        staff_performance,
        top_performers,
        observations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::dashboard::report::views::StatusCounters;

    fn staff(name: &str, progress: u8) -> StaffSummary {
        StaffSummary {
            name: name.to_string(),
            total_tasks: 10,
            completed_tasks: usize::from(progress / 10),
            pending_tasks: 0,
            progress_percent: progress,
        }
    }

    fn summary(staff: Vec<StaffSummary>, completion_rate: f64) -> DashboardSummary {
        DashboardSummary {
            counters: StatusCounters {
                total: 10,
                completed: 5,
                pending: 2,
                overdue: 2,
                unknown: 1,
            },
            completion_rate,
            status_distribution: Vec::new(),
            monthly: Vec::new(),
            trailing_months: Vec::new(),
            staff,
        }
    }

    #[test]
    fn bands_follow_progress_thresholds() {
        assert_eq!(PerformanceBand::for_progress(80), PerformanceBand::Excellent);
        assert_eq!(PerformanceBand::for_progress(79), PerformanceBand::Good);
        assert_eq!(PerformanceBand::for_progress(60), PerformanceBand::Good);
        assert_eq!(
            PerformanceBand::for_progress(59),
            PerformanceBand::NeedsImprovement
        );
    }

    #[test]
    fn top_performers_keep_first_seen_order_on_ties() {
        let insights = summary(
            vec![
                staff("Amy", 50),
                staff("Bob", 90),
                staff("Cat", 50),
                staff("Dan", 20),
            ],
            50.0,
        )
        .insights(None);
        let names: Vec<_> = insights
            .top_performers
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Amy", "Cat"]);
        assert_eq!(insights.staff_performance[1].band_label, "Excellent");
    }

    #[test]
    fn on_time_split_is_ninety_percent_of_rate() {
        let insights = summary(Vec::new(), 50.0).insights(Some(4));
        assert_eq!(insights.on_time_pct, 45.0);
        assert_eq!(insights.late_pct, 5.0);
        assert_eq!(insights.active_staff, Some(4));
        assert!(insights
            .observations
            .iter()
            .any(|line| line.contains("4 of 4 active staff")));
        assert!(insights
            .observations
            .iter()
            .any(|line| line.contains("2 tasks past due")));
    }
}
