use crate::infra::{parse_date, ViewerInput};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use taskboard::config::AppConfig;
use taskboard::error::AppError;
use taskboard::telemetry;
use taskboard::workflows::dashboard::dates::format_day_first;
use taskboard::workflows::dashboard::{
    filter_tasks, ClassifiedTask, ColumnLayout, FilterCriteria, TextScope, ViewWindow, Viewer,
};
use taskboard::workflows::refresh::{DashboardService, DashboardSnapshot, RefreshOutcome};
use taskboard::workflows::sheets::{count_active_staff, SheetImporter, SheetsClient};

/// Flags shared by every command that prints a dashboard.
#[derive(Args, Debug, Default)]
pub(crate) struct PresentationArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Viewer role; anything other than admin only sees its own rows
    #[arg(long, default_value = "admin")]
    pub(crate) viewer_role: String,
    /// Viewer name, matched case-insensitively against the assignee column
    #[arg(long)]
    pub(crate) viewer_name: Option<String>,
    /// Only list tasks with this status (completed, pending, overdue, unknown, all)
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Only list tasks assigned to this exact name
    #[arg(long)]
    pub(crate) assignee: Option<String>,
    /// Case-insensitive text search over task titles
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Match --search against every task field instead of the title only
    #[arg(long)]
    pub(crate) all_fields: bool,
    /// View window: all, recent (due today), upcoming (due tomorrow) or overdue
    #[arg(long, default_value = "all")]
    pub(crate) view: ViewWindow,
    /// Include the filtered task listing in the output
    #[arg(long)]
    pub(crate) list_tasks: bool,
}

impl PresentationArgs {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn viewer(&self) -> Result<Option<Viewer>, AppError> {
        ViewerInput {
            role: self.viewer_role.clone(),
            name: self.viewer_name.clone(),
        }
        .resolve()
    }

    fn criteria(&self) -> Result<FilterCriteria, AppError> {
        let scope = if self.all_fields {
            TextScope::AllFields
        } else {
            TextScope::Title
        };
        FilterCriteria::from_inputs(
            self.status.as_deref(),
            self.assignee.as_deref(),
            self.search.as_deref(),
            scope,
        )
        .map_err(|err| AppError::InvalidInput(err.to_string()))
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// CSV export of the task sheet
    #[arg(long)]
    pub(crate) tasks_csv: PathBuf,
    /// Optional CSV export of the staff roster sheet
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) presentation: PresentationArgs,
}

#[derive(Args, Debug)]
pub(crate) struct FetchArgs {
    /// Task sheet to fetch. Defaults to SHEETS_TASK_SHEET.
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    #[command(flatten)]
    pub(crate) presentation: PresentationArgs,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        tasks_csv,
        roster_csv,
        presentation,
    } = args;

    let viewer = presentation.viewer()?;
    let criteria = presentation.criteria()?;
    let today = presentation.today();

    let tasks = SheetImporter::from_path(&tasks_csv)?;
    tasks.validate_layout(&ColumnLayout::STANDARD)?;
    let active_staff = roster_csv
        .map(|path| SheetImporter::from_path(path).map(|roster| count_active_staff(&roster.rows)))
        .transpose()?;

    let source = tasks_csv.display().to_string();
    let snapshot = DashboardSnapshot::from_rows(
        0,
        &source,
        today,
        &tasks.rows,
        viewer.as_ref(),
        active_staff,
    );

    render_dashboard(&snapshot, viewer.as_ref(), &criteria, &presentation);
    Ok(())
}

pub(crate) async fn run_fetch(args: FetchArgs) -> Result<(), AppError> {
    let FetchArgs {
        sheet,
        presentation,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let viewer = presentation.viewer()?;
    let criteria = presentation.criteria()?;
    let client = SheetsClient::from_config(&config.sheets)?
        .ok_or(AppError::Unavailable("live row source (SHEETS_SCRIPT_URL, SHEETS_SHEET_ID)"))?;
    let service = DashboardService::new(client, config.sheets.roster_sheet.clone());
    let sheet = sheet.unwrap_or_else(|| config.sheets.task_sheet.clone());

    match service
        .refresh(&sheet, presentation.today(), viewer.as_ref())
        .await?
    {
        RefreshOutcome::Applied(snapshot) => {
            render_dashboard(&snapshot, viewer.as_ref(), &criteria, &presentation);
        }
        RefreshOutcome::Discarded { generation, latest } => {
            tracing::warn!(generation, latest, "fetch superseded before it completed");
        }
    }
    Ok(())
}

pub(crate) fn render_dashboard(
    snapshot: &DashboardSnapshot,
    viewer: Option<&Viewer>,
    criteria: &FilterCriteria,
    presentation: &PresentationArgs,
) {
    let summary = &snapshot.summary;
    let insights = &snapshot.insights;
    let counters = &summary.counters;

    println!("Operations dashboard");
    println!("Source: {} (evaluated {})", snapshot.sheet, snapshot.evaluated_on);
    match viewer {
        Some(viewer) => println!("Viewer: {} ({:?})", viewer.name, viewer.role),
        None => println!("Viewer: all staff"),
    }

    println!(
        "\nTasks: {} total | {} completed | {} pending | {} overdue | {} without due date",
        counters.total, counters.completed, counters.pending, counters.overdue, counters.unknown
    );
    println!(
        "Completion rate: {:.1}% (on time {:.1}% | late {:.1}%)",
        summary.completion_rate, insights.on_time_pct, insights.late_pct
    );
    if let Some(active) = snapshot.active_staff {
        println!("Active staff: {active}");
    }

    println!("\nStatus distribution");
    for slice in &summary.status_distribution {
        println!("- {}: {}", slice.label, slice.value);
    }

    println!("\nMonthly trend");
    for month in &summary.trailing_months {
        println!(
            "- {}: {} completed / {} pending",
            month.label, month.completed, month.pending
        );
    }

    if insights.staff_performance.is_empty() {
        println!("\nStaff performance: no assigned tasks");
    } else {
        println!("\nStaff performance");
        for (staff, performance) in summary.staff.iter().zip(&insights.staff_performance) {
            println!(
                "- {}: {}/{} completed, {} pending ({}%, {})",
                staff.name,
                staff.completed_tasks,
                staff.total_tasks,
                staff.pending_tasks,
                staff.progress_percent,
                performance.band_label
            );
        }
    }

    if !insights.top_performers.is_empty() {
        println!("\nTop performers");
        for (rank, staff) in insights.top_performers.iter().enumerate() {
            println!("{}. {} ({}%)", rank + 1, staff.name, staff.progress_percent);
        }
    }

    if !insights.observations.is_empty() {
        println!("\nObservations");
        for note in &insights.observations {
            println!("- {}", note);
        }
    }

    let matching = filter_tasks(
        &snapshot.tasks,
        criteria,
        presentation.view,
        snapshot.evaluated_on,
    );
    println!(
        "\n{}: {} matching task{}",
        presentation.view.label(),
        matching.len(),
        if matching.len() == 1 { "" } else { "s" }
    );
    if presentation.list_tasks {
        for task in matching {
            println!("{}", task_line(task));
        }
    }
}

fn task_line(task: &ClassifiedTask) -> String {
    let view = task.to_view();
    let due = task
        .due_date
        .map(format_day_first)
        .unwrap_or_else(|| "no due date".to_string());
    format!(
        "- [{}] {} | {} | {} | due {} | {}",
        view.id, view.title, view.assigned_to, view.frequency_label, due, view.status_label
    )
}
