mod insights;
mod summary;
pub mod views;

pub use summary::{DashboardReport, MonthlyCounts, StaffTally, TRAILING_CHART_MONTHS};

pub(crate) use insights::generate_insights;
