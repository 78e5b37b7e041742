use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use taskboard::error::AppError;
use taskboard::workflows::dashboard::{FilterCriteria, Role, TextScope, Viewer};
use taskboard::workflows::refresh::DashboardService;
use taskboard::workflows::sheets::SheetsClient;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// `None` when no live row source is configured.
    pub(crate) dashboard: Option<Arc<DashboardService<SheetsClient>>>,
    pub(crate) default_sheet: String,
}

/// Who is looking at the dashboard, as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ViewerInput {
    #[serde(default = "default_role")]
    pub(crate) role: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

fn default_role() -> String {
    "admin".to_string()
}

impl Default for ViewerInput {
    fn default() -> Self {
        Self {
            role: default_role(),
            name: None,
        }
    }
}

impl ViewerInput {
    /// Admins without a name see every row; anyone else must be named.
    pub(crate) fn resolve(&self) -> Result<Option<Viewer>, AppError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        match name {
            Some(name) => Ok(Some(Viewer::new(&self.role, name))),
            None if Role::parse(&self.role) == Role::Admin => Ok(None),
            None => Err(AppError::InvalidInput(
                "a viewer name is required for non-admin roles".to_string(),
            )),
        }
    }
}

/// Filter selections in their dropdown form; `"all"` disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FilterInput {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) assignee: Option<String>,
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) text_scope: TextScope,
}

impl FilterInput {
    pub(crate) fn criteria(&self) -> Result<FilterCriteria, AppError> {
        FilterCriteria::from_inputs(
            self.status.as_deref(),
            self.assignee.as_deref(),
            self.text.as_deref(),
            self.text_scope,
        )
        .map_err(|err| AppError::InvalidInput(err.to_string()))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_admin_sees_everything() {
        let viewer = ViewerInput::default().resolve().expect("admin viewer");
        assert!(viewer.is_none());
    }

    #[test]
    fn staff_viewer_needs_a_name() {
        let anonymous = ViewerInput {
            role: "staff".to_string(),
            name: Some("  ".to_string()),
        };
        assert!(anonymous.resolve().is_err());

        let named = ViewerInput {
            role: "staff".to_string(),
            name: Some("bob".to_string()),
        };
        let viewer = named.resolve().expect("named viewer").expect("scoped");
        assert!(viewer.can_see("Bob"));
        assert!(!viewer.can_see("Amy"));
    }

    #[test]
    fn parse_date_rejects_day_first_input() {
        assert_eq!(
            parse_date("2025-04-20"),
            Ok(NaiveDate::from_ymd_opt(2025, 4, 20).expect("valid date"))
        );
        assert!(parse_date("20/04/2025").is_err());
    }
}
