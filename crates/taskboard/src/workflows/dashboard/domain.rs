use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// One spreadsheet cell as delivered by the row source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Wraps raw text, treating whitespace-only input as an empty cell.
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }

    /// Trimmed string form, `None` when the cell carries nothing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Cow::Borrowed(trimmed))
                }
            }
            CellValue::Number(value) if value.is_finite() => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    Some(Cow::Owned(format!("{}", *value as i64)))
                } else {
                    Some(Cow::Owned(value.to_string()))
                }
            }
            CellValue::Number(_) => None,
            CellValue::Bool(value) => Some(Cow::Borrowed(if *value { "true" } else { "false" })),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map(Self::from_text).unwrap_or(Self::Empty)
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Positionally indexed cells of one sheet row. Columns past the end read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, position: usize) -> &CellValue {
        self.cells.get(position).unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, position: usize) -> Option<String> {
        self.cell(position).as_text().map(Cow::into_owned)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

impl FromIterator<CellValue> for RawRow {
    fn from_iter<I: IntoIterator<Item = CellValue>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Pending,
    Overdue,
    Unknown,
}

impl TaskStatus {
    /// Statuses that own a bucket in the distribution; `Unknown` only counts toward totals.
    pub const fn bucketed() -> [Self; 3] {
        [Self::Completed, Self::Pending, Self::Overdue]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
            Self::Unknown => "Unknown",
        }
    }

    pub const fn chart_color(self) -> &'static str {
        match self {
            Self::Completed => "#4ade80",
            Self::Pending => "#facc15",
            Self::Overdue => "#fb7185",
            Self::Unknown => "#9ca3af",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "overdue" => Ok(Self::Overdue),
            "unknown" => Ok(Self::Unknown),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    OneTime,
}

impl Frequency {
    /// Anything the sheet does not spell as a recurring cadence is a one-time task.
    pub fn from_cell(cell: &CellValue) -> Self {
        match cell.as_text() {
            Some(text) => match text.to_ascii_lowercase().as_str() {
                "daily" => Self::Daily,
                "weekly" => Self::Weekly,
                "monthly" => Self::Monthly,
                _ => Self::OneTime,
            },
            None => Self::OneTime,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::OneTime => "One-time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Self::Admin,
            _ => Self::Staff,
        }
    }
}

/// Identity used to scope which rows a dashboard viewer may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub role: Role,
    pub name: String,
}

impl Viewer {
    pub fn new(role: &str, name: impl Into<String>) -> Self {
        Self {
            role: Role::parse(role),
            name: name.into(),
        }
    }

    /// Admins see everything; everyone else only rows assigned to them.
    pub fn can_see(&self, assignee: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Staff => assignee.trim().to_lowercase() == self.name.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_text_is_blank() {
        assert!(CellValue::from_text("   ").is_blank());
        assert!(CellValue::Text(" \t".to_string()).is_blank());
        assert_eq!(
            CellValue::Text("  Amy ".to_string()).as_text().as_deref(),
            Some("Amy")
        );
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(CellValue::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert!(CellValue::Number(f64::NAN).is_blank());
    }

    #[test]
    fn cells_deserialize_from_json_scalars() {
        let cells: Vec<CellValue> =
            serde_json::from_str(r#"["Amy", 3, null, true]"#).expect("valid cells");
        assert_eq!(
            cells,
            vec![
                CellValue::Text("Amy".to_string()),
                CellValue::Number(3.0),
                CellValue::Empty,
                CellValue::Bool(true),
            ]
        );
    }

    #[test]
    fn missing_columns_read_as_empty() {
        let row: RawRow = vec![CellValue::from("a")].into_iter().collect();
        assert!(row.cell(12).is_blank());
        assert_eq!(row.text(0).as_deref(), Some("a"));
    }

    #[test]
    fn frequency_defaults_to_one_time() {
        assert_eq!(Frequency::from_cell(&"WEEKLY".into()), Frequency::Weekly);
        assert_eq!(Frequency::from_cell(&"quarterly".into()), Frequency::OneTime);
        assert_eq!(Frequency::from_cell(&CellValue::Empty), Frequency::OneTime);
    }

    #[test]
    fn staff_viewer_matches_assignee_case_insensitively() {
        let viewer = Viewer::new("staff", "bob");
        assert!(viewer.can_see(" Bob "));
        assert!(!viewer.can_see("Amy"));
        assert!(Viewer::new("Admin", "root").can_see("Amy"));
    }

    #[test]
    fn status_parses_from_filter_strings() {
        assert_eq!("Overdue".parse::<TaskStatus>(), Ok(TaskStatus::Overdue));
        assert!("late".parse::<TaskStatus>().is_err());
    }
}
