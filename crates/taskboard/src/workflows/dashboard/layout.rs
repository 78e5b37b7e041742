/// Fixed column positions (0-indexed) of the task sheet.
///
/// The backing sheet enforces no schema, so every positional read goes through
/// one of these constants instead of an ad hoc index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub task_id: usize,
    pub assignee: usize,
    pub frequency: usize,
    /// Anchor column: a row without a title is not a task.
    pub title: usize,
    pub due_date: usize,
    pub completed_date: usize,
}

impl ColumnLayout {
    pub const STANDARD: Self = Self {
        task_id: 1,
        assignee: 4,
        frequency: 5,
        title: 6,
        due_date: 11,
        completed_date: 12,
    };

    /// Roster sheet column whose non-empty cells mark an active staff member.
    pub const ROSTER_MARKER: usize = 2;

    /// Number of columns a header row must span for every position to exist.
    pub fn required_width(&self) -> usize {
        [
            self.task_id,
            self.assignee,
            self.frequency,
            self.title,
            self.due_date,
            self.completed_date,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Checks a payload's header list once at the row-source boundary.
    ///
    /// An empty header list is accepted: the rows are then read positionally
    /// with spreadsheet letter ids.
    pub fn validate<H>(&self, headers: &[H]) -> Result<(), LayoutMismatch> {
        let required = self.required_width();
        if headers.is_empty() || headers.len() >= required {
            Ok(())
        } else {
            Err(LayoutMismatch {
                required,
                found: headers.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutMismatch {
    pub required: usize,
    pub found: usize,
}

impl std::fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sheet has {} columns but the task layout needs {}",
            self.found, self.required
        )
    }
}

impl std::error::Error for LayoutMismatch {}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_reaches_completion_column() {
        assert_eq!(ColumnLayout::STANDARD.required_width(), 13);
        assert_eq!(ColumnLayout::STANDARD.assignee, 4);
        assert_eq!(ColumnLayout::STANDARD.frequency, 5);
        assert_eq!(ColumnLayout::STANDARD.due_date, 11);
        assert_eq!(ColumnLayout::STANDARD.completed_date, 12);
    }

    #[test]
    fn short_header_lists_are_rejected() {
        let layout = ColumnLayout::STANDARD;
        assert!(layout.validate::<&str>(&[]).is_ok());
        assert!(layout.validate(&["x"; 13]).is_ok());
        let err = layout.validate(&["x"; 7]).expect_err("too narrow");
        assert_eq!(err, LayoutMismatch { required: 13, found: 7 });
    }
}
