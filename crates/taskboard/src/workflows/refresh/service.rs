use super::{DashboardSnapshot, FetchCoordinator};
use crate::workflows::dashboard::{ColumnLayout, Role, Viewer};
use crate::workflows::sheets::{count_active_staff, RowSource, RowSourceError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Applied(Arc<DashboardSnapshot>),
    /// A newer fetch for the same viewer was started while this one was in flight.
    Discarded { generation: u64, latest: u64 },
}

/// Identifies one viewer's refresh stream.
///
/// Admins see every row whatever their name, so they share the unscoped
/// stream; staff are keyed by their case-folded name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerKey {
    Unscoped,
    Staff(String),
}

impl ViewerKey {
    pub fn for_viewer(viewer: Option<&Viewer>) -> Self {
        match viewer {
            Some(viewer) if viewer.role == Role::Staff => {
                Self::Staff(viewer.name.trim().to_lowercase())
            }
            _ => Self::Unscoped,
        }
    }
}

/// Fetches task and roster rows and publishes dashboard snapshots.
///
/// Each viewer gets its own [`FetchCoordinator`], so a refresh only
/// supersedes earlier refreshes made for the same viewer.
pub struct DashboardService<S> {
    source: S,
    coordinators: Mutex<HashMap<ViewerKey, Arc<FetchCoordinator>>>,
    roster_sheet: String,
    layout: ColumnLayout,
}

impl<S> DashboardService<S>
where
    S: RowSource,
{
    pub fn new(source: S, roster_sheet: impl Into<String>) -> Self {
        Self {
            source,
            coordinators: Mutex::new(HashMap::new()),
            roster_sheet: roster_sheet.into(),
            layout: ColumnLayout::STANDARD,
        }
    }

    /// The coordinator for `viewer`'s stream, created on first use.
    pub fn coordinator(&self, viewer: Option<&Viewer>) -> Arc<FetchCoordinator> {
        let mut coordinators = self
            .coordinators
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            coordinators
                .entry(ViewerKey::for_viewer(viewer))
                .or_default(),
        )
    }

    /// The last snapshot applied for `viewer`, if any.
    pub fn current(&self, viewer: Option<&Viewer>) -> Option<Arc<DashboardSnapshot>> {
        self.coordinators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ViewerKey::for_viewer(viewer))
            .and_then(|coordinator| coordinator.latest())
    }

    /// Runs one fetch cycle for `sheet` on behalf of `viewer`.
    ///
    /// Task and roster rows are fetched concurrently; aggregation waits for
    /// both. A roster failure only drops the active staff count.
    pub async fn refresh(
        &self,
        sheet: &str,
        now: NaiveDate,
        viewer: Option<&Viewer>,
    ) -> Result<RefreshOutcome, RowSourceError> {
        let coordinator = self.coordinator(viewer);
        let ticket = coordinator.begin(sheet);

        let (tasks, roster) = tokio::join!(
            self.source.fetch_rows(sheet),
            self.source.fetch_rows(&self.roster_sheet)
        );

        let tasks = tasks?;
        tasks.validate_layout(&self.layout)?;

        let active_staff = match roster {
            Ok(roster) => Some(count_active_staff(&roster.rows)),
            Err(err) => {
                tracing::warn!(sheet = %self.roster_sheet, error = %err, "roster fetch failed");
                None
            }
        };

        let snapshot = Arc::new(DashboardSnapshot::from_rows(
            ticket.generation(),
            sheet,
            now,
            &tasks.rows,
            viewer,
            active_staff,
        ));

        if coordinator.apply(&ticket, Arc::clone(&snapshot)) {
            tracing::debug!(
                generation = ticket.generation(),
                tasks = snapshot.tasks.len(),
                "dashboard snapshot applied"
            );
            Ok(RefreshOutcome::Applied(snapshot))
        } else {
            Ok(RefreshOutcome::Discarded {
                generation: ticket.generation(),
                latest: coordinator.latest_generation(),
            })
        }
    }
}
