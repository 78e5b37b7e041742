use super::DashboardSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Proof that a fetch was started; carries its generation number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    sheet: String,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Serializes out-of-order fetch completions.
///
/// Every fetch takes a ticket from a monotonic counter; a completion is only
/// applied while its ticket is still the latest one issued, so a slow fetch
/// can never overwrite the result of a fetch that started after it.
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    issued: AtomicU64,
    latest: Mutex<Option<Arc<DashboardSnapshot>>>,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, sheet: &str) -> FetchTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, sheet, "fetch started");
        FetchTicket {
            generation,
            sheet: sheet.to_string(),
        }
    }

    /// Generation of the most recently issued ticket, 0 before the first fetch.
    pub fn latest_generation(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.latest_generation() == ticket.generation
    }

    /// Applies `snapshot` if `ticket` is still current. Returns `false` for stale completions.
    pub fn complete(&self, ticket: FetchTicket, snapshot: DashboardSnapshot) -> bool {
        self.apply(&ticket, Arc::new(snapshot))
    }

    pub(crate) fn apply(&self, ticket: &FetchTicket, snapshot: Arc<DashboardSnapshot>) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(ticket) {
            tracing::warn!(
                generation = ticket.generation,
                latest = self.latest_generation(),
                sheet = %ticket.sheet,
                "discarding stale fetch result"
            );
            return false;
        }

        *latest = Some(snapshot);
        true
    }

    /// The last snapshot that was applied, if any.
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
