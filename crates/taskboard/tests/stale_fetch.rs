use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use taskboard::workflows::dashboard::{CellValue, ColumnLayout, RawRow, Viewer};
use taskboard::workflows::refresh::{DashboardService, RefreshOutcome};
use taskboard::workflows::sheets::{RowSource, RowSourceError, SheetPayload};
use tokio::sync::Notify;

/// Serves one titled row per sheet; `gated` sheets wait for the gate to open.
struct GatedSource {
    gated: &'static str,
    gate: Arc<Notify>,
}

fn sheet_payload(sheet: &str) -> SheetPayload {
    let layout = ColumnLayout::STANDARD;
    let mut cells = vec![CellValue::Empty; layout.required_width()];
    cells[ColumnLayout::ROSTER_MARKER] = CellValue::from_text("marker");
    cells[layout.assignee] = CellValue::from_text("Amy");
    cells[layout.title] = CellValue::from_text(format!("{sheet} opening checklist"));
    cells[layout.due_date] = CellValue::from_text("20/04/2025");

    let mut closing = cells.clone();
    closing[ColumnLayout::ROSTER_MARKER] = CellValue::Empty;
    closing[layout.assignee] = CellValue::from_text("Bob");
    closing[layout.title] = CellValue::from_text(format!("{sheet} closing checklist"));

    SheetPayload {
        headers: Vec::new(),
        rows: vec![RawRow::new(cells), RawRow::new(closing)],
    }
}

impl RowSource for GatedSource {
    fn fetch_rows(
        &self,
        sheet: &str,
    ) -> impl Future<Output = Result<SheetPayload, RowSourceError>> + Send {
        let wait = sheet == self.gated;
        let gate = Arc::clone(&self.gate);
        let payload = sheet_payload(sheet);
        async move {
            if wait {
                gate.notified().await;
            }
            Ok(payload)
        }
    }
}

struct FailingSource;

impl RowSource for FailingSource {
    fn fetch_rows(
        &self,
        sheet: &str,
    ) -> impl Future<Output = Result<SheetPayload, RowSourceError>> + Send {
        let result = if sheet == "MASTER" {
            Err(RowSourceError::Fetch("roster offline".to_string()))
        } else {
            Ok(sheet_payload(sheet))
        };
        async move { result }
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 20).expect("valid date")
}

#[tokio::test]
async fn slower_older_fetch_is_discarded() {
    let gate = Arc::new(Notify::new());
    let service = DashboardService::new(
        GatedSource {
            gated: "Kitchen",
            gate: Arc::clone(&gate),
        },
        "MASTER",
    );

    let slow = service.refresh("Kitchen", today(), None);
    let fast = async {
        while service.coordinator(None).latest_generation() < 1 {
            tokio::task::yield_now().await;
        }
        let outcome = service.refresh("Bar", today(), None).await;
        gate.notify_one();
        outcome
    };

    let (slow, fast) = tokio::join!(slow, fast);

    match fast.expect("bar fetch") {
        RefreshOutcome::Applied(snapshot) => {
            assert_eq!(snapshot.generation, 2);
            assert_eq!(snapshot.active_staff, Some(1));
        }
        other => panic!("expected newer fetch to apply, got {other:?}"),
    }
    match slow.expect("kitchen fetch") {
        RefreshOutcome::Discarded { generation, latest } => {
            assert_eq!((generation, latest), (1, 2))
        }
        other => panic!("expected stale fetch to be discarded, got {other:?}"),
    }

    let current = service.current(None).expect("snapshot applied");
    assert_eq!(current.sheet, "Bar");
    assert_eq!(current.tasks[0].title, "Bar opening checklist");
}

#[tokio::test]
async fn refreshes_for_different_viewers_do_not_supersede_each_other() {
    let gate = Arc::new(Notify::new());
    let service = DashboardService::new(
        GatedSource {
            gated: "DATA",
            gate: Arc::clone(&gate),
        },
        "MASTER",
    );
    let amy = Viewer::new("staff", "amy");
    let bob = Viewer::new("staff", "bob");

    let slow = service.refresh("DATA", today(), Some(&amy));
    let fast = async {
        while service.coordinator(Some(&amy)).latest_generation() < 1 {
            tokio::task::yield_now().await;
        }
        let outcome = service.refresh("OTHER", today(), Some(&bob)).await;
        gate.notify_one();
        outcome
    };

    let (slow, fast) = tokio::join!(slow, fast);
    assert!(matches!(slow.expect("amy fetch"), RefreshOutcome::Applied(_)));
    assert!(matches!(fast.expect("bob fetch"), RefreshOutcome::Applied(_)));

    let titles = |viewer: &Viewer| -> Vec<String> {
        service
            .current(Some(viewer))
            .expect("snapshot applied")
            .tasks
            .iter()
            .map(|task| task.title.clone())
            .collect()
    };
    assert_eq!(titles(&amy), vec!["DATA opening checklist"]);
    assert_eq!(titles(&bob), vec!["OTHER closing checklist"]);
    assert!(service.current(None).is_none());
}

#[tokio::test]
async fn roster_failure_only_drops_staff_count() {
    let service = DashboardService::new(FailingSource, "MASTER");
    let outcome = service
        .refresh("Kitchen", today(), None)
        .await
        .expect("tasks still load");

    match outcome {
        RefreshOutcome::Applied(snapshot) => {
            assert_eq!(snapshot.active_staff, None);
            assert_eq!(snapshot.summary.counters.total, 2);
            assert_eq!(snapshot.summary.counters.pending, 2);
        }
        other => panic!("expected applied snapshot, got {other:?}"),
    }
}
