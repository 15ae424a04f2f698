//! Save-and-download workflow controller.
//!
//! `InvoiceDesk` owns the invoice counter and the in-flight flag. A save walks
//! `Idle -> Validating -> Saving -> Exporting -> Idle`; validation and remote
//! failures drop straight back to `Idle` with the draft untouched.

use crate::config::BusinessSettings;
use crate::models::{
    ExportedImage, InvoiceCounter, InvoiceDraft, InvoiceNumber, InvoicePreview, SavedInvoice,
    ValidationError,
};
use crate::services::bills_client::{BillStore, RemoteError};
use crate::services::export::{ExportError, PreviewExporter};
use crate::services::metrics;
use crate::services::totals::InvoiceTotals;
use chrono::NaiveDate;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Could not save the bill: {0}")]
    Remote(#[from] RemoteError),

    #[error("Another invoice is being saved at this desk, please wait")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Idle,
    Validating,
    Saving,
    Exporting,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Idle => "idle",
            WorkflowStage::Validating => "validating",
            WorkflowStage::Saving => "saving",
            WorkflowStage::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

/// Result of a save that reached the bill store.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Bill stored and image ready for download.
    Exported {
        saved: SavedInvoice,
        image: ExportedImage,
    },
    /// Bill stored but rasterization failed. `saved` can be exported again.
    ExportFailed {
        saved: SavedInvoice,
        error: ExportError,
    },
}

impl SaveOutcome {
    pub fn saved(&self) -> &SavedInvoice {
        match self {
            SaveOutcome::Exported { saved, .. } | SaveOutcome::ExportFailed { saved, .. } => saved,
        }
    }
}

/// Clears the loading flag however the workflow exits.
struct SavingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SavingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct Workflow<'a> {
    stage: WorkflowStage,
    number: Option<&'a InvoiceNumber>,
}

impl Workflow<'_> {
    fn enter(&mut self, next: WorkflowStage) {
        tracing::debug!(from = %self.stage, to = %next, invoice_number = ?self.number.map(|n| n.to_string()), "Invoice workflow transition");
        self.stage = next;
    }
}

pub struct InvoiceDesk {
    store: Arc<dyn BillStore>,
    exporter: Arc<dyn PreviewExporter>,
    business: BusinessSettings,
    counter: Mutex<InvoiceCounter>,
    saving: AtomicBool,
}

impl InvoiceDesk {
    /// Build the desk and seed its counter from the bill store.
    pub async fn start(
        store: Arc<dyn BillStore>,
        exporter: Arc<dyn PreviewExporter>,
        business: BusinessSettings,
        prefix: &str,
    ) -> Self {
        let seed = store.fetch_seed_invoice_number().await;
        tracing::info!(prefix = %prefix, next = seed, "Invoice desk ready");
        Self::with_counter(store, exporter, business, InvoiceCounter::new(prefix, seed))
    }

    pub fn with_counter(
        store: Arc<dyn BillStore>,
        exporter: Arc<dyn PreviewExporter>,
        business: BusinessSettings,
        counter: InvoiceCounter,
    ) -> Self {
        Self {
            store,
            exporter,
            business,
            counter: Mutex::new(counter),
            saving: AtomicBool::new(false),
        }
    }

    /// The number the next saved bill will carry.
    pub async fn next_invoice_number(&self) -> InvoiceNumber {
        self.counter.lock().await.current()
    }

    /// Loading flag: true while a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn business(&self) -> &BusinessSettings {
        &self.business
    }

    pub async fn preview(&self, draft: &InvoiceDraft, date: NaiveDate) -> InvoicePreview {
        let number = self.next_invoice_number().await;
        InvoicePreview::render(&self.business, draft, &number.to_string(), date)
    }

    /// Run the save-and-download workflow for `draft`.
    ///
    /// On `Err` nothing was persisted and `draft` is unchanged. On `Ok` the
    /// counter has advanced and `draft` is reset, whether or not the export
    /// succeeded.
    pub async fn save_and_download(
        &self,
        draft: &mut InvoiceDraft,
        date: NaiveDate,
    ) -> Result<SaveOutcome, DeskError> {
        let _guard = SavingGuard::acquire(&self.saving).ok_or_else(|| {
            tracing::warn!("Rejected save while another save is in flight");
            metrics::record_save_failure("busy");
            DeskError::Busy
        })?;

        // Saves are serialized by the guard, so the number cannot change
        // between this read and the advance below.
        let number = self.next_invoice_number().await;
        let mut workflow = Workflow {
            stage: WorkflowStage::Idle,
            number: Some(&number),
        };

        workflow.enter(WorkflowStage::Validating);
        if let Err(e) = draft.validate() {
            tracing::info!(issues = e.issues.len(), "Invoice draft failed validation");
            metrics::record_save_failure("validation");
            workflow.enter(WorkflowStage::Idle);
            return Err(e.into());
        }

        workflow.enter(WorkflowStage::Saving);
        let totals = InvoiceTotals::compute(draft);
        let confirmed = match self.store.save_bill(draft, &totals, &number, date).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::error!(invoice_number = %number, error = %e, "Saving bill failed");
                metrics::record_save_failure("remote");
                workflow.enter(WorkflowStage::Idle);
                return Err(e.into());
            }
        };
        self.counter.lock().await.advance();
        metrics::record_invoice_saved();
        tracing::info!(
            invoice_number = %confirmed,
            grand_total = %totals.grand_total.round_dp(2),
            items = draft.items.len(),
            "Bill saved"
        );

        workflow.enter(WorkflowStage::Exporting);
        let saved = SavedInvoice {
            invoice_number: confirmed,
            date,
            draft: std::mem::take(draft),
        };
        let exported = self.export(&saved).await;
        workflow.enter(WorkflowStage::Idle);

        Ok(match exported {
            Ok(image) => SaveOutcome::Exported { saved, image },
            Err(error) => SaveOutcome::ExportFailed { saved, error },
        })
    }

    /// Rasterize a saved bill. Used by the workflow and for download retries.
    pub async fn export(&self, saved: &SavedInvoice) -> Result<ExportedImage, ExportError> {
        let preview =
            InvoicePreview::render(&self.business, &saved.draft, &saved.invoice_number, saved.date);
        let exporter = Arc::clone(&self.exporter);

        let result = tokio::task::spawn_blocking(move || exporter.export(&preview))
            .await
            .map_err(|e| ExportError::Aborted(e.to_string()))
            .and_then(|r| r);

        match &result {
            Ok(image) => {
                metrics::record_export("success");
                tracing::info!(
                    invoice_number = %saved.invoice_number,
                    file_name = %image.file_name,
                    bytes = image.png.len(),
                    "Invoice image exported"
                );
            }
            Err(e) => {
                metrics::record_export("failure");
                tracing::error!(
                    invoice_number = %saved.invoice_number,
                    error = %e,
                    "Invoice image export failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeStore {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl FakeStore {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl BillStore for FakeStore {
        async fn fetch_seed_invoice_number(&self) -> u32 {
            1043
        }

        async fn save_bill(
            &self,
            _draft: &InvoiceDraft,
            _totals: &InvoiceTotals,
            invoice_number: &InvoiceNumber,
            _date: NaiveDate,
        ) -> Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(RemoteError::Transport("connection refused".to_string()))
            } else {
                Ok(invoice_number.to_string())
            }
        }
    }

    struct FakeExporter {
        fail: bool,
    }

    impl PreviewExporter for FakeExporter {
        fn export(&self, preview: &InvoicePreview) -> Result<ExportedImage, ExportError> {
            if self.fail {
                return Err(ExportError::Aborted("rasterizer crashed".to_string()));
            }
            Ok(ExportedImage {
                invoice_number: preview.invoice_number.clone(),
                file_name: preview.file_name(),
                png: vec![1, 2, 3],
            })
        }
    }

    fn business() -> BusinessSettings {
        BusinessSettings {
            brand: "Hotel Sunrise".to_string(),
            tax_id: "29ABCDE1234F1Z5".to_string(),
            address: Vec::new(),
            phone: None,
        }
    }

    async fn desk(store: Arc<FakeStore>, export_fails: bool) -> InvoiceDesk {
        InvoiceDesk::start(
            store,
            Arc::new(FakeExporter { fail: export_fails }),
            business(),
            "INV",
        )
        .await
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn filled_draft() -> InvoiceDraft {
        let mut draft = InvoiceDraft::default();
        draft.set_customer_name("Asha Rao");
        draft.set_customer_mobile("9876543210");
        draft.items = vec![LineItem::new("Deluxe Room", dec!(2), dec!(100), dec!(18))];
        draft
    }

    #[tokio::test]
    async fn start_seeds_counter_from_store() {
        let desk = desk(Arc::new(FakeStore::ok()), false).await;
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1043");
        assert!(!desk.is_saving());
    }

    #[tokio::test]
    async fn successful_save_advances_counter_and_resets_draft() {
        let store = Arc::new(FakeStore::ok());
        let desk = desk(store.clone(), false).await;
        let mut draft = filled_draft();

        let outcome = desk.save_and_download(&mut draft, today()).await.unwrap();

        match &outcome {
            SaveOutcome::Exported { saved, image } => {
                assert_eq!(saved.invoice_number, "INV-1043");
                assert_eq!(saved.draft.customer_name, "Asha Rao");
                assert_eq!(image.file_name, "Hotel Sunrise-Invoice-INV-1043.png");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(draft, InvoiceDraft::default());
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1044");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert!(!desk.is_saving());
    }

    #[tokio::test]
    async fn validation_failure_makes_no_remote_call() {
        let store = Arc::new(FakeStore::ok());
        let desk = desk(store.clone(), false).await;
        let mut draft = filled_draft();
        draft.set_customer_name("");
        let before = draft.clone();

        let err = desk.save_and_download(&mut draft, today()).await.unwrap_err();

        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert_eq!(draft, before);
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1043");
    }

    #[tokio::test]
    async fn remote_failure_keeps_draft_and_counter() {
        let store = Arc::new(FakeStore {
            fail: true,
            ..FakeStore::ok()
        });
        let desk = desk(store, false).await;
        let mut draft = filled_draft();
        let before = draft.clone();

        let err = desk.save_and_download(&mut draft, today()).await.unwrap_err();

        assert!(matches!(err, DeskError::Remote(RemoteError::Transport(_))));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(draft, before);
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1043");
        assert!(!desk.is_saving());
    }

    #[tokio::test]
    async fn export_failure_still_reports_saved_bill() {
        let desk = desk(Arc::new(FakeStore::ok()), true).await;
        let mut draft = filled_draft();

        let outcome = desk.save_and_download(&mut draft, today()).await.unwrap();

        match outcome {
            SaveOutcome::ExportFailed { saved, error } => {
                assert_eq!(saved.invoice_number, "INV-1043");
                assert_eq!(saved.draft, filled_draft());
                assert!(matches!(error, ExportError::Aborted(_)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1044");
    }

    #[tokio::test]
    async fn preview_is_not_held_up_by_a_save_in_flight() {
        let store = Arc::new(FakeStore {
            delay: Duration::from_millis(1000),
            ..FakeStore::ok()
        });
        let desk = Arc::new(desk(store, false).await);

        let save = {
            let desk = Arc::clone(&desk);
            tokio::spawn(async move {
                let mut draft = filled_draft();
                desk.save_and_download(&mut draft, today()).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(desk.is_saving());

        let preview = tokio::time::timeout(
            Duration::from_millis(100),
            desk.preview(&InvoiceDraft::default(), today()),
        )
        .await
        .expect("preview waited for the save to finish");
        assert_eq!(preview.invoice_number, "INV-1043");

        assert!(save.await.unwrap().is_ok());
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1044");
    }

    #[tokio::test]
    async fn concurrent_save_is_rejected_while_in_flight() {
        let store = Arc::new(FakeStore {
            delay: Duration::from_millis(200),
            ..FakeStore::ok()
        });
        let desk = Arc::new(desk(store.clone(), false).await);

        let first = {
            let desk = Arc::clone(&desk);
            tokio::spawn(async move {
                let mut draft = filled_draft();
                desk.save_and_download(&mut draft, today()).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(desk.is_saving());

        let mut second_draft = filled_draft();
        let second = desk.save_and_download(&mut second_draft, today()).await;
        assert!(matches!(second, Err(DeskError::Busy)));
        assert_eq!(
            DeskError::Busy.to_string(),
            "Another invoice is being saved at this desk, please wait"
        );
        assert_eq!(second_draft, filled_draft());

        assert!(first.await.unwrap().is_ok());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(desk.next_invoice_number().await.to_string(), "INV-1044");
    }
}
