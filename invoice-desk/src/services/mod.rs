pub mod bills_client;
pub mod desk;
pub mod export;
pub mod metrics;
pub mod totals;

pub use bills_client::{BillStore, BillsClient, RemoteError};
pub use desk::{DeskError, InvoiceDesk, SaveOutcome, WorkflowStage};
pub use export::{ExportError, PngExporter, PreviewExporter};
