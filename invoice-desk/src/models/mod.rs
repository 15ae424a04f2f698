//! Domain models for the invoice desk.

pub mod bill;
pub mod draft;
pub mod invoice_number;
pub mod line_item;
pub mod preview;
pub mod saved;
pub mod session;

pub use bill::{
    ApiErrorBody, BillListResponse, BillRecord, NewBill, NewBillItem, SaveBillResponse,
};
pub use draft::{InvoiceDraft, ValidationError, ValidationIssue, MAX_ITEMS};
pub use invoice_number::{InvoiceCounter, InvoiceNumber};
pub use line_item::{parse_numeric, parse_percentage, ItemField, LineItem, NumericInput};
pub use preview::{InvoicePreview, PreviewRow, PreviewTotalLine};
pub use saved::{ExportedImage, SavedInvoice};
pub use session::DeskSession;
