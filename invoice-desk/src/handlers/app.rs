use crate::models::{DeskSession, InvoiceDraft, InvoicePreview};
use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};
use chrono::{Local, NaiveDate};
use service_core::error::AppError;

/// Banner shown above the form after a save attempt.
#[derive(Debug, Clone)]
pub struct Notice {
    /// `success`, `warning` or `error`; used as a CSS modifier.
    pub level: &'static str,
    pub message: String,
    pub issues: Vec<String>,
    pub download_url: Option<String>,
    /// Click the download link as soon as the fragment is swapped in.
    pub auto_download: bool,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: "error",
            message: message.into(),
            issues: Vec::new(),
            download_url: None,
            auto_download: false,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub draft: InvoiceDraft,
    pub preview: InvoicePreview,
    pub saving: bool,
    pub notice: Option<Notice>,
}

/// Form and preview together; returned by structural edits and by saves.
#[derive(Template)]
#[template(path = "partials/workspace.html")]
pub struct WorkspaceTemplate {
    pub draft: InvoiceDraft,
    pub preview: InvoicePreview,
    pub saving: bool,
    pub notice: Option<Notice>,
}

/// Just the invoice document; returned while the user types so input focus
/// is never disturbed.
#[derive(Template)]
#[template(path = "partials/preview.html")]
pub struct PreviewTemplate {
    pub preview: InvoicePreview,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn workspace(
    state: &AppState,
    draft: &InvoiceDraft,
    notice: Option<Notice>,
) -> WorkspaceTemplate {
    WorkspaceTemplate {
        draft: draft.clone(),
        preview: state.desk.preview(draft, today()).await,
        saving: state.desk.is_saving(),
        notice,
    }
}

pub async fn preview(state: &AppState, draft: &InvoiceDraft) -> PreviewTemplate {
    PreviewTemplate {
        preview: state.desk.preview(draft, today()).await,
    }
}

pub async fn index(
    State(state): State<AppState>,
    session: DeskSession,
) -> Result<impl IntoResponse, AppError> {
    session.store_draft().await?;

    Ok(IndexTemplate {
        preview: state.desk.preview(&session.draft, today()).await,
        saving: state.desk.is_saving(),
        draft: session.draft,
        notice: None,
    })
}

pub async fn health_check() -> &'static str {
    "OK"
}
