use super::{ExportedImage, InvoiceDraft, SavedInvoice};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use tower_sessions::Session;

const DRAFT_KEY: &str = "draft";
const LAST_SAVED_KEY: &str = "last_saved";
const LAST_EXPORT_KEY: &str = "last_export";

/// Per-browser desk state extracted from the session: the draft being edited
/// plus the most recent saved bill and its exported image.
pub struct DeskSession {
    session: Session,
    pub draft: InvoiceDraft,
}

#[async_trait]
impl<S> FromRequestParts<S> for DeskSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, message)| (status, message).into_response())?;

        let draft = session
            .get::<InvoiceDraft>(DRAFT_KEY)
            .await
            .map_err(session_error)?
            .unwrap_or_default();

        Ok(DeskSession { session, draft })
    }
}

fn session_error(err: tower_sessions::session::Error) -> Response {
    tracing::error!(error = %err, "Session store failure");
    AppError::InternalError(anyhow::anyhow!("Session store failure: {}", err)).into_response()
}

impl DeskSession {
    /// Write the (possibly mutated) draft back to the session.
    pub async fn store_draft(&self) -> Result<(), AppError> {
        self.session
            .insert(DRAFT_KEY, &self.draft)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to store draft: {}", e)))
    }

    pub async fn last_saved(&self) -> Result<Option<SavedInvoice>, AppError> {
        self.session.get(LAST_SAVED_KEY).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to read saved invoice: {}", e))
        })
    }

    pub async fn store_saved(&self, saved: &SavedInvoice) -> Result<(), AppError> {
        self.session.insert(LAST_SAVED_KEY, saved).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to store saved invoice: {}", e))
        })
    }

    pub async fn last_export(&self) -> Result<Option<ExportedImage>, AppError> {
        self.session.get(LAST_EXPORT_KEY).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to read exported image: {}", e))
        })
    }

    pub async fn store_export(&self, image: &ExportedImage) -> Result<(), AppError> {
        self.session.insert(LAST_EXPORT_KEY, image).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to store exported image: {}", e))
        })
    }

    /// Forget a stale image so a later download cannot serve the wrong bill.
    pub async fn clear_export(&self) -> Result<(), AppError> {
        self.session
            .remove::<ExportedImage>(LAST_EXPORT_KEY)
            .await
            .map(|_| ())
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to clear exported image: {}", e))
            })
    }
}
