use super::app::{today, workspace, Notice};
use crate::models::{DeskSession, ExportedImage};
use crate::services::{DeskError, SaveOutcome};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

fn download_url(invoice_number: &str) -> String {
    format!("/invoices/{}/download", urlencoding::encode(invoice_number))
}

/// Save the draft to the bill store, then hand the browser the invoice image.
///
/// Always answers with the workspace fragment; the outcome is reported in the
/// notice banner so HTMX swaps it whatever happened.
pub async fn save_invoice(
    State(state): State<AppState>,
    mut session: DeskSession,
) -> Result<impl IntoResponse, AppError> {
    let notice = match state
        .desk
        .save_and_download(&mut session.draft, today())
        .await
    {
        Ok(outcome) => {
            session.store_draft().await?;
            session.store_saved(outcome.saved()).await?;

            match outcome {
                SaveOutcome::Exported { saved, image } => {
                    session.store_export(&image).await?;
                    Notice {
                        level: "success",
                        message: format!("Invoice {} saved.", saved.invoice_number),
                        issues: Vec::new(),
                        download_url: Some(download_url(&saved.invoice_number)),
                        auto_download: true,
                    }
                }
                SaveOutcome::ExportFailed { saved, error } => {
                    session.clear_export().await?;
                    Notice {
                        level: "warning",
                        message: format!(
                            "Invoice {} saved, but the image could not be generated: {}",
                            saved.invoice_number, error
                        ),
                        issues: Vec::new(),
                        download_url: Some(download_url(&saved.invoice_number)),
                        auto_download: false,
                    }
                }
            }
        }
        Err(DeskError::Validation(e)) => Notice {
            issues: e.issues.iter().map(|issue| issue.to_string()).collect(),
            ..Notice::error("Please complete the invoice before saving.")
        },
        Err(e) => Notice::error(e.to_string()),
    };

    Ok(workspace(&state, &session.draft, Some(notice)).await)
}

/// Serve the image of the bill saved last in this session, exporting it again
/// if the earlier attempt failed.
pub async fn download_invoice(
    State(state): State<AppState>,
    session: DeskSession,
    Path(number): Path<String>,
) -> Result<Response, AppError> {
    if let Some(image) = session.last_export().await? {
        if image.invoice_number == number {
            return Ok(attachment(image));
        }
    }

    let saved = session
        .last_saved()
        .await?
        .filter(|saved| saved.invoice_number == number)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} is not available", number)))?;

    tracing::info!(invoice_number = %number, "Retrying invoice export");
    let image = state
        .desk
        .export(&saved)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Export failed: {}", e)))?;
    session.store_export(&image).await?;

    Ok(attachment(image))
}

fn attachment(image: ExportedImage) -> Response {
    let disposition = image.content_disposition();
    (
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image.png,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_escapes_the_invoice_number() {
        assert_eq!(download_url("INV-1043"), "/invoices/INV-1043/download");
        assert_eq!(download_url("INV/10 43"), "/invoices/INV%2F10%2043/download");
    }
}
