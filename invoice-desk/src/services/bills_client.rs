//! HTTP client for the remote bill store.
//!
//! The store is an external REST API:
//! - `GET  {url}/api/bills` lists stored bills (used to seed the counter)
//! - `POST {url}/api/bills` stores a new bill

use crate::config::{BillsApiSettings, InvoiceSettings};
use crate::models::{
    invoice_number, ApiErrorBody, BillListResponse, InvoiceDraft, InvoiceNumber, NewBill,
    SaveBillResponse,
};
use crate::services::totals::InvoiceTotals;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use service_core::observability::{TracedClientExt, TracedRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Bill store unreachable: {0}")]
    Transport(String),

    #[error("Bill store timed out")]
    Timeout,

    #[error("Bill store rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Unexpected response from bill store: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

/// Where saved bills go and where the counter seed comes from.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Next invoice sequence to issue. Never fails: any remote problem is
    /// logged and the configured floor + 1 is returned.
    async fn fetch_seed_invoice_number(&self) -> u32;

    /// Persist a bill and return the invoice number the store confirmed.
    async fn save_bill(
        &self,
        draft: &InvoiceDraft,
        totals: &InvoiceTotals,
        invoice_number: &InvoiceNumber,
        date: NaiveDate,
    ) -> Result<String, RemoteError>;
}

pub struct BillsClient {
    client: Client,
    settings: BillsApiSettings,
    invoice: InvoiceSettings,
}

impl BillsClient {
    pub fn new(settings: BillsApiSettings, invoice: InvoiceSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build bill store HTTP client: {}", e))?;

        Ok(Self {
            client,
            settings,
            invoice,
        })
    }

    fn bills_url(&self) -> String {
        format!("{}/api/bills", self.settings.url.trim_end_matches('/'))
    }

    fn authorize(&self, request: TracedRequest) -> TracedRequest {
        match &self.settings.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Every invoice number currently stored remotely.
    pub async fn list_invoice_numbers(&self) -> Result<Vec<String>, RemoteError> {
        let url = self.bills_url();
        let response = self.authorize(self.client.traced_get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Rejected {
                status,
                message: rejection_message(response).await,
            });
        }

        let records = response.json::<BillListResponse>().await?.into_records();

        Ok(records
            .into_iter()
            .filter_map(|record| record.invoice_number)
            .collect())
    }
}

#[async_trait]
impl BillStore for BillsClient {
    async fn fetch_seed_invoice_number(&self) -> u32 {
        let prefix = &self.invoice.prefix;
        let floor = self.invoice.floor;

        match self.list_invoice_numbers().await {
            Ok(numbers) => {
                let seed =
                    invoice_number::seed_from(prefix, floor, numbers.iter().map(String::as_str));
                tracing::info!(
                    existing = numbers.len(),
                    seed,
                    "Seeded invoice counter from bill store"
                );
                seed
            }
            Err(e) => {
                let seed = floor.saturating_add(1);
                tracing::warn!(
                    error = %e,
                    seed,
                    "Could not list bills, invoice counter falls back to floor"
                );
                seed
            }
        }
    }

    async fn save_bill(
        &self,
        draft: &InvoiceDraft,
        totals: &InvoiceTotals,
        invoice_number: &InvoiceNumber,
        date: NaiveDate,
    ) -> Result<String, RemoteError> {
        let bill = NewBill::new(draft, totals, invoice_number, date);
        let url = self.bills_url();

        let response = self
            .authorize(self.client.traced_post(&url))
            .json(&bill)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(invoice_number = %bill.invoice_number, error = %e, "Failed to send bill");
                RemoteError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = rejection_message(response).await;
            tracing::error!(
                invoice_number = %bill.invoice_number,
                status = %status,
                message = %message,
                "Bill store rejected bill"
            );
            return Err(RemoteError::Rejected { status, message });
        }

        let confirmed = match response.json::<SaveBillResponse>().await {
            Ok(body) => body.bill.and_then(|b| b.invoice_number),
            Err(e) => {
                tracing::warn!(error = %e, "Bill saved but response body was not understood");
                None
            }
        };

        Ok(confirmed.unwrap_or_else(|| {
            tracing::warn!(
                invoice_number = %bill.invoice_number,
                "Bill store did not echo an invoice number, using the submitted one"
            );
            bill.invoice_number.clone()
        }))
    }
}

/// `{message}` from an error body, or the raw body / status text when absent.
async fn rejection_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(ApiErrorBody {
            message: Some(message),
        }) => message,
        _ if !text.trim().is_empty() => text,
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}
