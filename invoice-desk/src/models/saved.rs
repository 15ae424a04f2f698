//! What survives a successful save: the bill snapshot and its exported image.

use super::InvoiceDraft;
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A bill the store has accepted, kept so its image can be exported again
/// after the form has been reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInvoice {
    /// Number confirmed by the bill store.
    pub invoice_number: String,
    pub date: NaiveDate,
    pub draft: InvoiceDraft,
}

/// A rasterized invoice ready for download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedImage {
    pub invoice_number: String,
    pub file_name: String,
    #[serde(serialize_with = "to_base64", deserialize_with = "from_base64")]
    pub png: Vec<u8>,
}

impl ExportedImage {
    /// `Content-Disposition` value that makes the browser save the file.
    pub fn content_disposition(&self) -> String {
        let safe_name: String = self
            .file_name
            .chars()
            .map(|c| {
                if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                    '_'
                } else {
                    c
                }
            })
            .collect();
        format!("attachment; filename=\"{}\"", safe_name)
    }
}

fn to_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

fn from_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(serde::de::Error::custom)
}
