use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{configuration_directory, load_settings};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub bills_api: BillsApiSettings,
    #[serde(default)]
    pub invoice: InvoiceSettings,
    pub business: BusinessSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct BillsApiSettings {
    /// Base URL of the bill store; `/api/bills` is appended.
    pub url: String,
    /// Per-request timeout for both the seed fetch and the save.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub api_token: Option<Secret<String>>,
}

impl BillsApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Deserialize, Clone, Debug)]
pub struct InvoiceSettings {
    /// Invoice numbers look like `<prefix>-1043`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Counter floor used when no remote number matches the prefix.
    #[serde(default = "default_floor")]
    pub floor: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            floor: default_floor(),
        }
    }
}

fn default_prefix() -> String {
    "INV".to_string()
}

fn default_floor() -> u32 {
    1000
}

/// Header block printed on every invoice.
#[derive(Deserialize, Clone, Debug)]
pub struct BusinessSettings {
    pub brand: String,
    pub tax_id: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ExportSettings {
    /// Supersampling factor applied when rasterizing the preview.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

fn default_scale() -> f32 {
    2.5
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint, e.g. `http://tempo:4317`. Traces are not exported when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let directory = configuration_directory("invoice-desk")?;
    load_settings(&directory)
}
