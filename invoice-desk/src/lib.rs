pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use services::InvoiceDesk;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<InvoiceDesk>,
}

impl AppState {
    pub fn new(desk: Arc<InvoiceDesk>) -> Self {
        Self { desk }
    }
}
