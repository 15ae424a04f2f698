#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use invoice_desk::config::{BillsApiSettings, BusinessSettings, InvoiceSettings};
use invoice_desk::models::{ExportedImage, InvoicePreview};
use invoice_desk::services::{BillsClient, ExportError, InvoiceDesk, PngExporter, PreviewExporter};
use invoice_desk::startup::build_router;
use invoice_desk::AppState;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn bills_settings(server: &MockServer) -> BillsApiSettings {
    BillsApiSettings {
        url: server.uri(),
        timeout_secs: 2,
        api_token: None,
    }
}

pub fn invoice_settings() -> InvoiceSettings {
    InvoiceSettings {
        prefix: "INV".to_string(),
        floor: 1000,
    }
}

pub fn business() -> BusinessSettings {
    BusinessSettings {
        brand: "Hotel Sunrise".to_string(),
        tax_id: "29ABCDE1234F1Z5".to_string(),
        address: vec!["12 MG Road".to_string(), "Bengaluru".to_string()],
        phone: Some("+91 80 1234 5678".to_string()),
    }
}

/// Bill store that already holds INV-1042.
pub async fn mount_bill_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/bills"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "invoiceNumber": "INV-1041" },
            { "invoiceNumber": "INV-1042" }
        ])))
        .mount(server)
        .await;
}

/// Bill store that accepts every bill and echoes its number.
pub async fn mount_save_ok(server: &MockServer, invoice_number: &str) {
    Mock::given(method("POST"))
        .and(path("/api/bills"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "bill": { "invoiceNumber": invoice_number }
        })))
        .mount(server)
        .await;
}

pub async fn spawn_app(server: &MockServer) -> Router {
    let exporter = PngExporter::new(1.0).expect("Failed to build exporter");
    spawn_app_with_exporter(server, Arc::new(exporter)).await
}

pub async fn spawn_app_with_exporter(
    server: &MockServer,
    exporter: Arc<dyn PreviewExporter>,
) -> Router {
    let client = BillsClient::new(bills_settings(server), invoice_settings())
        .expect("Failed to build bills client");
    let desk = InvoiceDesk::start(Arc::new(client), exporter, business(), "INV").await;

    build_router(AppState::new(Arc::new(desk)))
}

/// Fails the first `failures` exports, then rasterizes normally.
pub struct FlakyExporter {
    failures: AtomicUsize,
    inner: PngExporter,
}

impl FlakyExporter {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            inner: PngExporter::new(1.0).expect("Failed to build exporter"),
        }
    }
}

impl PreviewExporter for FlakyExporter {
    fn export(&self, preview: &InvoicePreview) -> Result<ExportedImage, ExportError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ExportError::Aborted("renderer unavailable".to_string()));
        }
        self.inner.export(preview)
    }
}

/// Drives the router like a browser: remembers the session cookie.
pub struct Browser {
    router: Router,
    cookie: Option<String>,
}

pub struct Page {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl Page {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Browser {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> Page {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> Page {
        let body = serde_urlencoded::to_string(form).unwrap();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(pair) = set_cookie.split(';').next() {
                self.cookie = Some(pair.to_string());
            }
        }

        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = response.status();
        let content_type = header_value(header::CONTENT_TYPE);
        let content_disposition = header_value(header::CONTENT_DISPOSITION);
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();

        Page {
            status,
            content_type,
            content_disposition,
            body,
        }
    }
}
