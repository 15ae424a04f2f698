pub mod app;
pub mod draft;
pub mod invoice;
pub mod metrics;
