//! Infrastructure layer: configuration, host adapters and scheduled jobs.

pub mod config;
pub mod host;
pub mod jobs;


pub use config::AcmConfig;
pub use host::{InMemoryInvoiceHost, ProductAccounting};
pub use jobs::{RecurringInvoicingJob, RunReport, SkippedContract};

/// Install logging from the configuration and return the job's run date.
pub fn bootstrap(config: &AcmConfig) -> chrono::NaiveDate {
    acm_observability::init_with(&config.log);
    config.run_date_or(chrono::Local::now().date_naive())
}
