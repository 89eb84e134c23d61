//! Submission client for the remote evaluation service
//!
//! Uploads a ranking file as `multipart/form-data` with two text fields
//! (`logtype`, `hwid`) and one file field (`infile`), authenticated with
//! HTTP Basic auth. The raw response body is returned untouched; the
//! [`metrics`](crate::metrics) module interprets it.

mod internal;

use std::path::Path;
use std::time::Duration;

use crate::config::SweepConfig;
use crate::error::Result;

pub use internal::Client;

/// Something that evaluates a ranking file and answers with a report body
pub trait Evaluator {
    fn submit(&self, file: &Path) -> Result<String>;
}

impl<T: Evaluator + ?Sized> Evaluator for &T {
    fn submit(&self, file: &Path) -> Result<String> {
        (**self).submit(file)
    }
}

impl Evaluator for Client {
    fn submit(&self, file: &Path) -> Result<String> {
        self.submit_with_retry(file)
    }
}

/// Endpoint, credentials and form values for submissions
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    /// `logtype` form field
    pub log_type: String,
    /// `hwid` form field
    pub homework_id: String,
    pub timeout: Duration,
    /// Extra attempts after an upload failure
    pub retries: u32,
    /// Grows linearly with each attempt
    pub retry_backoff: Duration,
}

impl SubmissionSettings {
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        let (username, password) = config.credentials()?;
        Ok(Self {
            url: config.service_url()?.to_string(),
            username,
            password,
            log_type: config.service.log_type.clone(),
            homework_id: config.service.homework_id.clone(),
            timeout: config.service_timeout(),
            retries: config.service.retries,
            retry_backoff: Duration::from_millis(config.service.retry_backoff_ms),
        })
    }
}

/// Create a client from config
pub fn connect(config: &SweepConfig) -> Result<Client> {
    Client::new(SubmissionSettings::from_config(config)?)
}
