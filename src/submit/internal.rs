//! Internal HTTP client implementation for submissions

use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client as HttpClient;
use std::path::Path;
use std::thread;

use super::SubmissionSettings;
use crate::error::{Result, SweepError};

/// Evaluation service client
pub struct Client {
    settings: SubmissionSettings,
    http: HttpClient,
}

impl Client {
    pub fn new(settings: SubmissionSettings) -> Result<Self> {
        if settings.url.trim().is_empty() {
            return Err(SweepError::Config("service url is not set".to_string()));
        }

        let http = HttpClient::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SweepError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Submit with up to `retries` extra attempts on upload failures
    pub fn submit_with_retry(&self, file: &Path) -> Result<String> {
        let attempts = self.settings.retries + 1;
        let mut attempt = 1;
        loop {
            match self.submit_once(file) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let wait = self.settings.retry_backoff * attempt;
                    tracing::warn!(
                        file = %file.display(),
                        attempt,
                        error = %e,
                        "upload failed, retrying in {}ms",
                        wait.as_millis()
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn submit_once(&self, file: &Path) -> Result<String> {
        let form = Form::new()
            .text("logtype", self.settings.log_type.clone())
            .text("hwid", self.settings.homework_id.clone())
            .file("infile", file)
            .map_err(|e| SweepError::io(file, e))?;

        tracing::debug!(url = %self.settings.url, file = %file.display(), "submitting");
        let response = self
            .http
            .post(&self.settings.url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .multipart(form)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SweepError::Upload(format!(
                "{} returned {}: {}",
                self.settings.url,
                status,
                body.trim()
            )));
        }

        response.text().map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> SweepError {
        if e.is_timeout() {
            SweepError::Timeout {
                operation: format!("upload to {}", self.settings.url),
                after: self.settings.timeout,
            }
        } else {
            SweepError::Upload(format!("{}: {}", self.settings.url, e))
        }
    }
}
