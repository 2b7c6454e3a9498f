//! Contact-form relay.
//!
//! Submissions are forwarded as multipart form data to a third-party
//! form relay. The relay's answer is binary: any 2xx is success and
//! anything else is a failure. There are no retries.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ContactConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    pub message: String,
    #[serde(default, rename = "productInterest")]
    pub product_interest: String,
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("invalid submission: {0}")]
    Invalid(&'static str),
    #[error("relay request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("relay rejected the submission with HTTP {0}")]
    Rejected(u16),
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::Invalid("name must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(ContactError::Invalid("email must be an address"));
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::Invalid("message must not be empty"));
        }
        Ok(())
    }

    /// The non-empty submission fields, in form order, under their wire names.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("mobile", &self.mobile),
            ("message", &self.message),
            ("productInterest", &self.product_interest),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect()
    }
}

pub struct ContactRelay {
    endpoint: String,
    subject: String,
    client: reqwest::Client,
}

impl ContactRelay {
    pub fn new(config: &ContactConfig) -> Result<Self, ContactError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            subject: config.subject.clone(),
            client,
        })
    }

    /// Form fields as sent: the submission plus the relay's control fields.
    pub fn form_fields(&self, submission: &ContactSubmission) -> Vec<(&'static str, String)> {
        let mut fields = submission.fields();
        fields.push(("_subject", self.subject.clone()));
        fields.push(("_template", "table".to_string()));
        fields.push(("_captcha", "false".to_string()));
        fields
    }

    pub async fn submit(&self, submission: &ContactSubmission) -> Result<(), ContactError> {
        submission.validate()?;

        let form = self
            .form_fields(submission)
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (key, value)| {
                form.text(key, value)
            });

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "contact relay rejected submission");
            return Err(ContactError::Rejected(status.as_u16()));
        }
        info!("contact submission relayed");
        Ok(())
    }
}
