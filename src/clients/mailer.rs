use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;

/// Outbound mail transport. The send is synchronous from the pipeline's
/// point of view; implementations are expected to bound it with a timeout.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error>;
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

pub struct MailerClient {
    http_client: Client,
    base_url: String,
}

impl MailerClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.mailer_timeout_seconds))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.mailer_url, "Mailer client initialized");

        Ok(Self {
            http_client,
            base_url: config.mailer_url.clone(),
        })
    }

    pub fn with_base_url(base_url: String) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl MailTransport for MailerClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        debug!(to, "Sending email through mail transport");

        let url = format!("{}/send", self.base_url);
        let request = MailRequest { to, subject, body };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Mail transport request failed: {}", e))?;

        if response.status().is_success() {
            debug!(to, "Email accepted by mail transport");
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Mail transport returned status {}: {}",
                status,
                error_text
            ))
        }
    }
}
