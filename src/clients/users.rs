use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;

/// Lookup of the target user's identity by email. A miss (or an outage) is
/// tolerated by the pipeline, which proceeds without a user reference.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

pub struct UserServiceClient {
    http_client: Client,
    base_url: String,
}

impl UserServiceClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.user_service_url, "User service client initialized");

        Ok(Self {
            http_client,
            base_url: config.user_service_url.clone(),
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
impl UserDirectory for UserServiceClient {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, Error> {
        let url = format!("{}/users/by-email", self.base_url);

        debug!(email, "Looking up user by email");

        let response = self
            .http_client
            .get(&url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| anyhow!("User lookup request failed: {}", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user: UserRecord = response
                    .json()
                    .await
                    .map_err(|e| anyhow!("Failed to parse user JSON: {}", e))?;
                Ok(Some(user))
            }
            status => Err(anyhow!("User service returned status {}", status)),
        }
    }
}
