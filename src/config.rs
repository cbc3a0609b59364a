use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub amqp_url: String,
    pub event_queue_name: String,
    pub prefetch_count: u16,
    pub worker_concurrency: usize,

    pub database_url: String,

    pub user_service_url: String,

    pub mailer_url: String,
    pub mailer_timeout_seconds: u64,

    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }
}
