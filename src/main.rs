use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use notification_service::{
    api::{self, AppState},
    clients::{amqp::AmqpClient, health::HealthChecker, mailer::MailerClient, users::UserServiceClient},
    config::Config,
    consumer,
    pipeline::Pipeline,
    store::postgres::{
        self, PgEmailDeliveryStore, PgInAppDeliveryStore, PgNotificationStore, PgTemplateStore,
    },
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pool = postgres::connect(&config.database_url).await?;
    postgres::run_migrations(&pool).await?;

    let templates = Arc::new(PgTemplateStore::new(pool.clone()));
    let notifications = Arc::new(PgNotificationStore::new(pool.clone()));
    let email_deliveries = Arc::new(PgEmailDeliveryStore::new(pool.clone()));
    let in_app_deliveries = Arc::new(PgInAppDeliveryStore::new(pool.clone()));

    let mailer = Arc::new(MailerClient::new(&config)?);
    let users = Arc::new(UserServiceClient::new(&config)?);

    let pipeline = Arc::new(Pipeline::new(
        templates.clone(),
        notifications,
        email_deliveries.clone(),
        in_app_deliveries.clone(),
        mailer,
        users,
    ));

    let amqp = AmqpClient::connect(&config).await?;

    let state = Arc::new(AppState {
        templates,
        email_deliveries,
        in_app_deliveries,
        pipeline: pipeline.clone(),
        health_checker: HealthChecker::new(config.clone(), pool),
    });

    info!("Notification service starting");

    tokio::select! {
        result = consumer::run_consumer(&config, amqp, pipeline) => {
            result.map_err(|e| anyhow!("Consumer terminated: {}", e))
        }
        result = api::run_api_server(&config, state) => {
            result.map_err(|e| anyhow!("API server terminated: {}", e))
        }
    }
}
