use std::sync::Arc;

use anyhow::{Error, Result};
use futures_util::StreamExt;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::{clients::amqp::AmqpClient, config::Config, pipeline::Pipeline};

/// Consumer loop: one spawned task per message, bounded by
/// `worker_concurrency` permits. Messages are independent units of work;
/// within one message the pipeline steps run sequentially.
///
/// Every message is acknowledged, whatever the processing outcome: permanent
/// event errors are dropped, send failures are recorded on the delivery
/// record. The broker never redelivers; retry is a manual operator action.
pub async fn run_consumer(
    config: &Config,
    amqp: AmqpClient,
    pipeline: Arc<Pipeline>,
) -> Result<(), Error> {
    let mut consumer = amqp.create_consumer().await?;
    let amqp = Arc::new(amqp);
    let semaphore = Arc::new(Semaphore::new(config.worker_concurrency));

    info!(
        concurrency = config.worker_concurrency,
        "Consumer loop started"
    );

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(error = %e, "Failed to receive message from queue");
                continue;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);
        let amqp = Arc::clone(&amqp);

        tokio::spawn(async move {
            let _permit = permit;

            match pipeline.process(&delivery.data).await {
                Ok(outcome) => {
                    info!(notification_id = %outcome.notification_id, "Message processed");
                }
                Err(e) => {
                    warn!(error = %e, "Event dropped");
                }
            }

            if let Err(e) = amqp.acknowledge(delivery.delivery_tag).await {
                warn!(error = %e, "Failed to acknowledge message");
            }
        });
    }

    Ok(())
}
