use std::time::Duration;

use async_std::task::{sleep, spawn};
use futures::future::join_all;

use retry_executor::asynchronous::{retry, retry_with_cancellation};
use retry_executor::cancellation::CancellationToken;
use retry_executor::config::RetryConfig;

use crate::store::{DbError, FlakyStore};

// Example 1: Load a cluster page with the default 3 attempts / 200ms linear backoff
pub async fn example_load_cluster(store: &FlakyStore) {
    let retry_config = RetryConfig::default();

    let result = retry(|| store.participants_in_cluster("North"), &retry_config).await;

    match result {
        Ok(participants) => {
            for participant in participants {
                println!("#{} {}", participant.id, participant.name);
            }
        }
        Err(error) => println!("Failed: {}", error),
    }
}

// Example 2: Idempotent upsert, retried only on connection-level errors
pub async fn example_upsert_training(store: &FlakyStore) {
    let retry_config = RetryConfig::default()
        .with_max_attempts(5)
        .with_retry_condition(DbError::is_transient);

    let result = retry(|| store.upsert_training("Savings basics", 24), &retry_config).await;

    match result {
        Ok(()) => println!("Training saved ({} rows)", store.training_count()),
        Err(error) => println!("Failed: {}", error),
    }
}

// Example 3: Independent retries running side by side
pub async fn example_dashboard_widgets(store: &FlakyStore) {
    let retry_config = RetryConfig::default().with_delay(Duration::from_millis(50));

    let clusters = ["North", "Lakeside", "Hillside"];
    let loads = clusters
        .iter()
        .map(|cluster| retry(move || store.participants_in_cluster(cluster), &retry_config));

    for (cluster, result) in clusters.iter().zip(join_all(loads).await) {
        match result {
            Ok(participants) => println!("{}: {} participants", cluster, participants.len()),
            Err(error) => println!("{}: failed with {}", cluster, error),
        }
    }
}

// Example 4: The request goes away while the executor is backing off
pub async fn example_cancelled_request() {
    let store = FlakyStore::new(1.0);
    let retry_config = RetryConfig::default().with_delay(Duration::from_secs(2));
    let token = CancellationToken::new();

    let request_scope = token.clone();
    spawn(async move {
        sleep(Duration::from_millis(100)).await;
        request_scope.cancel();
    });

    let result = retry_with_cancellation(
        || store.participants_in_cluster("North"),
        &retry_config,
        &token,
    )
    .await;

    match result {
        Ok(participants) => println!("Loaded {} participants", participants.len()),
        Err(error) if error.is_cancelled() => println!("Request cancelled: {}", error),
        Err(error) => println!("Failed: {}", error),
    }
}
