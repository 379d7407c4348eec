use async_std::task::block_on;

use crate::asynchronous::{
    example_cancelled_request, example_dashboard_widgets, example_load_cluster,
    example_upsert_training,
};
use crate::store::FlakyStore;
use crate::synchronous::{
    example_count_participants, example_exponential_backoff, example_non_retryable_insert,
};

mod asynchronous;
mod store;
mod synchronous;

fn sync_examples(store: &FlakyStore) {
    println!("Running blocking count example:");
    example_count_participants(store);

    println!("\nRunning exponential backoff example:");
    example_exponential_backoff(store);

    println!("\nRunning non-retryable insert example:");
    example_non_retryable_insert(store);
}

async fn async_examples(store: &FlakyStore) {
    println!("\nRunning cluster page example:");
    example_load_cluster(store).await;

    println!("\nRunning idempotent upsert example:");
    example_upsert_training(store).await;

    println!("\nRunning concurrent widgets example:");
    example_dashboard_widgets(store).await;

    println!("\nRunning cancelled request example:");
    example_cancelled_request().await;
}

fn main() {
    let store = FlakyStore::new(0.4);
    sync_examples(&store);
    block_on(async_examples(&store));
}
