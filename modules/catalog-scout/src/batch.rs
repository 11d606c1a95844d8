//! Batched review fan-out.
//!
//! Keys are processed in fixed-size batches. Within a batch each key runs on
//! its own tokio task, at most `max_workers` at a time. Batches run strictly
//! one after another with a fixed pause in between.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use catalog_common::{Config, Review};

use crate::reviews::ReviewFetcher;

/// Split `keys` into consecutive chunks of `size` (minimum 1), order kept.
pub fn batches<T>(keys: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    keys.chunks(size.max(1))
}

pub struct BatchOrchestrator {
    fetcher: ReviewFetcher,
    batch_size: usize,
    max_workers: usize,
    after_batch_delay: Duration,
}

impl BatchOrchestrator {
    pub fn new(fetcher: ReviewFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            batch_size: config.batch_size.max(1),
            max_workers: config.max_workers.max(1),
            after_batch_delay: config.after_batch_delay,
        }
    }

    /// Fetch reviews for every key. The returned map has exactly one entry per
    /// input key; keys whose fetch failed outright map to an empty list.
    pub async fn run(&self, keys: &[String]) -> HashMap<String, Vec<Review>> {
        let mut all_reviews = HashMap::with_capacity(keys.len());
        let total_batches = keys.len().div_ceil(self.batch_size);

        info!(
            keys = keys.len(),
            batch_size = self.batch_size,
            batches = total_batches,
            "Fetching reviews"
        );

        for (index, batch) in batches(keys, self.batch_size).enumerate() {
            let batch_reviews = self.run_batch(batch).await;
            let fetched: usize = batch_reviews.values().map(Vec::len).sum();
            all_reviews.extend(batch_reviews);

            info!(
                batch = index + 1,
                of = total_batches,
                keys = batch.len(),
                reviews = fetched,
                "Processed review batch"
            );

            if index + 1 < total_batches && !self.after_batch_delay.is_zero() {
                tokio::time::sleep(self.after_batch_delay).await;
            }
        }

        all_reviews
    }

    async fn run_batch(&self, batch: &[String]) -> HashMap<String, Vec<Review>> {
        let tasks = batch.iter().cloned().map(|key| {
            let fetcher = self.fetcher.clone();
            async move {
                let handle = {
                    let key = key.clone();
                    tokio::spawn(async move { fetcher.fetch_reviews(&key).await })
                };
                (key, handle.await)
            }
        });

        let mut results = HashMap::with_capacity(batch.len());
        let mut completed = stream::iter(tasks).buffer_unordered(self.max_workers);
        while let Some((key, outcome)) = completed.next().await {
            let reviews = match outcome {
                Ok(reviews) => {
                    if reviews.is_empty() {
                        warn!(product_id = key.as_str(), "No reviews fetched");
                    }
                    reviews
                }
                Err(e) => {
                    error!(product_id = key.as_str(), error = %e, "Review task failed");
                    Vec::new()
                }
            };
            results.insert(key, reviews);
        }
        results
    }
}
