pub mod batch;
pub mod extractor;
pub mod job;
pub mod reviews;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::{batches, BatchOrchestrator};
pub use extractor::{ProductExtractor, ProductSink};
pub use job::{assign_reviews, ScrapeJob};
pub use reviews::{review_from_raw, ReviewFetcher, ReviewSource};
pub use store::{load_products, save_products};

use catalog_common::Config;
use tokopedia_client::{ClientConfig, RetryPolicy, TokopediaClient};

/// Build the shared review API client from run configuration.
pub fn client_from_config(config: &Config) -> tokopedia_client::Result<TokopediaClient> {
    let retry = RetryPolicy::new(
        config.retry_total,
        config.retry_backoff_factor,
        config.retry_statuses.clone(),
    );
    TokopediaClient::new(
        ClientConfig::builder()
            .endpoint(config.review_endpoint.clone())
            .request_timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .retry(retry)
            .build(),
    )
}
