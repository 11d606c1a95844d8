pub mod error;
pub mod retry;
pub mod types;

pub use error::{Result, TokopediaError};
pub use retry::{RetryPolicy, DEFAULT_RETRY_STATUSES};
pub use types::{
    GraphqlResponse, LikeDislike, RawReview, ReviewListData, ReviewListPage, ReviewResponse,
    ReviewShop, ReviewUser,
};

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use typed_builder::TypedBuilder;

pub const DEFAULT_REVIEW_ENDPOINT: &str = "https://gql.tokopedia.com/graphql/productReviewList";

/// The GraphQL gateway rejects requests without a browser user agent.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone, TypedBuilder)]
pub struct ClientConfig {
    #[builder(default = DEFAULT_REVIEW_ENDPOINT.to_string(), setter(into))]
    pub endpoint: String,
    #[builder(default = Duration::from_secs(20))]
    pub request_timeout: Duration,
    #[builder(default = 50)]
    pub pool_max_idle_per_host: usize,
    #[builder(default)]
    pub retry: RetryPolicy,
    #[builder(default = BROWSER_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Shared client for the review API. Cheap to clone; clones share one
/// connection pool.
#[derive(Clone)]
pub struct TokopediaClient {
    client: reqwest::Client,
    endpoint: String,
    user_agent: String,
    retry: RetryPolicy,
}

impl TokopediaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| TokopediaError::ClientBuild(e.to_string()))?;

        tracing::debug!(
            endpoint = config.endpoint.as_str(),
            retry_total = config.retry.total,
            pool_max_idle = config.pool_max_idle_per_host,
            "TokopediaClient initialized"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint,
            user_agent: config.user_agent,
            retry: config.retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a JSON body to the review endpoint through the retrying transport.
    ///
    /// Returns whatever response the server ended with, including error
    /// statuses once retries are exhausted. Status handling is the caller's job.
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        body: &T,
    ) -> Result<reqwest::Response> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .json(body)
            .build()?;

        retry::execute_with_retry(&self.client, &self.retry, request).await
    }

    /// Fetch one page of a product's reviews.
    ///
    /// An empty response array is treated as an empty final page. A non-2xx
    /// status, a body that is not an array, or a GraphQL error envelope
    /// without data are errors.
    pub async fn product_review_page(
        &self,
        product_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<ReviewListPage> {
        let body = types::review_list_request(product_id, page, limit);
        let resp = self.post_json(&body).await?;

        let status = resp.status();
        tracing::info!(product_id, page, status = status.as_u16(), "Fetched review page");
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TokopediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        parse_review_page(&bytes)
    }
}

/// Decode a raw review-list response body.
pub fn parse_review_page(bytes: &[u8]) -> Result<ReviewListPage> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Array(items) = value else {
        return Err(TokopediaError::Parse(
            "review response is not a JSON array".to_string(),
        ));
    };

    let Some(first) = items.into_iter().next() else {
        return Ok(ReviewListPage::default());
    };

    let envelope: GraphqlResponse<ReviewListData> = serde_json::from_value(first)?;
    match envelope.data.and_then(|d| d.review_list) {
        Some(page) => Ok(page),
        None if !envelope.errors.is_empty() => {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            Err(TokopediaError::Graphql(messages.join("; ")))
        }
        None => Ok(ReviewListPage::default()),
    }
}
