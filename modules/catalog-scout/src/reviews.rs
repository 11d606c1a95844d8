//! Per-product review pagination.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use catalog_common::{Rating, Review};
use tokopedia_client::{RawReview, ReviewListPage, TokopediaClient};

// ---------------------------------------------------------------------------
// ReviewSource
// ---------------------------------------------------------------------------

/// One page of reviews for one product. `TokopediaClient` is the production
/// implementation; tests use `testing::MockReviewSource`.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn review_page(&self, product_id: &str, page: u32, limit: u32) -> Result<ReviewListPage>;
}

#[async_trait]
impl ReviewSource for TokopediaClient {
    async fn review_page(&self, product_id: &str, page: u32, limit: u32) -> Result<ReviewListPage> {
        Ok(self.product_review_page(product_id, page, limit).await?)
    }
}

// ---------------------------------------------------------------------------
// Canonical mapping
// ---------------------------------------------------------------------------

pub fn review_from_raw(raw: RawReview) -> Review {
    Review {
        review_id: raw.id,
        variant_name: raw.variant_name,
        message: raw.message,
        rating: Rating::from(&raw.product_rating),
        review_time: raw.review_create_time,
        review_timestamp: raw.review_create_timestamp,
        review_response: raw.review_response.map(|r| r.message).unwrap_or_default(),
        like_dislike: raw.like_dislike.map_or(0, |l| l.total_like),
        bad_rating_reason: raw.bad_rating_reason_fmt,
    }
}

// ---------------------------------------------------------------------------
// ReviewFetcher
// ---------------------------------------------------------------------------

/// Walks a product's review pages until the server reports no next page.
///
/// Never fails: any error on a page ends the walk for that product and the
/// reviews gathered up to that point are returned.
#[derive(Clone)]
pub struct ReviewFetcher {
    source: Arc<dyn ReviewSource>,
    page_size: u32,
    max_pages: Option<u32>,
}

impl ReviewFetcher {
    pub fn new(source: Arc<dyn ReviewSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            max_pages: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub async fn fetch_reviews(&self, product_id: &str) -> Vec<Review> {
        let mut reviews = Vec::new();
        let mut page = 1u32;

        loop {
            let result = match self
                .source
                .review_page(product_id, page, self.page_size)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(product_id, page, error = %e, "Review page failed, keeping partial result");
                    break;
                }
            };

            let has_next = result.has_next;
            let total_reviews = result.total_reviews;
            reviews.extend(result.list.into_iter().map(review_from_raw));

            if !has_next {
                info!(
                    product_id,
                    pages = page,
                    fetched = reviews.len(),
                    total_reviews,
                    "No more review pages"
                );
                break;
            }
            if self.max_pages.is_some_and(|max| page >= max) {
                warn!(product_id, pages = page, "Review page cap reached before last page");
                break;
            }
            page += 1;
        }

        reviews
    }
}
