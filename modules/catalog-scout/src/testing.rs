// Test mocks for the review stage.
//
// MockReviewSource (ReviewSource): HashMap-based (product, page) → page,
// with per-page failures and panics for exercising the orchestrator's
// isolation. Plus fixture helpers for raw reviews and pages.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use tokopedia_client::{RawReview, ReviewListPage};

use crate::reviews::ReviewSource;

// ---------------------------------------------------------------------------
// MockReviewSource
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered pages.
/// Builder pattern: `.on_page()`, `.fail_on()`, `.panic_on()`.
#[derive(Default)]
pub struct MockReviewSource {
    pages: HashMap<(String, u32), ReviewListPage>,
    failures: HashSet<(String, u32)>,
    panics: HashSet<String>,
    calls: Mutex<Vec<(String, u32, u32)>>,
}

impl MockReviewSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_page(mut self, product_id: &str, page: u32, result: ReviewListPage) -> Self {
        self.pages.insert((product_id.to_string(), page), result);
        self
    }

    pub fn fail_on(mut self, product_id: &str, page: u32) -> Self {
        self.failures.insert((product_id.to_string(), page));
        self
    }

    /// Panic on any request for this product.
    pub fn panic_on(mut self, product_id: &str) -> Self {
        self.panics.insert(product_id.to_string());
        self
    }

    /// Every `(product_id, page, limit)` requested so far, in call order.
    pub fn calls(&self) -> Vec<(String, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn review_page(&self, product_id: &str, page: u32, limit: u32) -> Result<ReviewListPage> {
        self.calls
            .lock()
            .unwrap()
            .push((product_id.to_string(), page, limit));

        if self.panics.contains(product_id) {
            panic!("MockReviewSource: panic registered for {product_id}");
        }

        let key = (product_id.to_string(), page);
        if self.failures.contains(&key) {
            bail!("MockReviewSource: failure registered for {product_id} page {page}");
        }
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockReviewSource: no page {page} registered for {product_id}"))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A raw review with only an id and message; every nested object absent.
pub fn raw_review(id: &str) -> RawReview {
    RawReview {
        id: id.to_string(),
        message: format!("review {id}"),
        ..Default::default()
    }
}

pub fn review_page(list: Vec<RawReview>, has_next: bool) -> ReviewListPage {
    ReviewListPage {
        total_reviews: list.len() as i64,
        list,
        has_next,
        ..Default::default()
    }
}

/// A single-page, single-review result for `product_id`.
pub fn single_review_source(product_ids: &[&str]) -> MockReviewSource {
    product_ids.iter().fold(MockReviewSource::new(), |source, id| {
        source.on_page(id, 1, review_page(vec![raw_review(&format!("{id}-r1"))], false))
    })
}
