//! A single ingestion run: discovered products plus the review stage.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use catalog_common::{CatalogError, Config, Product, Review};

use crate::batch::BatchOrchestrator;
use crate::extractor::ProductExtractor;
use crate::reviews::{ReviewFetcher, ReviewSource};

/// URL fragment that identifies the storefront's product discovery query.
const DISCOVERY_QUERY_MARKER: &str = "DiscoveryComponentQuery";

pub struct ScrapeJob {
    config: Config,
    source: Arc<dyn ReviewSource>,
    extractor: ProductExtractor,
    products: Vec<Product>,
}

impl ScrapeJob {
    pub fn new(config: Config, source: Arc<dyn ReviewSource>) -> Self {
        Self {
            config,
            source,
            extractor: ProductExtractor::new(),
            products: Vec::new(),
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    // --- Discovery ---

    /// Response hook for the discovery producer. Only POSTs to the discovery
    /// query are parsed; failures are logged so one bad response can't stop
    /// discovery. Returns the number of products added.
    pub fn handle_discovery_response(&mut self, url: &str, method: &str, body: &[u8]) -> usize {
        if !url.contains(DISCOVERY_QUERY_MARKER) || !method.eq_ignore_ascii_case("POST") {
            return 0;
        }

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(url, error = %e, "Failed to parse discovery response");
                return 0;
            }
        };

        match self.ingest_discovery_payload(&payload) {
            Ok(added) => added,
            Err(e) => {
                error!(url, error = %e, "Failed to extract discovery response");
                0
            }
        }
    }

    pub fn ingest_discovery_payload(&mut self, payload: &Value) -> Result<usize, CatalogError> {
        let added = self.extractor.extract(Some(payload), &mut self.products)?;
        info!(added, total = self.products.len(), "Ingested discovery payload");
        Ok(added)
    }

    /// Non-empty product ids, each once, in the order first seen.
    pub fn unique_product_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .map(|p| p.product_id.as_str())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    // --- Reviews ---

    pub async fn fetch_and_attach_reviews(&mut self) {
        let ids = self.unique_product_ids();
        info!(
            products = self.products.len(),
            unique_ids = ids.len(),
            batch_size = self.config.batch_size,
            "Starting review stage"
        );

        let fetcher = ReviewFetcher::new(self.source.clone(), self.config.review_page_size)
            .with_max_pages(self.config.max_review_pages);
        let orchestrator = BatchOrchestrator::new(fetcher, &self.config);
        let reviews = orchestrator.run(&ids).await;

        assign_reviews(&mut self.products, &reviews);

        let attached: usize = self.products.iter().map(Product::review_count).sum();
        info!(reviews = attached, "Review attachment complete");
    }
}

/// Give each product its reviews from `reviews`; products without an entry
/// get an empty list. Products sharing an id each get their own copy.
pub fn assign_reviews(products: &mut [Product], reviews: &HashMap<String, Vec<Review>>) {
    for product in products {
        product.reviews = Some(reviews.get(&product.product_id).cloned().unwrap_or_default());
    }
}
