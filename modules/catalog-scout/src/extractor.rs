//! Discovery payload → canonical `Product` records.
//!
//! The discovery payload is an array of component blocks. Products live at
//! `data.componentInfo.data.component.data` inside each block. Anything that
//! doesn't match that shape is skipped, and individual product fields fall
//! back to defaults instead of rejecting the record.

use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use catalog_common::{normalize_category, normalize_price, CatalogError, Product};

// ---------------------------------------------------------------------------
// ProductSink
// ---------------------------------------------------------------------------

/// Receives products as the extractor produces them, in document order.
pub trait ProductSink {
    fn accept(&mut self, product: Product);
}

impl ProductSink for Vec<Product> {
    fn accept(&mut self, product: Product) {
        self.push(product);
    }
}

impl<F> ProductSink for F
where
    F: FnMut(Product),
{
    fn accept(&mut self, product: Product) {
        self(product)
    }
}

impl ProductSink for UnboundedSender<Product> {
    fn accept(&mut self, product: Product) {
        if self.send(product).is_err() {
            debug!("Product receiver dropped, discarding product");
        }
    }
}

// ---------------------------------------------------------------------------
// ProductExtractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductExtractor;

impl ProductExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Push every product found in `payload` into `sink`. Returns the count.
    ///
    /// Only an absent or null payload is an error.
    pub fn extract<S>(&self, payload: Option<&Value>, sink: &mut S) -> Result<usize, CatalogError>
    where
        S: ProductSink + ?Sized,
    {
        let payload = match payload {
            None | Some(Value::Null) => return Err(CatalogError::MissingPayload),
            Some(payload) => payload,
        };

        let Some(components) = payload.as_array() else {
            warn!("Discovery payload is not an array, nothing to extract");
            return Ok(0);
        };

        let mut emitted = 0;
        for (index, component) in components.iter().enumerate() {
            let Some(raw_products) = component_products(component) else {
                debug!(component = index, "Component has no product list, skipping");
                continue;
            };
            for raw in raw_products.iter().filter_map(Value::as_object) {
                sink.accept(product_from_raw(raw));
                emitted += 1;
            }
        }

        debug!(components = components.len(), products = emitted, "Extracted products");
        Ok(emitted)
    }
}

fn component_products(component: &Value) -> Option<&Vec<Value>> {
    component
        .get("data")?
        .get("componentInfo")?
        .get("data")?
        .get("component")?
        .get("data")?
        .as_array()
}

/// Build a product from one raw discovery record, defaulting every field the
/// record lacks or carries in an unexpected shape.
pub fn product_from_raw(raw: &Map<String, Value>) -> Product {
    Product {
        product_id: id_field(raw, "product_id").unwrap_or_default(),
        category: normalize_category(&text_field(raw, "source_module").unwrap_or_default()),
        name: text_field(raw, "name").unwrap_or_default(),
        count_sold: int_field(raw, "count_sold"),
        discounted_price: normalize_price(text_field(raw, "discounted_price").as_deref()),
        preorder: bool_field(raw, "preorder"),
        price: normalize_price(text_field(raw, "price").as_deref()).unwrap_or_default(),
        stock: int_field(raw, "stock"),
        gold_merchant: bool_field(raw, "gold_merchant"),
        is_official: bool_field(raw, "is_official"),
        is_topads: bool_field(raw, "is_topads"),
        rating_average: float_field(raw, "rating_average"),
        shop_id: id_field(raw, "shop_id"),
        shop_location: text_field(raw, "shop_location").unwrap_or_default(),
        warehouse_id: id_field(raw, "warehouse_id"),
        url: text_field(raw, "url_desktop").unwrap_or_default(),
        reviews: None,
    }
}

// --- Lenient field readers ---

fn text_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ids arrive as strings or numbers; an empty string counts as absent.
fn id_field(raw: &Map<String, Value>, key: &str) -> Option<String> {
    text_field(raw, key).filter(|id| !id.is_empty())
}

fn int_field(raw: &Map<String, Value>, key: &str) -> i64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn float_field(raw: &Map<String, Value>, key: &str) -> f64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn bool_field(raw: &Map<String, Value>, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(products: Value) -> Value {
        json!([{
            "data": { "componentInfo": { "data": { "component": { "data": products } } } }
        }])
    }

    #[test]
    fn null_payload_is_precondition_error() {
        let mut sink = Vec::new();
        let err = ProductExtractor::new().extract(None, &mut sink).unwrap_err();
        assert!(matches!(err, CatalogError::MissingPayload));

        let err = ProductExtractor::new()
            .extract(Some(&Value::Null), &mut sink)
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingPayload));
    }

    #[test]
    fn full_record_is_normalized() {
        let doc = payload(json!([{
            "product_id": 1234567,
            "source_module": "clp_electronics_12345_outer_smartphones_123456",
            "name": "Phone X",
            "count_sold": 150,
            "discounted_price": "Rp1.250.000",
            "preorder": false,
            "price": "Rp1.500.000",
            "stock": 12,
            "gold_merchant": true,
            "is_official": true,
            "is_topads": false,
            "rating_average": "4.8",
            "shop_id": 998,
            "shop_location": "Jakarta Barat",
            "warehouse_id": "w-1",
            "url_desktop": "https://www.tokopedia.com/shop/phone-x"
        }]));

        let mut products = Vec::new();
        let count = ProductExtractor::new().extract(Some(&doc), &mut products).unwrap();
        assert_eq!(count, 1);

        let p = &products[0];
        assert_eq!(p.product_id, "1234567");
        assert_eq!(p.category, "electronics|smartphones");
        assert_eq!(p.discounted_price.as_deref(), Some("1250000"));
        assert_eq!(p.price, "1500000");
        assert_eq!(p.count_sold, 150);
        assert_eq!(p.stock, 12);
        assert!(p.gold_merchant && p.is_official && !p.is_topads);
        assert_eq!(p.rating_average, 4.8);
        assert_eq!(p.shop_id.as_deref(), Some("998"));
        assert_eq!(p.warehouse_id.as_deref(), Some("w-1"));
        assert_eq!(p.url, "https://www.tokopedia.com/shop/phone-x");
        assert!(p.reviews.is_none());
    }

    #[test]
    fn sparse_record_gets_defaults() {
        let doc = payload(json!([{ "name": "Buku" }]));
        let mut products = Vec::new();
        ProductExtractor::new().extract(Some(&doc), &mut products).unwrap();

        let p = &products[0];
        assert_eq!(p.product_id, "");
        assert_eq!(p.category, "|");
        assert_eq!(p.price, "");
        assert_eq!(p.discounted_price, None);
        assert_eq!(p.rating_average, 0.0);
        assert_eq!(p.shop_id, None);
        assert_eq!(p.url, "");
    }

    #[test]
    fn malformed_components_are_skipped() {
        let doc = json!([
            { "data": null },
            { "data": { "componentInfo": { "data": { "component": { "data": "oops" } } } } },
            "not an object",
            { "data": { "componentInfo": { "data": { "component": { "data": [
                { "product_id": "a" }, 7, { "product_id": "b" }
            ] } } } } }
        ]);
        let mut products = Vec::new();
        let count = ProductExtractor::new().extract(Some(&doc), &mut products).unwrap();
        assert_eq!(count, 2);
        let ids: Vec<&str> = products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn non_array_payload_yields_nothing() {
        let mut products = Vec::new();
        let count = ProductExtractor::new()
            .extract(Some(&json!({ "data": {} })), &mut products)
            .unwrap();
        assert_eq!(count, 0);
        assert!(products.is_empty());
    }

    #[test]
    fn closure_sink_sees_document_order() {
        let doc = payload(json!([{ "product_id": "1" }, { "product_id": "2" }, { "product_id": "3" }]));
        let mut seen = Vec::new();
        let mut sink = |p: Product| seen.push(p.product_id);
        ProductExtractor::new().extract(Some(&doc), &mut sink).unwrap();
        assert_eq!(seen, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn channel_sink_streams_products() {
        let doc = payload(json!([{ "product_id": "x" }, { "product_id": "y" }]));
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        ProductExtractor::new().extract(Some(&doc), &mut tx).unwrap();
        drop(tx);

        let mut ids = Vec::new();
        while let Some(product) = rx.recv().await {
            ids.push(product.product_id);
        }
        assert_eq!(ids, vec!["x", "y"]);
    }
}
