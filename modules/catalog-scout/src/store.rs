//! JSON persistence for product lists.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use catalog_common::Product;

/// Write `products` as a pretty-printed JSON array. An empty list writes
/// nothing and returns 0.
pub fn save_products(path: &Path, products: &[Product]) -> Result<usize> {
    if products.is_empty() {
        info!(path = %path.display(), "No product data to save");
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(products).context("Failed to serialize products")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), products = products.len(), "Saved products");
    Ok(products.len())
}

/// Read a product list written by `save_products`. Every product comes back
/// with a review list, empty when the file had none.
pub fn load_products(path: &Path) -> Result<Vec<Product>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut products: Vec<Product> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse products from {}", path.display()))?;

    for product in &mut products {
        product.reviews.get_or_insert_with(Vec::new);
    }

    info!(path = %path.display(), products = products.len(), "Loaded products");
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_common::{Rating, Review};

    fn product(id: &str) -> Product {
        Product {
            product_id: id.into(),
            category: "dapur|panci".into(),
            name: "Panci Presto Ø24".into(),
            price: "250000".into(),
            ..Default::default()
        }
    }

    #[test]
    fn round_trip_keeps_products() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");

        let mut with_reviews = product("1");
        with_reviews.reviews = Some(vec![Review {
            review_id: "r1".into(),
            rating: Rating::Score(5),
            message: "Mantap".into(),
            ..Default::default()
        }]);
        let products = vec![with_reviews, product("2")];

        assert_eq!(save_products(&path, &products).unwrap(), 2);
        let loaded = load_products(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], products[0]);
        assert_eq!(loaded[1].reviews, Some(vec![]));
        assert_eq!(loaded[1].name, "Panci Presto Ø24");
    }

    #[test]
    fn non_ascii_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        save_products(&path, &[product("1")]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Ø24"));
        assert!(raw.contains("\"reviews\": []"));
    }

    #[test]
    fn empty_list_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        assert_eq!(save_products(&path, &[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/products.json");
        save_products(&path, &[product("1")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn load_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = load_products(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[test]
    fn load_tolerates_sparse_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparse.json");
        fs::write(&path, r#"[{"product_id": "9", "reviews": null}]"#).unwrap();

        let loaded = load_products(&path).unwrap();
        assert_eq!(loaded[0].product_id, "9");
        assert_eq!(loaded[0].category, "");
        assert_eq!(loaded[0].reviews, Some(vec![]));
    }

    #[test]
    fn load_accepts_numeric_ids_and_string_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(
            &path,
            r#"[{"product_id": "1001", "shop_id": 55, "warehouse_id": 7001,
                 "rating_average": "4.9", "reviews": [{"review_id": 3, "rating": 5}]}]"#,
        )
        .unwrap();

        let loaded = load_products(&path).unwrap();
        assert_eq!(loaded[0].shop_id.as_deref(), Some("55"));
        assert_eq!(loaded[0].warehouse_id.as_deref(), Some("7001"));
        assert_eq!(loaded[0].rating_average, 4.9);
        assert_eq!(loaded[0].review_count(), 1);
        assert_eq!(loaded[0].reviews.as_ref().unwrap()[0].review_id, "3");
    }
}
