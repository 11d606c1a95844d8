use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// --- Product ---

/// A catalog entry as discovered on a category page.
///
/// Built once by the extractor. The only later mutation is attaching
/// `reviews`, which stays `None` until the review stage has run.
///
/// Loading is lenient: ids may be numbers, numeric fields may be strings,
/// and a field of the wrong shape loads as its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(deserialize_with = "lenient_string")]
    pub product_id: String,
    /// Always `"major|minor"`.
    #[serde(deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub count_sold: i64,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub discounted_price: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub preorder: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub stock: i64,
    #[serde(deserialize_with = "lenient_bool")]
    pub gold_merchant: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_official: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_topads: bool,
    #[serde(deserialize_with = "lenient_f64")]
    pub rating_average: f64,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub shop_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub shop_location: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub warehouse_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(serialize_with = "reviews_or_empty", deserialize_with = "lenient_reviews")]
    pub reviews: Option<Vec<Review>>,
}

impl Product {
    pub fn review_count(&self) -> usize {
        self.reviews.as_ref().map_or(0, Vec::len)
    }
}

fn reviews_or_empty<S>(reviews: &Option<Vec<Review>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match reviews {
        Some(list) => list.serialize(serializer),
        None => Vec::<Review>::new().serialize(serializer),
    }
}

// --- Review ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    #[serde(deserialize_with = "lenient_string")]
    pub review_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub variant_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub message: String,
    pub rating: Rating,
    #[serde(deserialize_with = "lenient_string")]
    pub review_time: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub review_timestamp: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub review_response: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub like_dislike: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub bad_rating_reason: String,
}

/// Star rating when the API sends a number, otherwise whatever label it sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rating {
    Score(i64),
    Label(String),
}

impl Default for Rating {
    fn default() -> Self {
        Rating::Label(String::new())
    }
}

impl From<&Value> for Rating {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(score) => Rating::Score(score),
                None => Rating::Label(n.to_string()),
            },
            Value::String(s) => Rating::Label(s.clone()),
            Value::Null => Rating::default(),
            other => Rating::Label(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Rating::from(&Value::deserialize(deserializer)?))
    }
}

// --- Lenient field decoders ---

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Strings as-is and numbers as their text; anything else is absent.
fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or_default())
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// Review entries that aren't objects are dropped; the rest load field by field.
fn lenient_reviews<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Review>>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_reviews_serialize_as_empty_array() {
        let product = Product {
            product_id: "1".into(),
            category: "buku|novel".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["reviews"], json!([]));
        assert_eq!(value["discounted_price"], json!(null));
    }

    #[test]
    fn missing_fields_default_on_load() {
        let product: Product = serde_json::from_value(json!({
            "product_id": "42",
            "name": "Kopi"
        }))
        .unwrap();
        assert_eq!(product.product_id, "42");
        assert_eq!(product.stock, 0);
        assert!(!product.is_official);
        assert!(product.reviews.is_none());
    }

    #[test]
    fn rating_from_wire_values() {
        assert_eq!(Rating::from(&json!(4)), Rating::Score(4));
        assert_eq!(Rating::from(&json!("bagus")), Rating::Label("bagus".into()));
        assert_eq!(Rating::from(&json!(null)), Rating::default());
    }

    #[test]
    fn rating_serializes_untagged() {
        assert_eq!(serde_json::to_value(Rating::Score(5)).unwrap(), json!(5));
        assert_eq!(serde_json::to_value(Rating::default()).unwrap(), json!(""));
    }

    #[test]
    fn loads_numeric_ids_and_string_numbers() {
        let product: Product = serde_json::from_value(json!({
            "product_id": 1001,
            "count_sold": "320",
            "rating_average": "4.9",
            "shop_id": 55,
            "warehouse_id": 7001,
            "discounted_price": null,
            "preorder": "no",
            "reviews": [
                { "review_id": 9, "rating": 4.5, "review_timestamp": "1700000000", "like_dislike": null },
                "garbage"
            ]
        }))
        .unwrap();

        assert_eq!(product.product_id, "1001");
        assert_eq!(product.count_sold, 320);
        assert_eq!(product.rating_average, 4.9);
        assert_eq!(product.shop_id.as_deref(), Some("55"));
        assert_eq!(product.warehouse_id.as_deref(), Some("7001"));
        assert_eq!(product.discounted_price, None);
        assert!(!product.preorder);

        let reviews = product.reviews.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_id, "9");
        assert_eq!(reviews[0].rating, Rating::Label("4.5".into()));
        assert_eq!(reviews[0].review_timestamp, 1_700_000_000);
        assert_eq!(reviews[0].like_dislike, 0);
    }

    #[test]
    fn saved_product_loads_back_unchanged() {
        let product = Product {
            product_id: "7".into(),
            discounted_price: Some("149000".into()),
            rating_average: 4.5,
            shop_id: Some("55".into()),
            reviews: Some(vec![Review {
                review_id: "r1".into(),
                rating: Rating::Score(5),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(serde_json::from_value::<Product>(value).unwrap(), product);
    }
}
