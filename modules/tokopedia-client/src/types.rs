use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Outbound GraphQL operation ---

pub const REVIEW_LIST_OPERATION: &str = "productReviewList";

/// Sort order the storefront uses for its own review tab.
pub const REVIEW_SORT_NEWEST: &str = "create_time desc";

pub const REVIEW_LIST_QUERY: &str = r#"
    query productReviewList($productID: String!, $page: Int!, $limit: Int!, $sortBy: String, $filterBy: String) {
      productrevGetProductReviewList(productID: $productID, page: $page, limit: $limit, sortBy: $sortBy, filterBy: $filterBy) {
        productID
        list {
          id: feedbackID
          variantName
          message
          productRating
          reviewCreateTime
          reviewCreateTimestamp
          isReportable
          isAnonymous
          imageAttachments { attachmentID imageThumbnailUrl imageUrl __typename }
          videoAttachments { attachmentID videoUrl __typename }
          reviewResponse { message createTime __typename }
          user { userID fullName image url __typename }
          likeDislike { totalLike likeStatus __typename }
          stats { key formatted count __typename }
          badRatingReasonFmt
          __typename
        }
        shop { shopID name url image __typename }
        hasNext
        totalReviews
        __typename
      }
    }
    "#;

/// One entry of the batched GraphQL request body. The endpoint takes a JSON
/// array of these even when only one operation is sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlOperation<V> {
    pub operation_name: &'static str,
    pub variables: V,
    pub query: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewListVariables {
    #[serde(rename = "productID")]
    pub product_id: String,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "sortBy")]
    pub sort_by: String,
    #[serde(rename = "filterBy")]
    pub filter_by: String,
}

impl ReviewListVariables {
    pub fn new(product_id: &str, page: u32, limit: u32) -> Self {
        Self {
            product_id: product_id.to_string(),
            page,
            limit,
            sort_by: REVIEW_SORT_NEWEST.to_string(),
            filter_by: String::new(),
        }
    }
}

/// Build the request body for one page of a product's reviews.
pub fn review_list_request(
    product_id: &str,
    page: u32,
    limit: u32,
) -> Vec<GraphqlOperation<ReviewListVariables>> {
    vec![GraphqlOperation {
        operation_name: REVIEW_LIST_OPERATION,
        variables: ReviewListVariables::new(product_id, page, limit),
        query: REVIEW_LIST_QUERY,
    }]
}

// --- Inbound envelope ---

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphqlErrorMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewListData {
    #[serde(rename = "productrevGetProductReviewList", default)]
    pub review_list: Option<ReviewListPage>,
}

/// A single page of `productrevGetProductReviewList`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListPage {
    #[serde(rename = "productID", default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub list: Vec<RawReview>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub shop: Option<ReviewShop>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_next: bool,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_reviews: i64,
}

/// A review as the API returns it. Every nested object may be null or
/// missing depending on the review, so nothing here is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub variant_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default)]
    pub product_rating: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub review_create_time: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub review_create_timestamp: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_reportable: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_anonymous: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub image_attachments: Vec<ImageAttachment>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub video_attachments: Vec<VideoAttachment>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub review_response: Option<ReviewResponse>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub user: Option<ReviewUser>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub like_dislike: Option<LikeDislike>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub stats: Vec<ReviewStat>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bad_rating_reason_fmt: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub create_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDislike {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_like: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub like_status: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUser {
    #[serde(rename = "userID", default, deserialize_with = "lenient_string")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    #[serde(rename = "attachmentID", default, deserialize_with = "lenient_string")]
    pub attachment_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_thumbnail_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAttachment {
    #[serde(rename = "attachmentID", default, deserialize_with = "lenient_string")]
    pub attachment_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub video_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewStat {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub formatted: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewShop {
    #[serde(rename = "shopID", default, deserialize_with = "lenient_string")]
    pub shop_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
}

// --- Lenient field decoders ---
//
// None of these decoders fail. A value of the wrong shape decodes as the
// field's default.

/// Strings as-is, numbers and booleans as their text, anything else empty.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or_default())
}

/// Counts and timestamps are integers, numeric strings, or null.
fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// A nested object, or `None` when it is missing, null, or not an object.
fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Decode each array entry on its own, dropping entries that don't decode so
/// one bad element never costs its siblings.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping undecodable list entry");
                None
            }
        })
        .collect())
}
