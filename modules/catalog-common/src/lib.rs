pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::Config;
pub use error::CatalogError;
pub use normalize::{normalize_category, normalize_price};
pub use types::*;
