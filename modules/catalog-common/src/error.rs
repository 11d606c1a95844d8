use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The discovery producer handed over no payload at all. This is a
    /// contract violation by the caller, not a data-quality problem.
    #[error("Discovery payload is missing")]
    MissingPayload,
}
