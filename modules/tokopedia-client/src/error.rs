use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokopediaError>;

#[derive(Debug, Error)]
pub enum TokopediaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Client build error: {0}")]
    ClientBuild(String),

    #[error("Request body cannot be replayed for retry")]
    UnclonableRequest,
}

impl From<reqwest::Error> for TokopediaError {
    fn from(err: reqwest::Error) -> Self {
        TokopediaError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TokopediaError {
    fn from(err: serde_json::Error) -> Self {
        TokopediaError::Parse(err.to_string())
    }
}
