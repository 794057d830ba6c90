use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpaqueError {
    #[error("Unknown attribute '{attribute}' on model {model}")]
    UnknownAttribute { model: String, attribute: String },

    #[error("Model {0} has no primary key attribute")]
    NoPrimaryKey(String),

    #[error("{model} with key {key} was not found")]
    NotFound { model: String, key: String },

    #[error("Model {0} has no adapter")]
    NoAdapter(String),

    #[error("Unknown scope '{scope}' on model {model}")]
    UnknownScope { model: String, scope: String },

    #[error("Expected an attribute row, got: {0}")]
    InvalidRow(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

pub type Result<T> = std::result::Result<T, OpaqueError>;
