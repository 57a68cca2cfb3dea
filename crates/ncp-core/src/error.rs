use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid format type: {0} (expected 4, 5, 6 or 7)")]
    InvalidFormatType(u8),

    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("unknown admin level: {0}")]
    UnknownAdminLevel(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid uuid: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
