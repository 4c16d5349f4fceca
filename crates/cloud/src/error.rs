use beatstore_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Cloud configuration error: {0}")]
    Config(String),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Media CDN error: {0}")]
    Media(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
