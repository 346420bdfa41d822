use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid gateway configuration: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
