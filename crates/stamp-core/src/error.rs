use thiserror::Error;

/// Message shown whenever the stamping service cannot be reached.
pub const CONNECTIVITY_MESSAGE: &str =
    "Cannot connect to the stamping server. Please make sure the backend is running and try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Display scale must be positive, got {0}")]
    InvalidScale(f64),

    #[error("Please upload a PDF file first.")]
    MissingPdf,

    #[error("Please upload a signature image first.")]
    MissingImage,

    #[error("Please add a signature to the page before stamping.")]
    MissingPlacement,

    #[error("There are no stamped pages to save yet.")]
    EmptyProjection,

    #[error("A stamping request is already in progress.")]
    Busy,

    /// The completed request was issued for another session or an earlier document
    #[error("The document changed while stamping; the result was discarded.")]
    StaleRequest,

    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity(String),

    #[error("Stamping failed ({status}): {message}")]
    Stamp { status: u16, message: String },

    #[error("Stamping did not complete: {0}")]
    Transport(String),
}

impl SessionError {
    /// Whether the user can fix this by supplying a missing input.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SessionError::MissingPdf
                | SessionError::MissingImage
                | SessionError::MissingPlacement
                | SessionError::EmptyProjection
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
