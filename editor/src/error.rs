use thiserror::Error;

/// Failure taxonomy for the editor: validation first, then codec,
/// transport and remote errors. Remote calls are never retried here;
/// callers surface the message and move on.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Selection area is too small. Please select a larger area.")]
    SelectionTooSmall,

    #[error("Region is outside the canvas")]
    RegionOutOfBounds,

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid slide data: {0}")]
    InvalidSlideData(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },
}

impl EditorError {
    /// Status code of the remote failure, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            EditorError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
