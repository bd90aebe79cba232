//! Error types for the inkframe-state crate.

/// Errors from [`ImageBuffer`](crate::ImageBuffer) commits.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    /// The staged frame does not match the display geometry
    #[error("Frame length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors from a [`FramePresenter`](crate::FramePresenter).
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// The display surface rejected or failed to show the frame
    #[error("Display error: {0}")]
    Display(String),

    /// Writing the frame to its destination failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
