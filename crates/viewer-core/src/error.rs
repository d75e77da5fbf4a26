//! Error types for layout and navigation.

/// Errors raised by the layout engine and the viewer queries.
///
/// Navigation never raises: out-of-range pages are clamped and a missing
/// document turns navigation into a no-op.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("document has no pages")]
    InvalidPageCount,

    #[error("viewport must have a positive size, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },

    #[error("page {index} is out of range for a document of {page_count} pages")]
    IndexOutOfRange { index: u32, page_count: u32 },

    #[error("no document is set")]
    DocumentUnavailable,
}

/// Result type for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;
