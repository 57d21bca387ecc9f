use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacemaskError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("quality must be greater than 0.0 and at most 1.0, got {0}")]
    InvalidQuality(f32),

    #[error("padding must be a finite value >= 0.0, got {0}")]
    InvalidPadding(f32),

    #[error("preview alpha must be between 0.0 and 1.0, got {0}")]
    InvalidAlpha(f32),

    #[error("malformed staging token: {0:?}")]
    InvalidToken(String),

    #[error("staged image {0} has expired or was already confirmed")]
    StagingExpired(String),

    #[error("wrong dashboard password")]
    Unauthorized,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("failed to load face model: {0}")]
    ModelError(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a landmark detection backend.
///
/// The redaction pipeline never propagates this: a failed detection is
/// handled like an image without a face.
#[derive(Debug, Error)]
#[error("landmark detection failed: {0}")]
pub struct DetectError(pub String);
