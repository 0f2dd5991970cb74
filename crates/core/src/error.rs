//! Domain error taxonomy shared by the pipeline stages.

/// Domain-level error for pipeline operations.
///
/// The HTTP layer maps these onto status codes (`Unauthorized` → 403,
/// `Validation` → 400, everything else → 500). Internal stages
/// propagate them unchanged so the invoking platform can decide on
/// retry / redelivery.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The caller's access token did not match the configured secret.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed (missing or undecodable fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Raster data could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
