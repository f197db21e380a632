//! Error types for the session layer.

/// Errors that can occur while managing session state.
///
/// The in-memory session itself can't fail to update; only the durable
/// side (reading/writing the stored token) can.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading, writing, or removing the persisted token failed.
    #[error("token storage failed: {0}")]
    Storage(#[from] std::io::Error),
}
