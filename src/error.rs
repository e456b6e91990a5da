use thiserror::Error;

/// Result alias for `keygraph`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, community detection, and event assignment.
///
/// Every variant is fatal for the run that produced it: no partial event list is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// `communityDetectAlg` named an algorithm that is not implemented.
    #[error("unsupported community detection algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}
