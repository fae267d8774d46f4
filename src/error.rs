use thiserror::Error;

/// Error type for track derivation, spline fitting and track queries.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Size mismatches, too few points, missing boundary headings or
    /// non-positive step sizes.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A zero-length segment where a nonzero length is required.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("{parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The dense linear solve behind spline fitting did not succeed.
    #[error("linear solver failed: {0}")]
    SolverFailure(String),
}

impl TrackError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }
}

/// Convenience type alias for results using [`TrackError`].
pub type Result<T> = std::result::Result<T, TrackError>;
