pub mod error;
pub mod math;
pub mod spline;
pub mod track;

pub use error::{Result, TrackError};
pub use spline::{CalcSplines, InterpSplines, Sampling, SplineCoeffs, SplineResult};
pub use track::{CalcParams, Track, TrackPoint};
