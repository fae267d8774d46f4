mod calculate;
mod interpolate;
mod point;
mod query;
mod sequence;

pub use calculate::CalcParams;
pub use point::TrackPoint;
pub use sequence::Track;
