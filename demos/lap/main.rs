//! Fits a closed spline through a handful of oval waypoints, resamples it
//! into a track and runs the queries a path follower would use.
//!
//! ```text
//! cargo run --example lap
//! RUST_LOG=trackline=debug cargo run --example lap
//! ```

use std::f64::consts::TAU;

use tracing::info;
use trackline::math::Point2;
use trackline::{CalcSplines, InterpSplines, Result, Sampling};

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for trackline and this demo.
    // Override with RUST_LOG env var (e.g. RUST_LOG=trackline=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("lap=info".parse().unwrap_or_default())
        .add_directive("trackline=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut waypoints: Vec<Point2> = (0..10)
        .map(|i| {
            let a = TAU * f64::from(i) / 10.0;
            Point2::new(40.0 * a.cos(), 15.0 * a.sin())
        })
        .collect();
    waypoints.push(waypoints[0]);

    let fit = CalcSplines::new(waypoints).execute()?;
    info!(splines = fit.no_splines(), closed = fit.is_closed(), "spline fitted");

    let samples = InterpSplines::new(fit.coeffs(), Sampling::StepSize(2.0)).execute()?;
    let mut track = samples.to_track(true)?;
    let n = track.len();
    track.set_widths(&vec![3.0; n], &vec![3.5; n])?;
    info!(samples = n, length = track.length(), "track built");

    let fine = track.interpolate_track(0.5)?;
    let max_kappa = fine
        .kappa()
        .into_iter()
        .flatten()
        .fold(0.0_f64, |acc, k| acc.max(k.abs()));
    info!(samples = fine.len(), max_kappa, "track resampled");

    let car = Point2::new(38.0, 6.0);
    let foot = fine.project(&car)?;
    info!(
        s = foot.s.unwrap_or_default(),
        x = foot.x,
        y = foot.y,
        psi = foot.psi.unwrap_or_default(),
        "car projected"
    );

    match fine.first_intersect_point(&car, 8.0, true) {
        Some(target) => info!(x = target.x, y = target.y, s = target.s.unwrap_or_default(), "lookahead"),
        None => info!("no lookahead point within reach"),
    }
    Ok(())
}
