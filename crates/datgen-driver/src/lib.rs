//! # datgen-driver
//!
//! Fills a [`datgen::BinnedStore`] with scenarios by rejection sampling on a
//! pool of worker threads.
//!
//! A run is described by a [`DriverConfig`]: a list of bin groups (one
//! [`datgen::GeneratorSettings`] each), the number of instances wanted per
//! bin, and a master seed. The [`Driver`] draws deterministic seeds per
//! group, fans [`datgen::GenerationTask`]s out to its [`WorkerPool`], and
//! commits their results in id order until every bin holds its quota. The
//! same config yields the same [`Dataset`] regardless of the worker count.
//!
//! ```
//! use datgen::*;
//! use datgen_driver::{Driver, DriverConfig};
//! use rand::Rng;
//! use std::convert::Infallible;
//!
//! // Scenarios are a single number; its last digit decides the dynamism.
//! struct Digits;
//! impl ScenarioGenerator for Digits {
//!     type Scenario = u32;
//!     type Error = Infallible;
//!     fn generate<R: Rng + ?Sized>(&self, rng: &mut R, _: &str) -> Result<u32, Infallible> {
//!         Ok(rng.random_range(0..1_000_000))
//!     }
//! }
//!
//! struct LastDigit;
//! impl ScenarioMetrics<u32> for LastDigit {
//!     type Error = Infallible;
//!     fn check_time_window_strictness(&self, _: &u32) -> Result<bool, Infallible> { Ok(true) }
//!     fn measure_urgency(&self, _: &u32) -> Result<UrgencySummary, Infallible> {
//!         Ok(UrgencySummary { mean: 1.0, std_dev: 0.0 })
//!     }
//!     fn count_events(&self, _: &u32, _: EventKind) -> Result<usize, Infallible> { Ok(4) }
//!     fn measure_dynamism(&self, s: &u32, _: TimeWindow) -> Result<f64, Infallible> {
//!         Ok(f64::from(s % 10) / 10.0)
//!     }
//! }
//!
//! let settings = GeneratorSettings::builder()
//!     .urgency(1)
//!     .num_orders(4)
//!     .office_hours(TimeWindow::new(0, 100).unwrap())
//!     .dynamism_bins(
//!         DynamismBins::builder()
//!             .bin(DynamismRange::half_open(0.0, 0.5), 0.25)
//!             .bin(DynamismRange::half_open(0.5, 1.0), 0.75)
//!             .build()
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let config = DriverConfig::builder()
//!     .group(settings)
//!     .quota_per_bin(3)
//!     .master_seed(42)
//!     .num_workers(2)
//!     .build()
//!     .unwrap();
//!
//! let dataset = Driver::new(config, LastDigit, |_| Digits).run().unwrap();
//! assert_eq!(dataset.store.get(0.25, 1, 1.0).len(), 3);
//! assert_eq!(dataset.store.get(0.75, 1, 1.0).len(), 3);
//! ```

mod config;
mod driver;
mod error;
mod pool;
mod seeds;
mod stats;

pub use crate::config::*;
pub use crate::driver::*;
pub use crate::error::*;
pub use crate::pool::*;
pub use crate::seeds::*;
pub use crate::stats::*;
