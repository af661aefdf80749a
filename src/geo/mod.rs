//! Geographic and astronomical building blocks.
//!
//! ## Module Structure
//!
//! - [`periods`]: the fixed, ordered catalog of named solar periods
//! - [`location`]: validated latitude/longitude and the local solar date
//! - [`provider`]: the astronomical-time provider seam and its `sunrise`-backed
//!   implementation
//!
//! Sun position math itself lives in the `sunrise` crate; this module only
//! maps its events onto the catalog and decides which results are usable.

pub mod location;
pub mod periods;
pub mod provider;

pub use location::Location;
pub use periods::SolarPeriod;
pub use provider::{SolarTimes, SolarTimesProvider, SunriseProvider};
