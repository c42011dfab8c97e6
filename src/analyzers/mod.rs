//! Station analytics.
//!
//! Every function here is a synchronous pure function over an already loaded
//! `&[Observation]`: windowing, latest-snapshot reduction, movement ranking,
//! capacity rollups, stuck-bike detection, clustering and trend series.
//! [`report`] ties them together for one refresh.

pub mod anomaly;
pub mod capacity;
pub mod cluster;
pub mod movement;
pub mod report;
pub mod snapshot;
pub mod station;
pub mod trend;
pub mod types;
pub mod utility;
pub mod window;
