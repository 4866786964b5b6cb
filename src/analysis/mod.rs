//! Dataset aggregation.
//!
//! `aggregator` holds the pure statistical views; `charts` projects them
//! into the label/value shapes the rendering layer draws.

pub mod aggregator;
pub mod charts;

pub use aggregator::*;
pub use charts::*;
