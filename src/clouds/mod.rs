//! Procedural cloud field: a fixed grid of billboard instances, grouped into
//! draw-call sized batches, faded in and out by a scrolling noise field.
//! Only batches near the observer are animated and drawn.

pub mod animation;
pub mod batch;
pub mod config;
pub mod field;
pub mod instance;
pub mod noise;
pub mod plugin;
pub mod render;
pub mod visibility;

pub use plugin::{CloudObserver, CloudSet, CloudStartupSet, CloudsPlugin};
