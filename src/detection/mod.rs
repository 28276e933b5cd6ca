// src/detection/mod.rs

mod detector;
#[cfg(feature = "vision")]
mod segmentation;
#[cfg_attr(not(feature = "vision"), allow(dead_code))]
mod types;
#[cfg_attr(not(feature = "vision"), allow(dead_code))]
mod validity;

// Re-export public APIs
pub use detector::{open, Detector};
#[cfg(test)]
pub use types::Contour;
