// src/detection/validity.rs
//
// Decides whether the blobs of a frame describe a ball.
//
// Rejection rules, in order:
//   1. no blobs at all
//   2. the radius measured on the PREVIOUS tick exceeded max_valid_radius
//      (one tick of lag, kept deliberately)
//   3. the shape policy calls the blob set non-circular
//
// The shape check is a crude roundness proxy and is kept behind
// `ShapePolicy` so a real classifier can replace it without touching the
// state machine.

use super::types::Contour;
use crate::types::Detection;
use tracing::debug;

pub trait ShapePolicy: Send {
    fn name(&self) -> &'static str;

    /// `true` when the blob set plausibly comes from one round object.
    fn accepts(&self, contours: &[Contour]) -> bool;
}

/// Compares the enclosing-circle radius of the largest-area blob with that
/// of the smallest-area blob.
#[derive(Debug, Clone)]
pub struct EnclosingRadiusSpread {
    pub tolerance_px: f32,
}

impl ShapePolicy for EnclosingRadiusSpread {
    fn name(&self) -> &'static str {
        "enclosing_radius_spread"
    }

    fn accepts(&self, contours: &[Contour]) -> bool {
        match (largest(contours), smallest(contours)) {
            (Some(big), Some(small)) => {
                big.enclosing_radius() - small.enclosing_radius() <= self.tolerance_px
            }
            _ => false,
        }
    }
}

fn largest(contours: &[Contour]) -> Option<&Contour> {
    contours.iter().max_by(|a, b| a.area.total_cmp(&b.area))
}

fn smallest(contours: &[Contour]) -> Option<&Contour> {
    contours.iter().min_by(|a, b| a.area.total_cmp(&b.area))
}

pub struct DetectionFilter {
    max_valid_radius: f32,
    policy: Box<dyn ShapePolicy>,
    previous_radius: f32,
}

impl DetectionFilter {
    pub fn new(max_valid_radius: f32, policy: Box<dyn ShapePolicy>) -> Self {
        Self {
            max_valid_radius,
            policy,
            previous_radius: 0.0,
        }
    }

    #[cfg(test)]
    pub fn previous_radius(&self) -> f32 {
        self.previous_radius
    }

    /// Judge this tick's blobs. The largest blob's radius is remembered for
    /// the next call whether or not this one is accepted.
    pub fn evaluate(&mut self, contours: &[Contour]) -> Detection {
        let prior = self.previous_radius;
        let Some(big) = largest(contours) else {
            self.previous_radius = 0.0;
            return Detection::none();
        };
        self.previous_radius = big.enclosing_radius();

        if prior > self.max_valid_radius {
            debug!(
                "Rejected: previous radius {:.1} above {:.1}",
                prior, self.max_valid_radius
            );
            return Detection::none();
        }

        if !self.policy.accepts(contours) {
            debug!("Rejected by {} shape policy", self.policy.name());
            return Detection::none();
        }

        let Some((cx, cy)) = big.moments.centroid() else {
            return Detection::none();
        };
        debug!(
            "Ball at ({:.1}, {:.1}), enclosing circle at ({:.1}, {:.1}) r={:.1}",
            cx,
            cy,
            big.enclosing.center.0,
            big.enclosing.center.1,
            big.enclosing_radius()
        );
        Detection::at(cx as i32, cy as i32, big.enclosing_radius())
    }
}
