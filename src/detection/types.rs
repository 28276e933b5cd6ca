// src/detection/types.rs

/// Raw spatial moments up to first order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Area-weighted centroid, `None` for a degenerate (zero-area) shape.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f32, f32),
    pub radius: f32,
}

/// One connected blob of the color mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub area: f64,
    pub moments: Moments,
    pub enclosing: Circle,
}

impl Contour {
    pub fn enclosing_radius(&self) -> f32 {
        self.enclosing.radius
    }
}
