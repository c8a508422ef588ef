pub mod affine;
mod invert;

pub use invert::{invert3x3, invert4x4};

/// Linear blend from `p` to `q` by `t`.
pub fn lerp(p: f64, q: f64, t: f64) -> f64 {
    p * (1.0 - t) + q * t
}
