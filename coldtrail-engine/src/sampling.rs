//! Distribution samplers built on a uniform [0,1) stream.
//!
//! Each sampler consumes exactly one draw. The cost simulator relies on that
//! to keep draw consumption identical across runs, so the per-sample draw
//! order is part of the reproducibility contract.

use rand::Rng;

/// Linear map of one draw into `[lo, hi)`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + rng.r#gen::<f64>() * (hi - lo)
}

/// Inverse-CDF sample of the triangular distribution over `[lo, hi]` with the
/// given mode, using the standard two-branch formula split at
/// `(mode - lo) / (hi - lo)`.
pub fn triangular<R: Rng + ?Sized>(rng: &mut R, lo: f64, mode: f64, hi: f64) -> f64 {
    let u = rng.r#gen::<f64>();
    let split = (mode - lo) / (hi - lo);
    if u < split {
        lo + (u * (hi - lo) * (mode - lo)).sqrt()
    } else {
        hi - ((1.0 - u) * (hi - lo) * (hi - mode)).sqrt()
    }
}
