//-------------------------------------------------------------------//
//       esPIC : periodic 1d1v electrostatic PIC engine              //
//-------------------------------------------------------------------//
// This program is free software: you can redistribute it and/or    //
// modify it under the terms of the GNU General Public License as    //
// published by the Free Software Foundation, version 3.             //
// This program is distributed in the hope that it will be useful,   //
// but WITHOUT ANY WARRANTY; without even the implied warranty of    //
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU  //
// General Public License for more details at                        //
// https://www.gnu.org/licenses/gpl-3.0.html.                        //
//-------------------------------------------------------------------//

//! Velocity sampling from a drifting 1D Maxwellian.

use std::f64::consts::PI;

use log::debug;
use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::Normal;

use crate::config::VelocityLoading;
use crate::error::{PicError, PicResult};

const BATCH_FACTOR: usize = 3; // candidates drawn per requested sample and batch

/// Bounds and moments of the velocity distribution of one species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityWindow {
    pub v_min: f64,
    pub v_max: f64,
    pub v0: f64,
    pub v_th: f64,
}

/// Drifting Maxwellian `f(v) = exp(-(v-v0)^2 / (2 v_th^2)) / (sqrt(2 pi) v_th)`.
#[inline]
pub fn maxwellian(v: f64, v0: f64, v_th: f64) -> f64 {
    (1.0 / ((2.0 * PI).sqrt() * v_th)) * (-(v - v0).powi(2) / (2.0 * v_th * v_th)).exp()
}

/// Draws exactly `n` samples with the requested loading method.
pub fn sample_velocities<R: Rng>(
    loading: VelocityLoading,
    window: VelocityWindow,
    n: usize,
    max_batches: usize,
    rng: &mut R,
) -> PicResult<Vec<f64>> {
    match loading {
        VelocityLoading::Rejection => acceptance_rejection(window, n, max_batches, rng),
        VelocityLoading::Gaussian => truncated_gaussian(window, n, max_batches, rng),
    }
}

/// Acceptance-rejection sampling.
///
/// Each batch draws `3n` uniform candidates in `[v_min, v_max)` together with
/// uniform thresholds scaled by the peak value `f(v0)`; a candidate is kept
/// when its threshold lies below `f(candidate)`. Accepted samples accumulate
/// over batches and are truncated to `n`. Fails with `SamplerTimeout` once
/// `max_batches` batches did not yield enough samples.
pub fn acceptance_rejection<R: Rng>(
    window: VelocityWindow,
    n: usize,
    max_batches: usize,
    rng: &mut R,
) -> PicResult<Vec<f64>> {
    let VelocityWindow { v_min, v_max, v0, v_th } = window;
    if n == 0 {
        return Ok(Vec::new());
    }
    if !(v_min < v_max) {
        return Err(PicError::invalid("v_min", "must be < v_max"));
    }

    let candidates = Uniform::new(v_min, v_max);
    let f_max = maxwellian(v0, v0, v_th);
    let batch = n * BATCH_FACTOR;

    let mut accepted: Vec<f64> = Vec::with_capacity(n + batch);
    let mut batches: usize = 0;
    while accepted.len() < n {
        if batches == max_batches {
            return Err(PicError::SamplerTimeout {
                requested: n,
                accepted: accepted.len(),
                batches,
            });
        }
        for _ in 0..batch {
            let v = rng.sample(&candidates);
            let u = rng.gen::<f64>() * f_max;
            if u < maxwellian(v, v0, v_th) {
                accepted.push(v);
            }
        }
        batches += 1;
    }
    accepted.truncate(n);
    debug!("acceptance-rejection: {} samples in {} batch(es)", n, batches);
    Ok(accepted)
}

/// Normal draws around `v0`, samples outside `[v_min, v_max)` are redrawn.
pub fn truncated_gaussian<R: Rng>(
    window: VelocityWindow,
    n: usize,
    max_batches: usize,
    rng: &mut R,
) -> PicResult<Vec<f64>> {
    let VelocityWindow { v_min, v_max, v0, v_th } = window;
    if n == 0 {
        return Ok(Vec::new());
    }
    let normal = Normal::new(v0, v_th)
        .map_err(|_| PicError::invalid("v_th", "must be finite and > 0"))?;
    let batch = n * BATCH_FACTOR;

    let mut accepted: Vec<f64> = Vec::with_capacity(n);
    let mut batches: usize = 0;
    while accepted.len() < n {
        if batches == max_batches {
            return Err(PicError::SamplerTimeout {
                requested: n,
                accepted: accepted.len(),
                batches,
            });
        }
        for _ in 0..batch {
            let v: f64 = rng.sample(&normal);
            if v_min <= v && v < v_max {
                accepted.push(v);
                if accepted.len() == n {
                    break;
                }
            }
        }
        batches += 1;
    }
    Ok(accepted)
}
