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

use serde::{Deserialize, Serialize};

use crate::error::{PicError, PicResult};

/// Periodic 1D grid: `Ng` cells over `[0, L)`, cell `Ng-1` next to cell `0`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub length: f64,  // domain length L
    pub cells: usize, // number of grid points Ng
    pub dx: f64,      // grid division L / Ng
}

impl Grid {
    pub fn new(length: f64, cells: usize) -> PicResult<Self> {
        if !length.is_finite() || length <= 0.0 {
            return Err(PicError::invalid("L", "must be finite and > 0"));
        }
        if cells == 0 {
            return Err(PicError::invalid("Ng", "must be > 0"));
        }
        Ok(Grid {
            length,
            cells,
            dx: length / (cells as f64),
        })
    }

    #[inline]
    pub fn inv_dx(&self) -> f64 {
        1.0 / self.dx
    }

    /// Nearest-grid-point index of `x`, `round(x/dx) mod Ng`.
    ///
    /// Shared by deposition and gather: using one mapping for both keeps
    /// the interpolation free of self-forces.
    #[inline]
    pub fn nearest_index(&self, x: f64) -> usize {
        let i = (x * self.inv_dx()).round() as i64;
        i.rem_euclid(self.cells as i64) as usize
    }

    /// Wraps `x` into `[0, L)`.
    #[inline]
    pub fn wrap(&self, x: f64) -> f64 {
        let w = x.rem_euclid(self.length);
        // rem_euclid of a tiny negative number rounds up to exactly L
        if w >= self.length {
            0.0
        } else {
            w
        }
    }

    /// Node coordinates `i * dx`.
    pub fn nodes(&self) -> Vec<f64> {
        (0..self.cells).map(|i| (i as f64) * self.dx).collect()
    }
}
