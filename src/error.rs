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

use thiserror::Error;

/// Errors raised while setting up or stepping a run.
///
/// All of them are local to one run; the solver factorization is never
/// touched by a failing run.
#[derive(Error, Debug)]
pub enum PicError {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("velocity sampler gave up after {batches} batches ({accepted} of {requested} samples accepted)")]
    SamplerTimeout {
        requested: usize,
        accepted: usize,
        batches: usize,
    },

    #[error("Poisson solver setup failed: {0}")]
    SolverSetup(String),

    #[error("numerical divergence at iteration {iteration}: non-finite {quantity}")]
    NumericalDivergence { iteration: usize, quantity: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] bincode::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PicError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PicError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PicResult<T> = Result<T, PicError>;
