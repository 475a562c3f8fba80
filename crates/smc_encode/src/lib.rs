//! smc_encode — Constraint encodings for stable matching with couples.
//!
//! This crate is algorithmic-only and depends only on `smc_core`. It turns a
//! `ProblemInstance` into either a 0/1 mixed-integer program in CPLEX LP
//! form (`mip`) or a CNF formula streamed into a clause sink (`sat`), and
//! decodes solver output back into a matching. `lp` holds the LP expression
//! tree; `rankgen` fabricates synthetic preference orders for tests.
//!
//! Emission order is fixed by the instance's insertion order, so for a given
//! instance the rendered LP text and the clause stream are byte-for-byte
//! reproducible.

pub mod lp;
pub mod mip;
pub mod rankgen;
pub mod sat;

use core::fmt;
use smc_core::ids::{HospitalId, NIL_HOSPITAL};
use smc_core::prefs::HospitalPair;
use smc_core::CoreError;

/// A resident's hospital list with the implicit trailing nil option (kept
/// as-is when the loader already appended nil).
pub(crate) fn with_nil(ordering: &[HospitalId]) -> Vec<HospitalId> {
    let mut v = ordering.to_vec();
    if !v.contains(&NIL_HOSPITAL) {
        v.push(NIL_HOSPITAL);
    }
    v
}

/// A couple's pair list with the implicit trailing `(nil, nil)` option.
pub(crate) fn pairs_with_nil(pairs: &[HospitalPair]) -> Vec<HospitalPair> {
    let mut v = pairs.to_vec();
    if v.last() != Some(&(NIL_HOSPITAL, NIL_HOSPITAL)) {
        v.push((NIL_HOSPITAL, NIL_HOSPITAL));
    }
    v
}

#[derive(Debug)]
pub enum EncodeError {
    /// The instance declares no residents, so there is no variable to anchor
    /// the MIP objective on.
    EmptyInstance,
    Core(CoreError),
    Io(std::io::Error),
    /// Invariant breach inside the encoder; should never fire.
    Internal(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::EmptyInstance => write!(f, "instance has no residents to encode"),
            EncodeError::Core(e) => write!(f, "{e}"),
            EncodeError::Io(e) => write!(f, "clause sink error: {e}"),
            EncodeError::Internal(what) => write!(f, "internal encoder inconsistency: {what}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Core(e) => Some(e),
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoreError> for EncodeError {
    fn from(e: CoreError) -> Self {
        EncodeError::Core(e)
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> Self {
        EncodeError::Io(e)
    }
}
