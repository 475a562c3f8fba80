// crates/smc_core/src/errors.rs

use core::fmt;

/// Minimal error set for core-domain construction & queries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreError {
    /// A uid token failed to parse as an unsigned integer.
    InvalidUid,
    /// An item occurs twice in a strict preference order.
    DuplicateRankEntry,
    /// A preference query was made for an item not in the order.
    NotRanked,
    DuplicateResident(u32),
    DuplicateHospital(u32),
    DuplicateCouple(u32),
    UnknownResident(u32),
    UnknownHospital(u32),
    UnknownCouple(u32),
    /// An entity was declared with the uid reserved for the nil hospital.
    NilUidCollision(u32),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidUid => write!(f, "invalid uid"),
            CoreError::DuplicateRankEntry => write!(f, "duplicate entry in preference order"),
            CoreError::NotRanked => write!(f, "item not present in preference order"),
            CoreError::DuplicateResident(u) => write!(f, "duplicate resident: {u}"),
            CoreError::DuplicateHospital(u) => write!(f, "duplicate program: {u}"),
            CoreError::DuplicateCouple(u) => write!(f, "duplicate couple: {u}"),
            CoreError::UnknownResident(u) => write!(f, "unknown resident referenced: {u}"),
            CoreError::UnknownHospital(u) => write!(f, "unknown program referenced: {u}"),
            CoreError::UnknownCouple(u) => write!(f, "unknown couple referenced: {u}"),
            CoreError::NilUidCollision(u) => {
                write!(f, "uid {u} collides with the nil-hospital sentinel")
            }
        }
    }
}

impl std::error::Error for CoreError {}
