// crates/smc_core/src/ids.rs
//
// Integer uid newtypes for the three entity kinds, plus the nil-hospital
// sentinel. Uids come straight off the wire format, so each newtype parses
// from a decimal token; the hospital id additionally understands the `-1`
// token that denotes "unmatched" in problem and matching files.

use crate::errors::CoreError;
use core::fmt;
use core::str::FromStr;

/// Wire token for the nil hospital in problem/matching files.
pub const NIL_HOSPITAL_TOKEN: &str = "-1";

/// The distinguished "unmatched" hospital.
pub const NIL_HOSPITAL: HospitalId = HospitalId(999_999);

macro_rules! def_uid {
    ($name:ident) => {
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        pub struct $name(pub u32);

        impl $name {
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u32>().map($name).map_err(|_| CoreError::InvalidUid)
            }
        }
    };
}

def_uid!(ResidentId);
def_uid!(HospitalId);
def_uid!(CoupleId);

impl HospitalId {
    pub fn is_nil(self) -> bool {
        self == NIL_HOSPITAL
    }

    /// Parse a hospital token, mapping `-1` to the nil sentinel.
    pub fn parse_token(s: &str) -> Result<Self, CoreError> {
        if s == NIL_HOSPITAL_TOKEN {
            Ok(NIL_HOSPITAL)
        } else {
            s.parse()
        }
    }

    /// Render for matching output: the nil hospital prints as `-1`.
    pub fn wire_token(self) -> String {
        if self.is_nil() {
            NIL_HOSPITAL_TOKEN.to_string()
        } else {
            self.0.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_token_round_trip() {
        assert_eq!(HospitalId::parse_token("-1").unwrap(), NIL_HOSPITAL);
        assert_eq!(NIL_HOSPITAL.wire_token(), "-1");
        assert_eq!(HospitalId::parse_token("7").unwrap(), HospitalId(7));
        assert_eq!(HospitalId(7).wire_token(), "7");
    }

    #[test]
    fn bad_tokens_rejected() {
        assert!(HospitalId::parse_token("x").is_err());
        assert!("-2".parse::<ResidentId>().is_err());
    }
}
