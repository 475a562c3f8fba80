// crates/smc_core/src/instance.rs
//
// The in-memory problem instance: entity tables keyed by uid plus the
// insertion-order lists the encoders iterate. Entities are immutable once
// the instance is built; the only field written afterwards is `matching`,
// populated by a decoder after the solver returns.

use crate::entities::{Couple, Hospital, Resident};
use crate::errors::CoreError;
use crate::ids::{CoupleId, HospitalId, ResidentId, NIL_HOSPITAL};
use std::collections::BTreeMap;

/// Partial map resident → hospital. Absence means unmatched; an explicit
/// nil-hospital entry is also treated as unmatched on output.
pub type Matching = BTreeMap<ResidentId, HospitalId>;

#[derive(Clone, Debug)]
pub struct ProblemInstance {
    hospitals: Vec<HospitalId>,
    singles: Vec<ResidentId>,
    couples: Vec<CoupleId>,
    hospital_tab: BTreeMap<HospitalId, Hospital>,
    resident_tab: BTreeMap<ResidentId, Resident>,
    couple_tab: BTreeMap<CoupleId, Couple>,
    nil: Hospital,
    /// Written by the solution decoders; empty until then.
    pub matching: Matching,
}

impl ProblemInstance {
    /// Assemble an instance from loaded entities. Enforces uid uniqueness
    /// within each kind, the nil-sentinel collision rule, and that every uid
    /// appearing in a preference list names a declared entity.
    pub fn new(
        hospitals: Vec<Hospital>,
        singles: Vec<Resident>,
        couple_entries: Vec<(Couple, [Resident; 2])>,
    ) -> Result<Self, CoreError> {
        let mut inst = Self {
            hospitals: Vec::new(),
            singles: Vec::new(),
            couples: Vec::new(),
            hospital_tab: BTreeMap::new(),
            resident_tab: BTreeMap::new(),
            couple_tab: BTreeMap::new(),
            nil: Hospital::nil(),
            matching: Matching::new(),
        };

        for h in hospitals {
            if h.uid == NIL_HOSPITAL {
                return Err(CoreError::NilUidCollision(h.uid.raw()));
            }
            let uid = h.uid;
            if inst.hospital_tab.insert(uid, h).is_some() {
                return Err(CoreError::DuplicateHospital(uid.raw()));
            }
            inst.hospitals.push(uid);
        }
        for r in singles {
            let uid = r.uid;
            if inst.resident_tab.insert(uid, r).is_some() {
                return Err(CoreError::DuplicateResident(uid.raw()));
            }
            inst.singles.push(uid);
        }
        for (c, members) in couple_entries {
            let cuid = c.uid;
            for m in members {
                let uid = m.uid;
                if inst.resident_tab.insert(uid, m).is_some() {
                    return Err(CoreError::DuplicateResident(uid.raw()));
                }
            }
            if inst.couple_tab.insert(cuid, c).is_some() {
                return Err(CoreError::DuplicateCouple(cuid.raw()));
            }
            inst.couples.push(cuid);
        }

        inst.check_references()?;
        Ok(inst)
    }

    /// Every item appearing in a preference list must exist as an entity
    /// (the nil hospital always exists).
    fn check_references(&self) -> Result<(), CoreError> {
        for r in self.resident_tab.values() {
            for &h in r.ranked.ordering() {
                if !h.is_nil() && !self.hospital_tab.contains_key(&h) {
                    return Err(CoreError::UnknownHospital(h.raw()));
                }
            }
        }
        for h in self.hospital_tab.values() {
            for &r in h.prefs.ordering() {
                if !self.resident_tab.contains_key(&r) {
                    return Err(CoreError::UnknownResident(r.raw()));
                }
            }
        }
        for c in self.couple_tab.values() {
            for &(a, b) in c.pairs() {
                for h in [a, b] {
                    if !h.is_nil() && !self.hospital_tab.contains_key(&h) {
                        return Err(CoreError::UnknownHospital(h.raw()));
                    }
                }
            }
            for m in c.members {
                if !self.resident_tab.contains_key(&m) {
                    return Err(CoreError::UnknownResident(m.raw()));
                }
            }
        }
        Ok(())
    }

    // ---- Lookups -----------------------------------------------------------

    /// Hospital by uid; the nil sentinel resolves to the built-in nil record.
    pub fn hospital(&self, id: HospitalId) -> Result<&Hospital, CoreError> {
        if id.is_nil() {
            return Ok(&self.nil);
        }
        self.hospital_tab.get(&id).ok_or(CoreError::UnknownHospital(id.raw()))
    }

    pub fn resident(&self, id: ResidentId) -> Result<&Resident, CoreError> {
        self.resident_tab.get(&id).ok_or(CoreError::UnknownResident(id.raw()))
    }

    pub fn couple(&self, id: CoupleId) -> Result<&Couple, CoreError> {
        self.couple_tab.get(&id).ok_or(CoreError::UnknownCouple(id.raw()))
    }

    /// The couple a resident belongs to, if any.
    pub fn couple_of(&self, r: ResidentId) -> Option<&Couple> {
        let resident = self.resident_tab.get(&r)?;
        let cid = resident.couple?;
        self.couple_tab.get(&cid)
    }

    pub fn nil_hospital(&self) -> &Hospital {
        &self.nil
    }

    // ---- Iteration (insertion order, which the loader fixes) --------------

    pub fn hospitals(&self) -> impl Iterator<Item = &Hospital> {
        self.hospitals.iter().map(move |id| &self.hospital_tab[id])
    }

    pub fn singles(&self) -> impl Iterator<Item = &Resident> {
        self.singles.iter().map(move |id| &self.resident_tab[id])
    }

    pub fn couples(&self) -> impl Iterator<Item = &Couple> {
        self.couples.iter().map(move |id| &self.couple_tab[id])
    }

    pub fn n_hospitals(&self) -> usize {
        self.hospitals.len()
    }

    pub fn n_singles(&self) -> usize {
        self.singles.len()
    }

    pub fn n_couples(&self) -> usize {
        self.couples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{PairOrder, RankOrder};

    fn h(u: u32) -> HospitalId {
        HospitalId(u)
    }
    fn r(u: u32) -> ResidentId {
        ResidentId(u)
    }

    fn hospital(uid: u32, cap: u32, prefs: &[u32]) -> Hospital {
        Hospital::new(
            h(uid),
            cap,
            RankOrder::new(prefs.iter().map(|&u| r(u)).collect()).unwrap(),
        )
    }

    fn single(uid: u32, prefs: &[u32]) -> Resident {
        Resident::single(r(uid), RankOrder::new(prefs.iter().map(|&u| h(u)).collect()).unwrap())
    }

    #[test]
    fn builds_and_looks_up() {
        let inst = ProblemInstance::new(
            vec![hospital(1, 1, &[10, 11])],
            vec![single(10, &[1]), single(11, &[1])],
            vec![],
        )
        .unwrap();
        assert_eq!(inst.hospital(h(1)).unwrap().capacity, 1);
        assert!(inst.hospital(NIL_HOSPITAL).unwrap().is_nil());
        assert_eq!(inst.n_singles(), 2);
    }

    #[test]
    fn duplicate_resident_rejected() {
        let err = ProblemInstance::new(
            vec![hospital(1, 1, &[10])],
            vec![single(10, &[1]), single(10, &[1])],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::DuplicateResident(10));
    }

    #[test]
    fn dangling_reference_rejected() {
        let err = ProblemInstance::new(
            vec![hospital(1, 1, &[99])],
            vec![single(10, &[1])],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, CoreError::UnknownResident(99));
    }

    #[test]
    fn couple_membership() {
        let c = Couple::new(
            CoupleId(5),
            [r(20), r(21)],
            PairOrder::new(vec![(h(1), h(1))]).unwrap(),
        );
        let m0 = Resident::in_couple(r(20), RankOrder::new(vec![h(1)]).unwrap(), CoupleId(5));
        let m1 = Resident::in_couple(r(21), RankOrder::new(vec![h(1)]).unwrap(), CoupleId(5));
        let inst = ProblemInstance::new(
            vec![hospital(1, 2, &[20, 21])],
            vec![],
            vec![(c, [m0, m1])],
        )
        .unwrap();
        let c = inst.couple_of(r(21)).unwrap();
        assert_eq!(c.other_member(r(21)), Some(r(20)));
    }
}
