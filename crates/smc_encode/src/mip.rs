// crates/smc_encode/src/mip.rs
//
// MIP encoding of stable matching with couples. Feasible 0/1 solutions of
// the emitted program are exactly the stable matchings of the instance.
//
// Variables:
//   x_<r>,<h>        single resident r matched to hospital h
//   x_<c>,<ha>,<hb>  couple c matched to the pair (ha, hb)
//   alpha_<r>,<h>    "h is full with residents it weakly prefers to r";
//                    used only by the double-switch family
//
// Constraint families, in emission order: single match (one row per
// single), couple match, capacity, single stability, couple single-member
// switch (plus two nil-switch rows per couple), couple double switch
// (alpha definitions first, then the blocking rows). The objective is
// arbitrary — the first binary, maximized — since feasibility is the goal.

use crate::lp::{Constraint, ConstraintKind, ConstraintSet, Expr, LpProblem, Sense, Term};
use crate::{pairs_with_nil, with_nil, EncodeError};
use smc_core::entities::Resident;
use smc_core::ids::{CoupleId, HospitalId, ResidentId, NIL_HOSPITAL};
use smc_core::instance::{Matching, ProblemInstance};
use smc_core::prefs::HospitalPair;
use std::collections::{BTreeMap, BTreeSet};

pub struct MipEncoding {
    pub problem: LpProblem,
}

impl MipEncoding {
    pub fn render(&self) -> String {
        self.problem.render()
    }
}

fn single_var(r: ResidentId, h: HospitalId) -> String {
    format!("x_{r},{h}")
}

fn couple_var(c: CoupleId, pair: HospitalPair) -> String {
    format!("x_{c},{},{}", pair.0, pair.1)
}

fn alpha_var(r: ResidentId, h: HospitalId) -> String {
    format!("alpha_{r},{h}")
}

/// Expansion of the match variable for (resident, hospital): the single
/// variable for a single; for a couple member, every joint variable whose
/// relevant coordinate equals the hospital. A (single, hospital) pair that
/// has no variable — the resident does not rank the hospital — expands to
/// nothing.
fn expand(
    inst: &ProblemInstance,
    r: &Resident,
    h: HospitalId,
    coeff: i64,
) -> Result<Vec<Term>, EncodeError> {
    match r.couple {
        None => {
            if h.is_nil() || r.ranked.contains(h) {
                Ok(vec![Term::coeff_var(coeff, single_var(r.uid, h))])
            } else {
                Ok(Vec::new())
            }
        }
        Some(cid) => {
            let couple = inst.couple(cid)?;
            let side = couple
                .side_of(r.uid)
                .ok_or(EncodeError::Internal("resident not a member of its own couple"))?;
            Ok(couple
                .pairs()
                .iter()
                .filter(|&&pair| side.pick(pair) == h)
                .map(|&pair| Term::coeff_var(coeff, couple_var(cid, pair)))
                .collect())
        }
    }
}

fn expand_all(
    inst: &ProblemInstance,
    residents: &[ResidentId],
    h: HospitalId,
    coeff: i64,
) -> Result<Vec<Term>, EncodeError> {
    let mut terms = Vec::new();
    for &r_uid in residents {
        terms.extend(expand(inst, inst.resident(r_uid)?, h, coeff)?);
    }
    Ok(terms)
}

pub fn encode_mip(inst: &ProblemInstance) -> Result<MipEncoding, EncodeError> {
    let mut cs = ConstraintSet::new();
    let mut binaries: Vec<String> = Vec::new();

    // ---- Matching rows ----------------------------------------------------

    for r in inst.singles() {
        let hs = with_nil(r.ranked.ordering());
        let lhs = Expr::new(hs.iter().map(|&h| Term::var(single_var(r.uid, h))).collect());
        cs.push_eq(lhs, Term::constant(1));
        binaries.extend(hs.iter().map(|&h| single_var(r.uid, h)));
    }

    for c in inst.couples() {
        let pairs = pairs_with_nil(c.pairs());
        let lhs = Expr::new(pairs.iter().map(|&p| Term::var(couple_var(c.uid, p))).collect());
        cs.push_eq(lhs, Term::constant(1));
        binaries.extend(pairs.iter().map(|&p| couple_var(c.uid, p)));
    }

    // ---- Capacity ---------------------------------------------------------
    // The nil hospital never appears here: it is not in the instance's
    // hospital list and is unbounded by construction.

    for h in inst.hospitals() {
        if h.prefs.is_empty() {
            continue;
        }
        let terms = expand_all(inst, h.prefs.ordering(), h.uid, 1)?;
        cs.push_le(Expr::new(terms), Term::constant(h.capacity as i64));
    }

    // ---- Single stability -------------------------------------------------
    // If r sits strictly below h on r's own list, h must be at capacity with
    // residents it weakly prefers to r.

    for r in inst.singles() {
        for &h_uid in r.ranked.ordering() {
            if h_uid.is_nil() {
                continue;
            }
            let h = inst.hospital(h_uid)?;
            let Some(occupants) = h.weakly_preferred(r.uid) else {
                // h does not rank r, so (r, h) can never block.
                continue;
            };
            let cap = h.capacity as i64;
            let mut terms = expand_all(inst, occupants, h_uid, -1)?;
            for &hp in r.ranked.weakly_preferred(h_uid)? {
                terms.push(Term::coeff_var(-cap, single_var(r.uid, hp)));
            }
            cs.push_le(Expr::new(terms), Term::constant(-cap));
        }
    }

    // ---- Couple single-member switch --------------------------------------

    for c in inst.couples() {
        let [r0_id, r1_id] = c.members;
        let r0 = inst.resident(r0_id)?;
        let r1 = inst.resident(r1_id)?;
        for &(h0_uid, h1_uid) in c.pairs() {
            let h0 = inst.hospital(h0_uid)?;
            let h1 = inst.hospital(h1_uid)?;
            let cap0 = h0.capacity as i64;
            let cap1 = h1.capacity as i64;
            let wp_pairs = c.prefs.weakly_preferred((h0_uid, h1_uid), &[])?;
            if h0_uid != h1_uid {
                // r0 moves into h0 while r1 stays at h1.
                if let Some(occ0) = h0.weakly_preferred(r0_id) {
                    let mut terms: Vec<Term> = wp_pairs
                        .iter()
                        .map(|&p| Term::coeff_var(-cap0, couple_var(c.uid, p)))
                        .collect();
                    terms.extend(expand_all(inst, occ0, h0_uid, -1)?);
                    terms.extend(expand(inst, r1, h1_uid, cap0)?);
                    cs.push_le(Expr::new(terms), Term::constant(0));
                }
                // Mirror: r1 moves into h1 while r0 stays at h0.
                if let Some(occ1) = h1.weakly_preferred(r1_id) {
                    let mut terms: Vec<Term> = wp_pairs
                        .iter()
                        .map(|&p| Term::coeff_var(-cap1, couple_var(c.uid, p)))
                        .collect();
                    terms.extend(expand_all(inst, occ1, h1_uid, -1)?);
                    terms.extend(expand(inst, r0, h0_uid, cap1)?);
                    cs.push_le(Expr::new(terms), Term::constant(0));
                }
            } else if let (Some(rank0), Some(rank1)) = (h0.rank(r0_id), h0.rank(r1_id)) {
                // Same hospital on both sides: both rows use the occupant
                // set of the member the hospital ranks worse.
                let worse = if rank0 < rank1 { r1_id } else { r0_id };
                let occ = h0
                    .weakly_preferred(worse)
                    .ok_or(EncodeError::Internal("ranked member lost its occupant set"))?;
                let occupant_terms = expand_all(inst, occ, h0_uid, -1)?;

                let mut terms: Vec<Term> = wp_pairs
                    .iter()
                    .map(|&p| Term::coeff_var(-cap0, couple_var(c.uid, p)))
                    .collect();
                terms.extend(occupant_terms.iter().cloned());
                terms.extend(expand(inst, r1, h1_uid, cap0)?);
                cs.push_le(Expr::new(terms), Term::constant(0));

                let mut terms: Vec<Term> = wp_pairs
                    .iter()
                    .map(|&p| Term::coeff_var(-cap1, couple_var(c.uid, p)))
                    .collect();
                terms.extend(occupant_terms);
                terms.extend(expand(inst, r0, h0_uid, cap1)?);
                cs.push_le(Expr::new(terms), Term::constant(0));
            }
        }

        // Switch to (nil, nil).
        let all_pairs = pairs_with_nil(c.pairs());
        for stay in [r1, r0] {
            let mut terms: Vec<Term> = all_pairs
                .iter()
                .map(|&p| Term::coeff_var(-1, couple_var(c.uid, p)))
                .collect();
            terms.extend(expand(inst, stay, NIL_HOSPITAL, 1)?);
            cs.push_le(Expr::new(terms), Term::constant(0));
        }
    }

    // ---- Couple double switch ---------------------------------------------

    for c in inst.couples() {
        let [r0_id, r1_id] = c.members;
        let r0 = inst.resident(r0_id)?;
        let r1 = inst.resident(r1_id)?;

        // alpha_<r1>,<h1> for each pair where both hospitals have capacity
        // above one and neither is nil; alpha forces "h1 full of residents
        // weakly preferred to r1".
        let mut generated: BTreeSet<(ResidentId, HospitalId)> = BTreeSet::new();
        for &(h0_uid, h1_uid) in c.pairs() {
            let h0 = inst.hospital(h0_uid)?;
            let h1 = inst.hospital(h1_uid)?;
            if h0.capacity <= 1
                || h0_uid.is_nil()
                || h1.capacity <= 1
                || h1_uid.is_nil()
                || generated.contains(&(r1_id, h1_uid))
            {
                continue;
            }
            let Some(occ1) = h1.weakly_preferred(r1_id) else {
                continue; // h1 would never admit r1; no switch to cut off
            };
            binaries.push(alpha_var(r1_id, h1_uid));
            generated.insert((r1_id, h1_uid));
            let mut terms = expand_all(inst, occ1, h1_uid, -1)?;
            terms.push(Term::coeff_var(h1.capacity as i64, alpha_var(r1_id, h1_uid)));
            cs.push_le(Expr::new(terms), Term::constant(0));
        }

        for &(h0_uid, h1_uid) in c.pairs() {
            let h0 = inst.hospital(h0_uid)?;
            let h1 = inst.hospital(h1_uid)?;
            if h0.capacity == 0 || h1.capacity == 0 {
                continue;
            }
            let cap0 = h0.capacity as i64;
            let cap1 = h1.capacity as i64;
            let wp_pairs = c.prefs.weakly_preferred((h0_uid, h1_uid), &[])?;
            let pair_terms = |cap: i64| -> Vec<Term> {
                wp_pairs
                    .iter()
                    .map(|&p| Term::coeff_var(-cap, couple_var(c.uid, p)))
                    .collect()
            };
            if h0_uid != h1_uid {
                let roomy0 = !h0_uid.is_nil() && h0.capacity > 1;
                let roomy1 = !h1_uid.is_nil() && h1.capacity > 1;
                if roomy0 && roomy1 {
                    // Full form: needs the alpha column for (r1, h1).
                    let (Some(occ0), true) =
                        (h0.weakly_preferred(r0_id), generated.contains(&(r1_id, h1_uid)))
                    else {
                        continue;
                    };
                    let mut terms = expand(inst, r0, h0_uid, -cap0)?;
                    terms.extend(expand(inst, r1, h1_uid, -cap0)?);
                    terms.extend(pair_terms(cap0));
                    terms.extend(expand_all(inst, occ0, h0_uid, -1)?);
                    terms.push(Term::coeff_var(-cap0, alpha_var(r1_id, h1_uid)));
                    cs.push_le(Expr::new(terms), Term::constant(-cap0));
                } else if h1_uid.is_nil() || h1.capacity == 1 {
                    let (Some(occ0), Some(occ1)) =
                        (h0.weakly_preferred(r0_id), h1.weakly_preferred(r1_id))
                    else {
                        continue;
                    };
                    let mut var_side = expand_all(inst, occ0, h0_uid, -1)?;
                    var_side.extend(expand_all(inst, occ1, h1_uid, -cap0)?);
                    let mut terms = expand(inst, r0, h0_uid, -cap0)?;
                    terms.extend(expand(inst, r1, h1_uid, -cap0)?);
                    terms.extend(pair_terms(cap0));
                    terms.extend(var_side);
                    cs.push_le(Expr::new(terms), Term::constant(-cap0));
                } else {
                    // h0 is nil or has capacity one; mirror of the above.
                    let (Some(occ0), Some(occ1)) =
                        (h0.weakly_preferred(r0_id), h1.weakly_preferred(r1_id))
                    else {
                        continue;
                    };
                    let mut var_side = expand_all(inst, occ1, h1_uid, -1)?;
                    var_side.extend(expand_all(inst, occ0, h0_uid, -cap1)?);
                    let mut terms = expand(inst, r0, h0_uid, -cap1)?;
                    terms.extend(expand(inst, r1, h1_uid, -cap1)?);
                    terms.extend(pair_terms(cap1));
                    terms.extend(var_side);
                    cs.push_le(Expr::new(terms), Term::constant(-cap1));
                }
            } else {
                if h0.capacity == 1 {
                    continue; // both members into one slot — impossible anyway
                }
                let (Some(rank0), Some(rank1)) = (h0.rank(r0_id), h0.rank(r1_id)) else {
                    continue;
                };
                let worse = if rank0 < rank1 { r1_id } else { r0_id };
                let occ = h0
                    .weakly_preferred(worse)
                    .ok_or(EncodeError::Internal("ranked member lost its occupant set"))?;
                let mut terms = expand(inst, r0, h0_uid, -cap0)?;
                terms.extend(expand(inst, r1, h1_uid, -cap0)?);
                terms.extend(pair_terms(cap0));
                terms.extend(expand_all(inst, occ, h0_uid, -1)?);
                cs.push_le(Expr::new(terms), Term::constant(-cap0 + 1));
            }
        }
    }

    let Some(first) = binaries.first() else {
        return Err(EncodeError::EmptyInstance);
    };
    let problem = LpProblem {
        sense: Sense::Maximize,
        objective: Expr::new(vec![Term::var(first.clone())]),
        constraints: cs,
        bounds: None,
        binaries,
    };
    Ok(MipEncoding { problem })
}

// ---- Solution decoding ----------------------------------------------------

/// Parsed CPLEX interactive-optimizer output: objective value and the
/// reported variable assignments. `None` when the output has no variable
/// section (infeasible / no solution).
#[derive(Debug)]
pub struct MipSolution {
    pub objective: Option<f64>,
    pub values: BTreeMap<String, f64>,
}

/// Lines up to `Objective =` carry the objective; after a `Variable Name`
/// header, each line is `<name> <value>` until the
/// `All other variables in the range` sentinel.
pub fn parse_solution(text: &str) -> Option<MipSolution> {
    let mut objective = None;
    let mut values = BTreeMap::new();
    let mut lines = text.lines();
    let mut found_vars = false;
    for line in lines.by_ref() {
        if let Some(pos) = line.find("Objective =") {
            let tail = line[pos + "Objective =".len()..].trim();
            objective = tail.parse::<f64>().ok();
        }
        if line.contains("Variable Name") {
            found_vars = true;
            break;
        }
    }
    if !found_vars {
        return None;
    }
    for line in lines {
        if line.contains("All other variables in the range") {
            break;
        }
        let mut split = line.split_whitespace();
        let (Some(name), Some(value)) = (split.next(), split.next()) else {
            continue;
        };
        let Ok(value) = value.parse::<f64>() else {
            continue;
        };
        values.insert(name.to_string(), value);
    }
    Some(MipSolution { objective, values })
}

/// Split `x_<a>,<b>[,<c>]` / `alpha_<a>,<b>` into kind and fields.
fn parse_var_name(name: &str) -> Option<(&str, Vec<&str>)> {
    let us = name.find('_')?;
    let kind = &name[..us];
    let fields: Vec<&str> = name[us + 1..].split(',').collect();
    Some((kind, fields))
}

/// Decode reported variable values into a matching. Nil-hospital
/// assignments are omitted (absence means unmatched).
pub fn matching_from_solution(
    inst: &ProblemInstance,
    solution: &MipSolution,
) -> Result<Matching, EncodeError> {
    let mut matching = Matching::new();
    for (name, &value) in &solution.values {
        if value < 0.5 {
            continue;
        }
        let Some(("x", fields)) = parse_var_name(name) else {
            continue;
        };
        match fields.as_slice() {
            [r, h] => {
                let r: ResidentId = r.parse()?;
                let h: HospitalId = h.parse()?;
                if !h.is_nil() {
                    matching.insert(r, h);
                }
            }
            [c, ha, hb] => {
                let c: CoupleId = c.parse()?;
                let couple = inst.couple(c)?;
                let ha: HospitalId = ha.parse()?;
                let hb: HospitalId = hb.parse()?;
                if !ha.is_nil() {
                    matching.insert(couple.members[0], ha);
                }
                if !hb.is_nil() {
                    matching.insert(couple.members[1], hb);
                }
            }
            _ => continue,
        }
    }
    Ok(matching)
}

// ---- Verify mode -----------------------------------------------------------

#[derive(Debug)]
pub struct MipViolation {
    /// The violated row, rendered in LP syntax.
    pub constraint: String,
    /// Its left-hand side under the matching.
    pub lhs: i64,
}

/// Evaluate every emitted row under `matching`. Alpha columns take their
/// natural value — 1 exactly when the hospital is at capacity with
/// residents it weakly prefers — which is the most permissive feasible
/// choice (alphas only relax the rows they appear in), so a row fails here
/// iff it fails for every alpha assignment. An empty result means the
/// matching is stable and feasible.
pub fn verify_matching(
    inst: &ProblemInstance,
    matching: &Matching,
) -> Result<Vec<MipViolation>, EncodeError> {
    let encoding = encode_mip(inst)?;
    let mut violations = Vec::new();
    for c in &encoding.problem.constraints.constraints {
        let lhs = eval_constraint(inst, matching, c)?;
        let rhs = c.rhs.coeff.unwrap_or(0);
        let ok = match c.kind {
            ConstraintKind::Equality => lhs == rhs,
            ConstraintKind::Inequality => lhs <= rhs,
        };
        if !ok {
            violations.push(MipViolation { constraint: c.render(), lhs });
        }
    }
    Ok(violations)
}

fn eval_constraint(
    inst: &ProblemInstance,
    matching: &Matching,
    c: &Constraint,
) -> Result<i64, EncodeError> {
    let assigned = |r: ResidentId| matching.get(&r).copied().unwrap_or(NIL_HOSPITAL);
    let mut total = 0i64;
    for term in &c.lhs.terms {
        let Some(var) = &term.var else {
            total += term.coeff.unwrap_or(0);
            continue;
        };
        let Some((kind, fields)) = parse_var_name(var) else {
            return Err(EncodeError::Internal("unparseable variable name in own row"));
        };
        let value = match (kind, fields.as_slice()) {
            ("alpha", [r, h]) => {
                let r: ResidentId = r.parse()?;
                let h: HospitalId = h.parse()?;
                let hospital = inst.hospital(h)?;
                let seated = hospital
                    .weakly_preferred(r)
                    .map(|occ| occ.iter().filter(|&&rp| assigned(rp) == h).count())
                    .unwrap_or(0);
                i64::from(seated >= hospital.capacity as usize)
            }
            ("x", [r, h]) => {
                let r: ResidentId = r.parse()?;
                let h: HospitalId = h.parse()?;
                i64::from(assigned(r) == h)
            }
            ("x", [cu, ha, hb]) => {
                let cu: CoupleId = cu.parse()?;
                let couple = inst.couple(cu)?;
                let ha: HospitalId = ha.parse()?;
                let hb: HospitalId = hb.parse()?;
                i64::from(
                    assigned(couple.members[0]) == ha && assigned(couple.members[1]) == hb,
                )
            }
            _ => return Err(EncodeError::Internal("variable with unexpected shape")),
        };
        total += term.coeff.unwrap_or(1) * value;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smc_core::entities::{Couple, Hospital, Resident};
    use smc_core::prefs::{PairOrder, RankOrder};

    fn h(u: u32) -> HospitalId {
        HospitalId(u)
    }
    fn r(u: u32) -> ResidentId {
        ResidentId(u)
    }

    /// One hospital (uid 7, cap 1, prefers r1 then r2), two singles who both
    /// want it.
    fn contested_seat() -> ProblemInstance {
        let hosp = Hospital::new(h(7), 1, RankOrder::new(vec![r(1), r(2)]).unwrap());
        let s1 = Resident::single(r(1), RankOrder::new(vec![h(7)]).unwrap());
        let s2 = Resident::single(r(2), RankOrder::new(vec![h(7)]).unwrap());
        ProblemInstance::new(vec![hosp], vec![s1, s2], vec![]).unwrap()
    }

    #[test]
    fn contested_seat_rows() {
        let enc = encode_mip(&contested_seat()).unwrap();
        let text = enc.render();
        assert!(text.starts_with("Maximize\nobj: x_1,7\n"), "{text}");
        assert!(text.contains("c0: x_1,7 + x_1,999999 = 1"), "{text}");
        assert!(text.contains("c1: x_2,7 + x_2,999999 = 1"), "{text}");
        // capacity row over both expansions
        assert!(text.contains("c2: 1 x_1,7 + 1 x_2,7 <= 1"), "{text}");
        // stability for r2 counts r1 and r2 as weakly-preferred occupants
        assert!(
            text.contains("c4: -1 x_1,7 - 1 x_2,7 - 1 x_2,7 <= -1"),
            "{text}"
        );
        assert!(text.ends_with("Binaries\nx_1,7\nx_1,999999\nx_2,7\nx_2,999999\nEnd\n"), "{text}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = encode_mip(&contested_seat()).unwrap().render();
        let b = encode_mip(&contested_seat()).unwrap().render();
        assert_eq!(a, b);
    }

    #[test]
    fn verify_accepts_the_stable_matching() {
        let inst = contested_seat();
        let mut m = Matching::new();
        m.insert(r(1), h(7));
        let violations = verify_matching(&inst, &m).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn verify_flags_the_unstable_matching() {
        let inst = contested_seat();
        // Seat the worse-ranked resident; r1 and the hospital now block.
        let mut m = Matching::new();
        m.insert(r(2), h(7));
        let violations = verify_matching(&inst, &m).unwrap();
        assert!(!violations.is_empty());
    }

    #[test]
    fn verify_flags_overfull_hospital() {
        let inst = contested_seat();
        let mut m = Matching::new();
        m.insert(r(1), h(7));
        m.insert(r(2), h(7));
        let violations = verify_matching(&inst, &m).unwrap();
        assert!(violations.iter().any(|v| v.constraint.contains("c2:")), "{violations:?}");
    }

    /// Couple wanting one roomy hospital for both members.
    fn couple_same_hospital() -> ProblemInstance {
        let hosp = Hospital::new(h(7), 2, RankOrder::new(vec![r(1), r(2)]).unwrap());
        let prefs = PairOrder::new(vec![(h(7), h(7))]).unwrap();
        let m0 = Resident::in_couple(r(1), RankOrder::new(vec![h(7)]).unwrap(), CoupleId(9));
        let m1 = Resident::in_couple(r(2), RankOrder::new(vec![h(7)]).unwrap(), CoupleId(9));
        let couple = Couple::new(CoupleId(9), [r(1), r(2)], prefs);
        ProblemInstance::new(vec![hosp], vec![], vec![(couple, [m0, m1])]).unwrap()
    }

    #[test]
    fn couple_rows_use_joint_variables() {
        let enc = encode_mip(&couple_same_hospital()).unwrap();
        let text = enc.render();
        assert!(text.contains("x_9,7,7 + x_9,999999,999999 = 1"), "{text}");
        // capacity expands both members through the joint variable
        assert!(text.contains("1 x_9,7,7 + 1 x_9,7,7 <= 2"), "{text}");
    }

    #[test]
    fn couple_verify_both_seated_is_stable() {
        let inst = couple_same_hospital();
        let mut m = Matching::new();
        m.insert(r(1), h(7));
        m.insert(r(2), h(7));
        assert!(verify_matching(&inst, &m).unwrap().is_empty());
    }

    #[test]
    fn couple_verify_unmatched_blocks() {
        let inst = couple_same_hospital();
        let m = Matching::new();
        assert!(!verify_matching(&inst, &m).unwrap().is_empty());
    }

    #[test]
    fn parses_cplex_solution_output() {
        let text = "\
Some preamble
MIP - Integer optimal solution:  Objective =  1.0000000000e+00
Solution time = 0.1

Variable Name           Solution Value
x_1,7                   1.000000
x_2,999999              1.000000
All other variables in the range 1-4 are 0.
";
        let sol = parse_solution(text).unwrap();
        assert_eq!(sol.objective, Some(1.0));
        assert_eq!(sol.values.get("x_1,7"), Some(&1.0));
        let inst = contested_seat();
        let m = matching_from_solution(&inst, &sol).unwrap();
        assert_eq!(m.get(&r(1)), Some(&h(7)));
        // the nil assignment is omitted
        assert!(!m.contains_key(&r(2)));
    }

    #[test]
    fn missing_variable_section_means_infeasible() {
        assert!(parse_solution("CPLEX: problem is infeasible\n").is_none());
    }

    #[test]
    fn empty_instance_has_no_objective_anchor() {
        let inst = ProblemInstance::new(vec![], vec![], vec![]).unwrap();
        assert!(matches!(encode_mip(&inst), Err(EncodeError::EmptyInstance)));
    }
}
