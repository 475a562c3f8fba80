// crates/smc_encode/src/sat.rs
//
// CNF encoding of stable matching with couples. Clauses stream into a
// `ClauseSink` in a fixed order, so the emitted DIMACS body is reproducible
// byte-for-byte for a given instance.
//
// Variable groups, in allocation order:
//   xr_<r>,<h>      single r matched to h (plus a nil variable per resident)
//   xc_<c>,<r>,<h>  couple member r matched to h
//   q_<h>,<i>,<j>   sequential counter: exactly j of the first i residents
//                   on h's list (in h's preference order) are matched to h
//   cpref_<c>,<k>   couple c is matched to its rank-k pair or better; the
//                   sentinel k = |pairs| covers (nil, nil)
//
// The counters replace capacity inequalities: unit clauses pin
// q_<h>,<i>,<cap+1> false for every i past capacity. Stability clauses use
// `add_q_refs` to say "or h is already filled with n residents it weakly
// prefers to r".

use crate::{pairs_with_nil, with_nil, EncodeError};
use smc_core::cnf::{Clause, ClauseSet, ClauseSink, Lit, Var, VarAllocator};
use smc_core::entities::Hospital;
use smc_core::ids::{CoupleId, HospitalId, ResidentId, NIL_HOSPITAL};
use smc_core::instance::{Matching, ProblemInstance};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Variable tables produced by `encode_sat`; needed to decode a model and
/// to evaluate clauses in verify mode.
pub struct SatEncoding {
    pub num_vars: u32,
    /// var id → human-readable name, for debug dumps.
    pub registry: BTreeMap<Var, String>,
    res_match: BTreeMap<ResidentId, BTreeMap<HospitalId, Var>>,
    rev_match: BTreeMap<Var, (ResidentId, HospitalId)>,
    /// q[h][i-1][j] for i in 1..=|rank(h)|, j in 0..=min(i, cap+1).
    q: BTreeMap<HospitalId, Vec<Vec<Var>>>,
    /// cpref[c][k] for k in 0..=|pairs|.
    cpref: BTreeMap<CoupleId, Vec<Var>>,
}

/// One literal slot in a clause under constant folding: a hospital that can
/// never hold the hypothesized residents contributes a constant instead of
/// a literal. A `True` slot satisfies (and suppresses) the whole clause; a
/// `False` slot just drops out.
enum Part {
    L(Lit),
    True,
    False,
}

fn pos(v: Var) -> Part {
    Part::L(Lit::positive(v))
}

fn neg(v: Var) -> Part {
    Part::L(Lit::negative(v))
}

fn pos_opt(v: Option<Var>) -> Part {
    match v {
        Some(v) => Part::L(Lit::positive(v)),
        None => Part::False,
    }
}

fn neg_opt(v: Option<Var>) -> Part {
    match v {
        Some(v) => Part::L(Lit::negative(v)),
        None => Part::True,
    }
}

fn push_parts(sink: &mut dyn ClauseSink, parts: Vec<Part>) -> Result<(), EncodeError> {
    let mut lits = Vec::with_capacity(parts.len());
    for p in parts {
        match p {
            Part::True => return Ok(()),
            Part::False => {}
            Part::L(l) => lits.push(l),
        }
    }
    debug_assert!(!lits.is_empty(), "clause folded to empty");
    sink.push(Clause::new(lits))?;
    Ok(())
}

pub fn encode_sat(
    inst: &ProblemInstance,
    sink: &mut dyn ClauseSink,
) -> Result<SatEncoding, EncodeError> {
    let mut alloc = VarAllocator::new();
    let mut registry: BTreeMap<Var, String> = BTreeMap::new();
    let mut res_match: BTreeMap<ResidentId, BTreeMap<HospitalId, Var>> = BTreeMap::new();
    let mut rev_match: BTreeMap<Var, (ResidentId, HospitalId)> = BTreeMap::new();

    // ---- Matching variables and at-least-one clauses ----------------------

    for r in inst.singles() {
        let hs = with_nil(r.ranked.ordering());
        let mut row = BTreeMap::new();
        for &h in &hs {
            let v = alloc.fresh();
            registry.insert(v, format!("xr_{},{}", r.uid, h));
            rev_match.insert(v, (r.uid, h));
            row.insert(h, v);
        }
        sink.push(Clause::new(hs.iter().map(|h| Lit::positive(row[h])).collect()))?;
        res_match.insert(r.uid, row);
    }

    for c in inst.couples() {
        for &m in &c.members {
            let r = inst.resident(m)?;
            let hs = with_nil(r.ranked.ordering());
            let mut row = BTreeMap::new();
            for &h in &hs {
                let v = alloc.fresh();
                registry.insert(v, format!("xc_{},{},{}", c.uid, m, h));
                rev_match.insert(v, (m, h));
                row.insert(h, v);
            }
            sink.push(Clause::new(hs.iter().map(|h| Lit::positive(row[h])).collect()))?;
            res_match.insert(m, row);
        }
    }

    // ---- Pairwise at-most-one ---------------------------------------------

    for r in inst.singles() {
        emit_at_most_one(sink, &res_match[&r.uid], &with_nil(r.ranked.ordering()))?;
    }
    for c in inst.couples() {
        for &m in &c.members {
            let r = inst.resident(m)?;
            emit_at_most_one(sink, &res_match[&m], &with_nil(r.ranked.ordering()))?;
        }
    }

    // ---- Sequential counters ----------------------------------------------
    // q[h][i][j]: after counting the first i residents on h's list, exactly
    // j of them are matched to h. j caps out at capacity + 1, and every
    // q[h][i][cap+1] is pinned false — the capacity constraint.

    let mut q: BTreeMap<HospitalId, Vec<Vec<Var>>> = BTreeMap::new();
    for h in inst.hospitals() {
        let ordering = h.prefs.ordering();
        let cap = h.capacity as usize;
        let mut rows: Vec<Vec<Var>> = Vec::with_capacity(ordering.len());
        for i in 1..=ordering.len() {
            let jmax = usize::min(i, cap + 1);
            let mut row = Vec::with_capacity(jmax + 1);
            for j in 0..=jmax {
                let v = alloc.fresh();
                registry.insert(v, format!("q_{},{},{}", h.uid, i, j));
                row.push(v);
            }
            // The i-th counted variable; a resident who does not rank h
            // back has no variable here and counts as constant false.
            let y = res_match
                .get(&ordering[i - 1])
                .and_then(|m| m.get(&h.uid))
                .copied();
            if i == 1 {
                push_parts(sink, vec![pos_opt(y), pos(row[0])])?;
                push_parts(sink, vec![neg_opt(y), pos(row[1])])?;
                push_parts(sink, vec![neg_opt(y), neg(row[0])])?;
                push_parts(sink, vec![pos_opt(y), neg(row[1])])?;
            } else {
                let prev = &rows[i - 2];
                for j in 0..=jmax {
                    if j == 0 {
                        push_parts(sink, vec![neg_opt(y), neg(row[0])])?;
                        push_parts(sink, vec![pos(prev[0]), neg(row[0])])?;
                        push_parts(sink, vec![pos_opt(y), neg(prev[0]), pos(row[0])])?;
                    } else if j == i {
                        push_parts(sink, vec![pos_opt(y), neg(row[j])])?;
                        push_parts(sink, vec![pos(prev[j - 1]), neg(row[j])])?;
                        push_parts(sink, vec![neg_opt(y), neg(prev[j - 1]), pos(row[j])])?;
                    } else {
                        push_parts(sink, vec![neg_opt(y), neg(prev[j - 1]), pos(row[j])])?;
                        push_parts(sink, vec![pos_opt(y), neg(prev[j]), pos(row[j])])?;
                        push_parts(sink, vec![pos_opt(y), pos(prev[j]), neg(row[j])])?;
                        push_parts(sink, vec![neg_opt(y), pos(prev[j - 1]), neg(row[j])])?;
                    }
                }
            }
            if i >= cap + 1 {
                sink.push(Clause::new(vec![Lit::negative(row[cap + 1])]))?;
            }
            rows.push(row);
        }
        q.insert(h.uid, rows);
    }

    // ---- Couple preference thresholds -------------------------------------

    let mut cpref: BTreeMap<CoupleId, Vec<Var>> = BTreeMap::new();
    for c in inst.couples() {
        let [m0, m1] = c.members;
        let row0 = &res_match[&m0];
        let row1 = &res_match[&m1];
        let pairs = c.pairs();
        let mut vars: Vec<Var> = Vec::with_capacity(pairs.len() + 1);
        for (k, &(h0, h1)) in pairs.iter().enumerate() {
            let v = alloc.fresh();
            registry.insert(v, format!("cpref_{},{}", c.uid, k));
            let y0 = row0[&h0];
            let y1 = row1[&h1];
            if k == 0 {
                sink.push(Clause::new(vec![Lit::negative(v), Lit::positive(y0)]))?;
                sink.push(Clause::new(vec![Lit::negative(v), Lit::positive(y1)]))?;
                sink.push(Clause::new(vec![
                    Lit::positive(v),
                    Lit::negative(y0),
                    Lit::negative(y1),
                ]))?;
            } else {
                let prev = vars[k - 1];
                sink.push(Clause::new(vec![
                    Lit::negative(v),
                    Lit::positive(prev),
                    Lit::positive(y0),
                ]))?;
                sink.push(Clause::new(vec![
                    Lit::negative(v),
                    Lit::positive(prev),
                    Lit::positive(y1),
                ]))?;
                sink.push(Clause::new(vec![Lit::positive(v), Lit::negative(prev)]))?;
                sink.push(Clause::new(vec![
                    Lit::positive(v),
                    Lit::negative(y0),
                    Lit::negative(y1),
                ]))?;
            }
            vars.push(v);
        }
        // Sentinel: matched to (nil, nil) or anything ranked above it.
        let v = alloc.fresh();
        registry.insert(v, format!("cpref_{},{}", c.uid, pairs.len()));
        let n0 = row0[&NIL_HOSPITAL];
        let n1 = row1[&NIL_HOSPITAL];
        match vars.last().copied() {
            Some(prev) => {
                sink.push(Clause::new(vec![
                    Lit::negative(v),
                    Lit::positive(prev),
                    Lit::positive(n0),
                ]))?;
                sink.push(Clause::new(vec![
                    Lit::negative(v),
                    Lit::positive(prev),
                    Lit::positive(n1),
                ]))?;
                sink.push(Clause::new(vec![Lit::positive(v), Lit::negative(prev)]))?;
                sink.push(Clause::new(vec![
                    Lit::positive(v),
                    Lit::negative(n0),
                    Lit::negative(n1),
                ]))?;
            }
            None => {
                // Degenerate couple with an empty pair list.
                sink.push(Clause::new(vec![Lit::negative(v), Lit::positive(n0)]))?;
                sink.push(Clause::new(vec![Lit::negative(v), Lit::positive(n1)]))?;
                sink.push(Clause::new(vec![
                    Lit::positive(v),
                    Lit::negative(n0),
                    Lit::negative(n1),
                ]))?;
            }
        }
        vars.push(v);
        cpref.insert(c.uid, vars);
    }

    // Every couple lands on some ranked pair or on (nil, nil).
    for c in inst.couples() {
        sink.push(Clause::new(
            cpref[&c.uid].iter().map(|&v| Lit::positive(v)).collect(),
        ))?;
    }

    // ---- Stability: singles -----------------------------------------------

    for r in inst.singles() {
        for &h_uid in r.ranked.ordering() {
            if h_uid.is_nil() {
                continue;
            }
            let h = inst.hospital(h_uid)?;
            let row = &res_match[&r.uid];
            let mut parts: Vec<Part> = r
                .ranked
                .weakly_preferred(h_uid)?
                .iter()
                .map(|hp| pos(row[hp]))
                .collect();
            add_q_refs(&mut parts, &q, &[(h, r.uid, h.capacity as i64)]);
            push_parts(sink, parts)?;
        }
    }

    // ---- Stability: one couple member switches ----------------------------

    for c in inst.couples() {
        let [m0, m1] = c.members;
        let row0 = &res_match[&m0];
        let row1 = &res_match[&m1];
        let pairs = c.pairs();
        let cp = &cpref[&c.uid];
        for (number, &(h0_uid, h1_uid)) in pairs.iter().enumerate() {
            let h0 = inst.hospital(h0_uid)?;
            let h1 = inst.hospital(h1_uid)?;
            let cap0 = h0.capacity as i64;
            let cap1 = h1.capacity as i64;
            let y0 = row0[&h0_uid];
            let y1 = row1[&h1_uid];
            if h0_uid != h1_uid {
                let mut parts = vec![neg(y1), pos(cp[number])];
                add_q_refs(&mut parts, &q, &[(h0, m0, cap0)]);
                push_parts(sink, parts)?;

                let mut parts = vec![neg(y0), pos(cp[number])];
                add_q_refs(&mut parts, &q, &[(h1, m1, cap1)]);
                push_parts(sink, parts)?;
            } else {
                // Same hospital on both sides: the member the hospital ranks
                // better effectively frees one seat for the other.
                match (h0.rank(m0), h0.rank(m1)) {
                    (Some(a), Some(b)) if a < b => {
                        let mut parts = vec![neg(y1), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h0, m0, cap0), (h1, m1, cap1 - 1)]);
                        push_parts(sink, parts)?;

                        let mut parts = vec![neg(y0), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h1, m1, cap1)]);
                        push_parts(sink, parts)?;
                    }
                    (Some(_), Some(_)) => {
                        let mut parts = vec![neg(y1), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h0, m0, cap0)]);
                        push_parts(sink, parts)?;

                        let mut parts = vec![neg(y0), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h0, m0, cap0 - 1), (h1, m1, cap1)]);
                        push_parts(sink, parts)?;
                    }
                    _ => {
                        // The hospital does not rank one of the members;
                        // the q-refs fold these clauses away.
                        let mut parts = vec![neg(y1), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h0, m0, cap0), (h1, m1, cap1)]);
                        push_parts(sink, parts)?;

                        let mut parts = vec![neg(y0), pos(cp[number])];
                        add_q_refs(&mut parts, &q, &[(h0, m0, cap0), (h1, m1, cap1)]);
                        push_parts(sink, parts)?;
                    }
                }
            }
        }
        // Switch to (nil, nil): a member sitting at nil means the couple
        // must already be at its nil rank or better.
        sink.push(Clause::new(vec![
            Lit::negative(row0[&NIL_HOSPITAL]),
            Lit::positive(cp[pairs.len()]),
        ]))?;
        sink.push(Clause::new(vec![
            Lit::negative(row1[&NIL_HOSPITAL]),
            Lit::positive(cp[pairs.len()]),
        ]))?;
    }

    // ---- Stability: both couple members switch ----------------------------

    for c in inst.couples() {
        let [m0, m1] = c.members;
        let row0 = &res_match[&m0];
        let row1 = &res_match[&m1];
        let pairs = c.pairs();
        let cp = &cpref[&c.uid];
        for (number, &(h0_uid, h1_uid)) in pairs.iter().enumerate() {
            let h0 = inst.hospital(h0_uid)?;
            let h1 = inst.hospital(h1_uid)?;
            if h0.capacity == 0 || h1.capacity == 0 {
                continue;
            }
            let cap0 = h0.capacity as i64;
            let cap1 = h1.capacity as i64;
            let y0 = row0[&h0_uid];
            let y1 = row1[&h1_uid];
            if h0_uid != h1_uid {
                let mut parts = vec![pos(y0), pos(y1), pos(cp[number])];
                add_q_refs(&mut parts, &q, &[(h0, m0, cap0), (h1, m1, cap1)]);
                push_parts(sink, parts)?;
            } else {
                if h0.capacity == 1 {
                    continue; // both members into one seat — impossible anyway
                }
                let mut parts = vec![pos(y0), pos(y1), pos(cp[number])];
                add_q_refs(
                    &mut parts,
                    &q,
                    &[
                        (h0, m0, cap0),
                        (h1, m1, cap1),
                        (h0, m0, cap0 - 1),
                        (h1, m1, cap1 - 1),
                    ],
                );
                push_parts(sink, parts)?;
            }
        }
        sink.push(Clause::new(vec![
            Lit::positive(row0[&NIL_HOSPITAL]),
            Lit::positive(row1[&NIL_HOSPITAL]),
            Lit::positive(cp[pairs.len()]),
        ]))?;
    }

    Ok(SatEncoding {
        num_vars: alloc.count(),
        registry,
        res_match,
        rev_match,
        q,
        cpref,
    })
}

fn emit_at_most_one(
    sink: &mut dyn ClauseSink,
    row: &BTreeMap<HospitalId, Var>,
    hs: &[HospitalId],
) -> Result<(), EncodeError> {
    for i in 0..hs.len() {
        for j in i + 1..hs.len() {
            sink.push(Clause::new(vec![
                Lit::negative(row[&hs[i]]),
                Lit::negative(row[&hs[j]]),
            ]))?;
        }
    }
    Ok(())
}

/// Extend `parts` with q-literals meaning "or `h` is already filled with
/// `n` residents it weakly prefers to `r`". A hospital that trivially
/// satisfies the condition (n ≤ 0 with nobody to displace, or a hospital
/// that would never admit `r`) folds the whole clause to true; a hospital
/// that cannot possibly hold `n` better residents contributes nothing.
fn add_q_refs(
    parts: &mut Vec<Part>,
    q: &BTreeMap<HospitalId, Vec<Vec<Var>>>,
    refs: &[(&Hospital, ResidentId, i64)],
) {
    for &(h, r, n) in refs {
        if h.is_nil() {
            continue; // nil always has room; no escape literal
        }
        let Some(rank) = h.rank(r) else {
            parts.push(Part::True); // h never admits r: cannot block
            continue;
        };
        if n < 0 || (n == 0 && rank == 0) {
            parts.push(Part::True); // trivially full
            continue;
        }
        let n = n as usize;
        if rank >= n && rank >= 1 {
            parts.push(pos(q[&h.uid][rank - 1][n]));
        }
        // rank < n: fewer than n better-ranked residents exist at all, so
        // "filled with n better" is impossible — no literal.
    }
}

impl SatEncoding {
    /// Render a clause with registry names (negations get a `-` prefix).
    pub fn render_clause(&self, clause: &Clause) -> String {
        let mut out = String::new();
        for (i, lit) in clause.lits().iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            if !lit.is_positive() {
                out.push('-');
            }
            match self.registry.get(&lit.var()) {
                Some(name) => out.push_str(name),
                None => {
                    let _ = write!(out, "?{}", lit.var().0);
                }
            }
        }
        out
    }

    /// The truth assignment a matching induces on every encoding variable,
    /// using the natural semantics of each auxiliary: q counters carry the
    /// true prefix counts and cpref thresholds the true couple rank. Works
    /// at any capacity.
    pub fn assignment_for(&self, inst: &ProblemInstance, matching: &Matching) -> BTreeSet<Var> {
        let assigned = |r: ResidentId| matching.get(&r).copied().unwrap_or(NIL_HOSPITAL);
        let mut truth: BTreeSet<Var> = BTreeSet::new();

        for (&r, row) in &self.res_match {
            let h = assigned(r);
            if let Some(&v) = row.get(&h) {
                truth.insert(v);
            }
            // A resident matched off-list sets nothing; the at-least-one
            // clause then fails and verify reports it.
        }

        for h in inst.hospitals() {
            let Some(rows) = self.q.get(&h.uid) else { continue };
            let mut count = 0usize;
            for (idx, &r) in h.prefs.ordering().iter().enumerate() {
                if assigned(r) == h.uid {
                    count += 1;
                }
                let row = &rows[idx];
                if count < row.len() {
                    truth.insert(row[count]);
                }
            }
        }

        for c in inst.couples() {
            let vars = &self.cpref[&c.uid];
            let pair = (assigned(c.members[0]), assigned(c.members[1]));
            let mut found = false;
            for (k, &p) in c.pairs().iter().enumerate() {
                if p == pair {
                    found = true;
                }
                if found {
                    truth.insert(vars[k]);
                }
            }
            if found || pair == (NIL_HOSPITAL, NIL_HOSPITAL) {
                truth.insert(vars[c.pairs().len()]);
            }
        }

        truth
    }
}

// ---- Model decoding --------------------------------------------------------

/// Parse SAT solver output. `None` means the solver reported UNSATISFIABLE.
/// Model lines start with `v` and hold space-separated signed literals
/// terminated by `0`; positive match literals set the matching, and singles
/// the model never mentions default to nil.
pub fn decode_model(
    enc: &SatEncoding,
    inst: &ProblemInstance,
    text: &str,
) -> Option<Matching> {
    if text.lines().any(|l| l.contains("UNSATISFIABLE")) {
        return None;
    }
    let mut matching = Matching::new();
    for line in text.lines().filter(|l| l.starts_with('v')) {
        for tok in line.split_whitespace().skip(1) {
            let Ok(code) = tok.parse::<i64>() else {
                continue;
            };
            if code <= 0 {
                continue;
            }
            if let Some(&(r, h)) = enc.rev_match.get(&Var(code as u32)) {
                matching.insert(r, h);
            }
        }
    }
    for r in inst.singles() {
        matching.entry(r.uid).or_insert(NIL_HOSPITAL);
    }
    Some(matching)
}

// ---- Verify mode -----------------------------------------------------------

#[derive(Debug)]
pub struct SatViolation {
    /// The failing clause rendered with registry names.
    pub clause: String,
}

/// Re-encode the instance, assign every variable from `matching`, and
/// evaluate each clause. An empty result means the matching is stable and
/// feasible; each failing clause comes back rendered for diagnostics.
pub fn verify_matching(
    inst: &ProblemInstance,
    matching: &Matching,
) -> Result<Vec<SatViolation>, EncodeError> {
    let mut set = ClauseSet::new();
    let enc = encode_sat(inst, &mut set)?;
    let truth = enc.assignment_for(inst, matching);
    let mut violations = Vec::new();
    for clause in &set.clauses {
        let satisfied = clause
            .lits()
            .iter()
            .any(|l| l.is_positive() == truth.contains(&l.var()));
        if !satisfied {
            violations.push(SatViolation { clause: enc.render_clause(clause) });
        }
    }
    Ok(violations)
}
