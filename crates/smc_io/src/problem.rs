// crates/smc_io/src/problem.rs
//
// Problem file loader. The format is line-oriented and whitespace-tokenized:
//
//   r <uid> <h_uid>...                      single resident, most preferred first
//   p <uid> <capacity> <r_uid>...           hospital ("program") with ranked residents
//   c <uid> <r0> <r1> <ha0> <hb0> <ha1> <hb1>...   couple with ranked hospital pairs
//
// `-1` denotes the nil hospital. Lines beginning with `#` or whitespace
// (and blank lines) are comments. Uids must be unique per kind, and a
// resident declared inside a couple must not have been declared before.

use crate::IoError;
use smc_core::entities::{Couple, Hospital, Resident};
use smc_core::ids::{CoupleId, HospitalId, ResidentId, NIL_HOSPITAL};
use smc_core::instance::ProblemInstance;
use smc_core::prefs::{HospitalPair, PairOrder, PairSide, RankOrder};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Loader options.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// Canonicalize every preference list to end with the nil hospital
    /// (`(nil, nil)` for couples), so an externally supplied matching can
    /// always be ranked against the list.
    pub append_nil: bool,
}

/// Load a problem instance from a file.
pub fn load_problem(path: &Path, opts: LoadOptions) -> Result<ProblemInstance, IoError> {
    let text = fs::read_to_string(path)
        .map_err(|source| IoError::Read { path: path.to_path_buf(), source })?;
    parse_problem(&text, opts)
}

/// Parse a problem instance from text. Exposed separately for tests.
pub fn parse_problem(text: &str, opts: LoadOptions) -> Result<ProblemInstance, IoError> {
    let mut hospitals: Vec<Hospital> = Vec::new();
    let mut singles: Vec<Resident> = Vec::new();
    let mut couples: Vec<(Couple, [Resident; 2])> = Vec::new();

    let mut seen_residents: BTreeSet<ResidentId> = BTreeSet::new();
    let mut seen_hospitals: BTreeSet<HospitalId> = BTreeSet::new();
    let mut seen_couples: BTreeSet<CoupleId> = BTreeSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if is_comment(raw) {
            continue;
        }
        let items: Vec<&str> = raw.split_whitespace().collect();
        match items[0] {
            "r" => {
                let (uid, ranked) = parse_single(&items, line_no)?;
                if !seen_residents.insert(uid) {
                    return Err(IoError::parse(line_no, format!("duplicate resident: {uid}")));
                }
                let mut ranked = ranked;
                if opts.append_nil {
                    append_nil_single(&mut ranked);
                }
                let order = RankOrder::new(ranked)
                    .map_err(|e| IoError::parse(line_no, e.to_string()))?;
                singles.push(Resident::single(uid, order));
            }
            "p" => {
                let (uid, capacity, ranked) = parse_hospital(&items, line_no)?;
                if !seen_hospitals.insert(uid) {
                    return Err(IoError::parse(line_no, format!("duplicate program: {uid}")));
                }
                let order = RankOrder::new(ranked)
                    .map_err(|e| IoError::parse(line_no, e.to_string()))?;
                hospitals.push(Hospital::new(uid, capacity, order));
            }
            "c" => {
                let (cuid, members, pairs) = parse_couple(&items, line_no)?;
                if !seen_couples.insert(cuid) {
                    return Err(IoError::parse(line_no, format!("duplicate couple: {cuid}")));
                }
                for m in members {
                    if !seen_residents.insert(m) {
                        return Err(IoError::parse(
                            line_no,
                            format!("resident in couple {cuid} already defined: {m}"),
                        ));
                    }
                }
                let mut pairs = pairs;
                if opts.append_nil && pairs.last() != Some(&(NIL_HOSPITAL, NIL_HOSPITAL)) {
                    pairs.push((NIL_HOSPITAL, NIL_HOSPITAL));
                }
                let prefs = PairOrder::new(pairs)
                    .map_err(|e| IoError::parse(line_no, e.to_string()))?;
                let ranked0 = RankOrder::new(prefs.projection(PairSide::First))
                    .map_err(|e| IoError::parse(line_no, e.to_string()))?;
                let ranked1 = RankOrder::new(prefs.projection(PairSide::Second))
                    .map_err(|e| IoError::parse(line_no, e.to_string()))?;
                let couple = Couple::new(cuid, members, prefs);
                let m0 = Resident::in_couple(members[0], ranked0, cuid);
                let m1 = Resident::in_couple(members[1], ranked1, cuid);
                couples.push((couple, [m0, m1]));
            }
            _ => {
                return Err(IoError::parse(line_no, format!("line not readable: {raw}")));
            }
        }
    }

    Ok(ProblemInstance::new(hospitals, singles, couples)?)
}

fn is_comment(line: &str) -> bool {
    match line.chars().next() {
        None => true,
        Some(c) => c == '#' || c.is_whitespace(),
    }
}

fn parse_single(
    items: &[&str],
    line_no: usize,
) -> Result<(ResidentId, Vec<HospitalId>), IoError> {
    if items.len() < 2 {
        return Err(IoError::parse(line_no, "resident line needs a uid"));
    }
    let uid: ResidentId = items[1]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad resident uid: {}", items[1])))?;
    let mut ranked = Vec::with_capacity(items.len() - 2);
    for tok in &items[2..] {
        let h = HospitalId::parse_token(tok)
            .map_err(|_| IoError::parse(line_no, format!("bad program uid: {tok}")))?;
        ranked.push(h);
    }
    Ok((uid, ranked))
}

fn parse_hospital(
    items: &[&str],
    line_no: usize,
) -> Result<(HospitalId, u32, Vec<ResidentId>), IoError> {
    if items.len() < 3 {
        return Err(IoError::parse(line_no, "program line needs a uid and capacity"));
    }
    let uid: HospitalId = items[1]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad program uid: {}", items[1])))?;
    let capacity: u32 = items[2]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad capacity: {}", items[2])))?;
    let mut ranked = Vec::with_capacity(items.len() - 3);
    for tok in &items[3..] {
        let r: ResidentId = tok
            .parse()
            .map_err(|_| IoError::parse(line_no, format!("bad resident uid: {tok}")))?;
        ranked.push(r);
    }
    Ok((uid, capacity, ranked))
}

fn parse_couple(
    items: &[&str],
    line_no: usize,
) -> Result<(CoupleId, [ResidentId; 2], Vec<HospitalPair>), IoError> {
    if items.len() < 4 {
        return Err(IoError::parse(line_no, "couple line needs a uid and two residents"));
    }
    let cuid: CoupleId = items[1]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad couple uid: {}", items[1])))?;
    let r0: ResidentId = items[2]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad resident uid: {}", items[2])))?;
    let r1: ResidentId = items[3]
        .parse()
        .map_err(|_| IoError::parse(line_no, format!("bad resident uid: {}", items[3])))?;
    let rest = &items[4..];
    if rest.len() % 2 != 0 {
        return Err(IoError::parse(line_no, "couple pair list has a dangling token"));
    }
    let mut pairs = Vec::with_capacity(rest.len() / 2);
    for chunk in rest.chunks(2) {
        let a = HospitalId::parse_token(chunk[0])
            .map_err(|_| IoError::parse(line_no, format!("bad program uid: {}", chunk[0])))?;
        let b = HospitalId::parse_token(chunk[1])
            .map_err(|_| IoError::parse(line_no, format!("bad program uid: {}", chunk[1])))?;
        pairs.push((a, b));
    }
    Ok((cuid, [r0, r1], pairs))
}

/// Canonicalize a single's list to end with exactly one nil entry.
fn append_nil_single(ranked: &mut Vec<HospitalId>) {
    if ranked.last() == Some(&NIL_HOSPITAL) {
        ranked.pop();
    }
    ranked.push(NIL_HOSPITAL);
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
# two singles, one program
r 1 7 8
r 2 8 7
p 7 1 1 2
p 8 1 2 1
";

    #[test]
    fn parses_singles_and_programs() {
        let inst = parse_problem(BASIC, LoadOptions::default()).unwrap();
        assert_eq!(inst.n_singles(), 2);
        assert_eq!(inst.n_hospitals(), 2);
        let r1 = inst.resident(ResidentId(1)).unwrap();
        assert_eq!(r1.ranked.ordering(), &[HospitalId(7), HospitalId(8)]);
        let h7 = inst.hospital(HospitalId(7)).unwrap();
        assert_eq!(h7.capacity, 1);
        assert_eq!(h7.prefs.ordering(), &[ResidentId(1), ResidentId(2)]);
    }

    #[test]
    fn parses_couples_with_nil_components() {
        let text = "\
p 7 1 3 4
p 8 1 4 3
c 1 3 4 7 8 8 7 7 -1
";
        let inst = parse_problem(text, LoadOptions::default()).unwrap();
        let c = inst.couple(CoupleId(1)).unwrap();
        assert_eq!(
            c.pairs(),
            &[
                (HospitalId(7), HospitalId(8)),
                (HospitalId(8), HospitalId(7)),
                (HospitalId(7), NIL_HOSPITAL),
            ]
        );
        // member projections in first-occurrence order
        let m0 = inst.resident(ResidentId(3)).unwrap();
        assert_eq!(m0.ranked.ordering(), &[HospitalId(7), HospitalId(8)]);
        let m1 = inst.resident(ResidentId(4)).unwrap();
        assert_eq!(m1.ranked.ordering(), &[HospitalId(8), HospitalId(7), NIL_HOSPITAL]);
    }

    #[test]
    fn append_nil_canonicalizes() {
        let text = "\
r 1 7 -1
p 7 1 1
c 2 5 6 7 7
";
        let inst = parse_problem(text, LoadOptions { append_nil: true }).unwrap();
        let r1 = inst.resident(ResidentId(1)).unwrap();
        assert_eq!(r1.ranked.ordering(), &[HospitalId(7), NIL_HOSPITAL]);
        let c = inst.couple(CoupleId(2)).unwrap();
        assert_eq!(
            c.pairs(),
            &[(HospitalId(7), HospitalId(7)), (NIL_HOSPITAL, NIL_HOSPITAL)]
        );
    }

    #[test]
    fn duplicate_resident_is_a_parse_error() {
        let text = "r 1 7\nr 1 7\np 7 1 1\n";
        let err = parse_problem(text, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn couple_member_reuse_is_a_parse_error() {
        let text = "r 5 7\np 7 2 5 6\nc 1 5 6 7 7\n";
        let err = parse_problem(text, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 3, .. }), "{err}");
    }

    #[test]
    fn unreadable_line_is_rejected() {
        let err = parse_problem("z 1 2\n", LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 1, .. }));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let text = "# header\n\n   indented note\nr 1 7\np 7 1 1\n";
        assert!(parse_problem(text, LoadOptions::default()).is_ok());
    }

    #[test]
    fn dangling_pair_token_rejected() {
        let err = parse_problem("c 1 5 6 7\n", LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 1, .. }));
    }
}
