// crates/smc_io/src/matching.rs
//
// Matching files: optional `# <comment>` header, then `m 1` (`m 0` when the
// matching is empty) and one `r <resident_uid> <hospital_uid|-1>` line per
// recorded resident.

use crate::IoError;
use smc_core::ids::{HospitalId, ResidentId};
use smc_core::instance::Matching;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Read a matching file; `-1` maps to the nil sentinel.
pub fn load_matching(path: &Path) -> Result<Matching, IoError> {
    let text = fs::read_to_string(path)
        .map_err(|source| IoError::Read { path: path.to_path_buf(), source })?;
    parse_matching(&text)
}

pub fn parse_matching(text: &str) -> Result<Matching, IoError> {
    let mut matching = Matching::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let items: Vec<&str> = line.split_whitespace().collect();
        if items[0] != "r" {
            continue; // header (`m 0` / `m 1`) and anything else
        }
        if items.len() < 3 {
            return Err(IoError::parse(line_no, "matching line needs a resident and a program"));
        }
        let r: ResidentId = items[1]
            .parse()
            .map_err(|_| IoError::parse(line_no, format!("bad resident uid: {}", items[1])))?;
        let h = HospitalId::parse_token(items[2])
            .map_err(|_| IoError::parse(line_no, format!("bad program uid: {}", items[2])))?;
        matching.insert(r, h);
    }
    Ok(matching)
}

/// Write a matching file. Entries come out in ascending resident uid.
pub fn write_matching(
    matching: &Matching,
    path: &Path,
    header: Option<&str>,
) -> Result<(), IoError> {
    let text = render_matching(matching, header);
    fs::write(path, text).map_err(|source| IoError::Write { path: path.to_path_buf(), source })
}

pub fn render_matching(matching: &Matching, header: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(h) = header {
        out.push_str("# ");
        out.push_str(h);
        out.push('\n');
    }
    if matching.is_empty() {
        out.push_str("m 0\n");
        return out;
    }
    out.push_str("m 1\n");
    for (&r, &h) in matching {
        let _ = writeln!(out, "r {} {}", r, h.wire_token());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use smc_core::ids::NIL_HOSPITAL;

    #[test]
    fn round_trip() {
        let mut m = Matching::new();
        m.insert(ResidentId(2), HospitalId(7));
        m.insert(ResidentId(5), NIL_HOSPITAL);
        let text = render_matching(&m, Some("solved"));
        assert_eq!(text, "# solved\nm 1\nr 2 7\nr 5 -1\n");
        let back = parse_matching(&text).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn empty_matching() {
        let text = render_matching(&Matching::new(), None);
        assert_eq!(text, "m 0\n");
        assert!(parse_matching(&text).unwrap().is_empty());
    }
}
