// crates/smc_encode/src/lp.rs
//
// LP expression tree and CPLEX-LP renderer. No semantic simplification
// happens anywhere here; the renderer is a straightforward pretty-printer.
// Coefficients are integers — every coefficient this encoder produces is
// ±1 or ±capacity — which keeps the rendered text free of float formatting.

use std::fmt::Write;

/// `coeff · variable`, where either part may be absent (but not both).
/// A term is negative iff it has a coefficient and that coefficient is
/// negative; a bare variable is positive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub coeff: Option<i64>,
    pub var: Option<String>,
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term { coeff: None, var: Some(name.into()) }
    }

    pub fn coeff_var(coeff: i64, name: impl Into<String>) -> Self {
        Term { coeff: Some(coeff), var: Some(name.into()) }
    }

    pub fn constant(value: i64) -> Self {
        Term { coeff: Some(value), var: None }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.coeff, Some(c) if c < 0)
    }

    pub fn render(&self) -> String {
        match (&self.coeff, &self.var) {
            (Some(c), Some(v)) => format!("{c} {v}"),
            (None, Some(v)) => v.clone(),
            (Some(c), None) => c.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Render with the sign flipped (used after an explicit ` - ` join).
    pub fn render_negation(&self) -> String {
        match (&self.coeff, &self.var) {
            (Some(c), Some(v)) => format!("{} {v}", -c),
            (None, Some(v)) => format!("-{v}"),
            (Some(c), None) => (-c).to_string(),
            (None, None) => String::new(),
        }
    }
}

/// An ordered sum of terms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expr {
    pub terms: Vec<Term>,
}

impl Expr {
    pub fn new(terms: Vec<Term>) -> Self {
        Expr { terms }
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// First term verbatim, then ` + ` / ` - ` joins; a negated term flips
    /// its sign on render so the output reads `a - 2 b`, never `a + -2 b`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut terms = self.terms.iter();
        let Some(first) = terms.next() else {
            return out;
        };
        out.push_str(&first.render());
        for term in terms {
            if term.is_negative() {
                let _ = write!(out, " - {}", term.render_negation());
            } else {
                let _ = write!(out, " + {}", term.render());
            }
        }
        out
    }
}

/// `=` or `≤` row: named expression on the left, single term on the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Equality,
    Inequality,
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub lhs: Expr,
    pub rhs: Term,
}

impl Constraint {
    pub fn render(&self) -> String {
        let op = match self.kind {
            ConstraintKind::Equality => "=",
            ConstraintKind::Inequality => "<=",
        };
        format!("{}: {} {op} {}", self.name, self.lhs.render(), self.rhs.render())
    }
}

/// A constraint collection with its own name counter: anonymous rows are
/// named `c0, c1, …` in emission order, reproducibly per collection (the
/// counter is scoped here, not process-wide).
#[derive(Debug, Default)]
pub struct ConstraintSet {
    pub constraints: Vec<Constraint>,
    next_name: u64,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_name(&mut self) -> String {
        let name = format!("c{}", self.next_name);
        self.next_name += 1;
        name
    }

    pub fn push_eq(&mut self, lhs: Expr, rhs: Term) {
        let name = self.allocate_name();
        self.constraints.push(Constraint { name, kind: ConstraintKind::Equality, lhs, rhs });
    }

    pub fn push_le(&mut self, lhs: Expr, rhs: Term) {
        let name = self.allocate_name();
        self.constraints.push(Constraint { name, kind: ConstraintKind::Inequality, lhs, rhs });
    }

    pub fn push_named(&mut self, name: impl Into<String>, kind: ConstraintKind, lhs: Expr, rhs: Term) {
        self.constraints.push(Constraint { name: name.into(), kind, lhs, rhs });
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, c) in self.constraints.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&c.render());
        }
        out
    }
}

/// A bound endpoint: finite or ±infinity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundValue {
    Finite(i64),
    Infinity,
    NegInfinity,
}

impl BoundValue {
    fn render(self) -> String {
        match self {
            BoundValue::Finite(v) => v.to_string(),
            BoundValue::Infinity => "+inf".to_string(),
            BoundValue::NegInfinity => "-inf".to_string(),
        }
    }
}

/// Per-variable bound line. Presence is `Option`-based, so a lower bound of
/// zero is still a bound.
#[derive(Clone, Debug)]
pub struct Bound {
    pub var: String,
    pub lb: Option<BoundValue>,
    pub ub: Option<BoundValue>,
}

impl Bound {
    pub fn render(&self) -> String {
        match (&self.lb, &self.ub) {
            (Some(lb), Some(ub)) => {
                format!("{} <= {} <= {}", lb.render(), self.var, ub.render())
            }
            (Some(lb), None) => format!("{} <= {}", lb.render(), self.var),
            (None, Some(ub)) => format!("{} <= {}", self.var, ub.render()),
            (None, None) => self.var.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BoundsBlock {
    pub bounds: Vec<Bound>,
}

impl BoundsBlock {
    pub fn push(&mut self, var: impl Into<String>, lb: Option<BoundValue>, ub: Option<BoundValue>) {
        self.bounds.push(Bound { var: var.into(), lb, ub });
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, b) in self.bounds.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&b.render());
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// A full LP file: objective, rows, bounds, binary declarations.
#[derive(Debug)]
pub struct LpProblem {
    pub sense: Sense,
    pub objective: Expr,
    pub constraints: ConstraintSet,
    pub bounds: Option<BoundsBlock>,
    pub binaries: Vec<String>,
}

impl LpProblem {
    /// Standard CPLEX LP layout: `Maximize`/`Minimize`, `obj:`, `Subject To`,
    /// `Bounds`, `Binaries`, `End`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(match self.sense {
            Sense::Maximize => "Maximize\n",
            Sense::Minimize => "Minimize\n",
        });
        let _ = writeln!(out, "obj: {}", self.objective.render());
        if !self.constraints.is_empty() {
            let _ = writeln!(out, "Subject To\n{}", self.constraints.render());
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.bounds.is_empty() {
                let _ = writeln!(out, "Bounds\n{}", bounds.render());
            }
        }
        if !self.binaries.is_empty() {
            let _ = writeln!(out, "Binaries\n{}", self.binaries.join("\n"));
        }
        out.push_str("End\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_signs() {
        assert!(!Term::var("x").is_negative());
        assert!(!Term::coeff_var(2, "x").is_negative());
        assert!(Term::coeff_var(-2, "x").is_negative());
        assert_eq!(Term::coeff_var(-2, "x").render_negation(), "2 x");
        assert_eq!(Term::var("x").render_negation(), "-x");
    }

    #[test]
    fn expression_joins_with_explicit_subtraction() {
        let e = Expr::new(vec![
            Term::var("a"),
            Term::coeff_var(-3, "b"),
            Term::coeff_var(2, "c"),
            Term::constant(-1),
        ]);
        assert_eq!(e.render(), "a - 3 b + 2 c - 1");
    }

    #[test]
    fn leading_negative_term_renders_verbatim() {
        let e = Expr::new(vec![Term::coeff_var(-1, "x"), Term::var("y")]);
        assert_eq!(e.render(), "-1 x + y");
    }

    #[test]
    fn constraint_names_are_scoped_to_the_collection() {
        let mut a = ConstraintSet::new();
        a.push_eq(Expr::new(vec![Term::var("x")]), Term::constant(1));
        a.push_le(Expr::new(vec![Term::var("y")]), Term::constant(2));
        assert_eq!(a.constraints[0].name, "c0");
        assert_eq!(a.constraints[1].name, "c1");

        // A second collection restarts the numbering.
        let mut b = ConstraintSet::new();
        b.push_le(Expr::new(vec![Term::var("z")]), Term::constant(0));
        assert_eq!(b.constraints[0].name, "c0");
    }

    #[test]
    fn constraint_renders() {
        let mut set = ConstraintSet::new();
        set.push_le(
            Expr::new(vec![Term::var("x"), Term::coeff_var(-2, "y")]),
            Term::constant(-2),
        );
        assert_eq!(set.render(), "c0: x - 2 y <= -2");
    }

    #[test]
    fn zero_lower_bound_still_renders() {
        let b = Bound { var: "x".into(), lb: Some(BoundValue::Finite(0)), ub: None };
        assert_eq!(b.render(), "0 <= x");
        let b = Bound {
            var: "y".into(),
            lb: Some(BoundValue::NegInfinity),
            ub: Some(BoundValue::Infinity),
        };
        assert_eq!(b.render(), "-inf <= y <= +inf");
    }

    #[test]
    fn full_problem_layout() {
        let mut constraints = ConstraintSet::new();
        constraints.push_eq(Expr::new(vec![Term::var("x"), Term::var("y")]), Term::constant(1));
        let problem = LpProblem {
            sense: Sense::Maximize,
            objective: Expr::new(vec![Term::var("x")]),
            constraints,
            bounds: None,
            binaries: vec!["x".into(), "y".into()],
        };
        assert_eq!(
            problem.render(),
            "Maximize\nobj: x\nSubject To\nc0: x + y = 1\nBinaries\nx\ny\nEnd\n"
        );
    }
}
