use std::fmt;
use std::io::Write;
use std::ops::Not;

/// A variable.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Var(usize);

impl Var {
    /// Create new var
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the actual value stored inside that can be used to index arrays.
    pub fn index(self) -> usize {
        self.0
    }

    /// Create positive literal from variable.
    pub fn pos(self) -> Lit {
        Lit::new(self, false)
    }

    /// Create negative literal from variable.
    pub fn neg(self) -> Lit {
        Lit::new(self, true)
    }
}

/// A literal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Lit(usize);

/// Placeholder Lit
pub(crate) const UNDEF_LIT: Lit = Lit(usize::MAX);

impl Lit {
    /// Returns true if literal is signed (i.e. a negated literal).
    pub fn sign(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns the var corresponding to the literal.
    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// Returns the actual value stored inside that can be used to index arrays.
    pub(crate) fn index(self) -> usize {
        self.0
    }

    /// Create lit from var and sign
    pub fn new(var: Var, sign: bool) -> Lit {
        Lit(var.0 + var.0 + (sign as usize))
    }

    /// Returns the truth value of the literal under a complete model.
    pub fn eval(self, model: &[bool]) -> bool {
        model[self.var().index()] != self.sign()
    }

    /// Signed, 1-based DIMACS representation.
    pub fn to_dimacs(self) -> i64 {
        let v = self.var().index() as i64 + 1;
        if self.sign() {
            -v
        } else {
            v
        }
    }
}

impl Not for Lit {
    type Output = Self;

    /// Returns x for -x and -x for x.
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// A Lifted boolean.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LBool {
    /// Represents True.
    True,
    /// Represents False.
    False,
    /// Represents neither True nor False, usually used when variable is unassigned.
    Undef,
}

impl Not for LBool {
    type Output = Self;

    /// Returns True for False and False for True.
    /// If the input is Undef, then Undef is returned.
    fn not(self) -> Self {
        match self {
            LBool::True => LBool::False,
            LBool::False => LBool::True,
            LBool::Undef => LBool::Undef,
        }
    }
}

impl From<bool> for LBool {
    /// Convert bool to LBool.
    fn from(b: bool) -> Self {
        if b {
            LBool::True
        } else {
            LBool::False
        }
    }
}

/// A Clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    /// A vector of literals forming the clause.
    pub lits: Vec<Lit>,
}

impl Clause {
    /// Returns true if some literal of the clause holds under `model`.
    pub fn is_satisfied(&self, model: &[bool]) -> bool {
        self.lits.iter().any(|l| l.eval(model))
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(lits: Vec<Lit>) -> Self {
        Clause { lits }
    }
}

/// A formula in conjunctive normal form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    /// Create an empty formula, which is trivially true.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause.
    pub fn add_clause(&mut self, lits: Vec<Lit>) {
        self.clauses.push(Clause { lits });
    }

    /// Add a unit clause.
    pub fn add_unit(&mut self, lit: Lit) {
        self.add_clause(vec![lit]);
    }

    /// Add the binary clause `a -> b`.
    pub fn add_implication(&mut self, a: Lit, b: Lit) {
        self.add_clause(vec![!a, b]);
    }

    /// Move all clauses of `other` to the end of this formula.
    pub fn append(&mut self, other: Cnf) {
        self.clauses.extend(other.clauses);
    }

    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if the formula has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterate over the clauses.
    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    /// Returns the largest variable index mentioned plus one.
    pub fn n_vars(&self) -> usize {
        self.clauses
            .iter()
            .flat_map(|cl| cl.lits.iter())
            .map(|l| l.var().index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Verify that every clause is satisfied by the model.
    pub fn is_satisfied(&self, model: &[bool]) -> bool {
        self.clauses.iter().all(|cl| cl.is_satisfied(model))
    }

    /// Write the formula in DIMACS format.
    pub fn write_dimacs<W: Write>(&self, n_vars: usize, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "p cnf {} {}", n_vars, self.clauses.len())?;
        for cl in &self.clauses {
            for l in &cl.lits {
                write!(writer, "{} ", l)?;
            }
            writeln!(writer, "0")?;
        }
        Ok(())
    }
}

impl IntoIterator for Cnf {
    type Item = Clause;
    type IntoIter = std::vec::IntoIter<Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.into_iter()
    }
}

impl<'a> IntoIterator for &'a Cnf {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}

/// Answer of a satisfiability oracle.
#[derive(Debug, PartialEq)]
pub enum Solution {
    /// The formula is unsatisfiable.
    Unsat,
    /// Neither SAT or UNSAT was proven. Best model known so far.
    Best(Vec<bool>),
    /// The formula is satisfiable. A satifying model for the formula.
    Sat(Vec<bool>),
    /// No answer within the time budget.
    Unknown,
}

/// Errors module.
#[allow(missing_docs)]
pub mod errors {
    error_chain::error_chain! {
        errors {
            Configuration(msg: String) {
                description("ill-formed constraint request")
                display("configuration error: {}", msg)
            }
            MalformedInstance(msg: String) {
                description("malformed instance")
                display("malformed instance: {}", msg)
            }
            InfeasibleInstance(msg: String) {
                description("infeasible instance")
                display("infeasible instance: {}", msg)
            }
            DecodingInconsistency(msg: String) {
                description("model does not decode to a valid route plan")
                display("decoding inconsistency: {}", msg)
            }
        }

        foreign_links {
            Io(std::io::Error);
            ParseIntError(std::num::ParseIntError);
            Json(serde_json::Error);
            Regex(regex::Error);
        }
    }
}
