use crate::{cdcl, sls, Cnf, Lit, Solution};
use std::time::Duration;

/// A decision procedure for propositional satisfiability.
///
/// The oracle owns the clause set; callers only ever add to it. `solve` may
/// be called repeatedly and must return within roughly `budget`, answering
/// [`Solution::Unknown`] (or [`Solution::Best`] for incomplete methods) when
/// it runs out of time.
pub trait Oracle {
    /// Make sure variables `0..n_vars` exist.
    fn ensure_vars(&mut self, n_vars: usize);

    /// Add a clause.
    fn add_clause(&mut self, lits: Vec<Lit>);

    /// Decide the current clause set.
    fn solve(&mut self, budget: Duration) -> Solution;

    /// Add every clause of `cnf`.
    fn add_cnf(&mut self, cnf: &Cnf) {
        for cl in cnf {
            self.add_clause(cl.lits.clone());
        }
    }
}

/// Which oracle implementation to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleKind {
    /// Complete conflict-driven clause learning.
    Cdcl,
    /// Incomplete probSAT local search.
    Sls,
}

impl OracleKind {
    /// All kinds, in benchmark order.
    pub const ALL: [OracleKind; 2] = [OracleKind::Cdcl, OracleKind::Sls];

    /// Short tag used in approach names.
    pub fn tag(self) -> &'static str {
        match self {
            OracleKind::Cdcl => "cdcl",
            OracleKind::Sls => "wsat",
        }
    }
}

impl std::str::FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cdcl" => Ok(OracleKind::Cdcl),
            "sls" | "wsat" => Ok(OracleKind::Sls),
            _ => Err(format!("unknown oracle '{}'", s)),
        }
    }
}

/// A fresh oracle of the given kind with default options.
///
/// `seed` only affects the local search.
pub fn new_oracle(kind: OracleKind, seed: u64) -> Box<dyn Oracle> {
    match kind {
        OracleKind::Cdcl => Box::new(cdcl::Solver::default()),
        OracleKind::Sls => Box::new(sls::Solver::new(sls::SolverOptions {
            seed,
            ..sls::SolverOptions::default()
        })),
    }
}
