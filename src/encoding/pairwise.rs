use super::AtMostOne;
use crate::{Cnf, Lit, LiteralPool};

/// Naive at-most-one: one binary clause per pair of literals.
///
/// No auxiliary variables, quadratically many clauses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pairwise;

impl AtMostOne for Pairwise {
    fn encode_at_most_one(&self, lits: &[Lit], _name: &str, _pool: &mut LiteralPool, cnf: &mut Cnf) {
        encode(lits, cnf)
    }
}

pub(crate) fn encode(lits: &[Lit], cnf: &mut Cnf) {
    for (i, &a) in lits.iter().enumerate() {
        for &b in &lits[i + 1..] {
            cnf.add_clause(vec![!a, !b]);
        }
    }
}
