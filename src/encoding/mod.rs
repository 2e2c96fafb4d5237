//! Cardinality constraints as CNF.
//!
//! Every encoding draws its auxiliary variables from the [`LiteralPool`]
//! passed in, and the `name` of a request only tags those variables. Two
//! requests therefore never share auxiliaries, whatever their names.

use crate::errors::*;
use crate::{Cnf, Lit, LiteralPool};
use std::fmt;
use std::str::FromStr;

pub mod arith;
mod bitwise;
mod commander;
mod pairwise;
mod sequential;

pub use bitwise::Bitwise;
pub use commander::Commander;
pub use pairwise::Pairwise;
pub use sequential::{at_least_k, at_most_k, exactly_k, Sequential};

/// An at-most-one encoding.
pub trait AtMostOne {
    /// Add clauses to `cnf` forbidding two of `lits` from being true together.
    fn encode_at_most_one(&self, lits: &[Lit], name: &str, pool: &mut LiteralPool, cnf: &mut Cnf);
}

/// Selects one of the at-most-one encodings.
///
/// The choice only trades clauses against auxiliary variables; the
/// constraint expressed is the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// [`Pairwise`]
    Pairwise,
    /// [`Sequential`]
    Sequential,
    /// [`Bitwise`]
    Bitwise,
    /// [`Commander`]
    Commander,
}

impl Strategy {
    /// All strategies, in benchmark order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::Commander,
        Strategy::Bitwise,
        Strategy::Pairwise,
    ];

    /// Short tag used in approach names.
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::Pairwise => "np",
            Strategy::Sequential => "seq",
            Strategy::Bitwise => "bin",
            Strategy::Commander => "he",
        }
    }
}

impl AtMostOne for Strategy {
    fn encode_at_most_one(&self, lits: &[Lit], name: &str, pool: &mut LiteralPool, cnf: &mut Cnf) {
        match self {
            Strategy::Pairwise => Pairwise.encode_at_most_one(lits, name, pool, cnf),
            Strategy::Sequential => Sequential.encode_at_most_one(lits, name, pool, cnf),
            Strategy::Bitwise => Bitwise.encode_at_most_one(lits, name, pool, cnf),
            Strategy::Commander => Commander.encode_at_most_one(lits, name, pool, cnf),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pairwise" | "naive" | "np" => Ok(Strategy::Pairwise),
            "sequential" | "seq" => Ok(Strategy::Sequential),
            "bitwise" | "bw" | "bin" => Ok(Strategy::Bitwise),
            "commander" | "heule" | "he" => Ok(Strategy::Commander),
            _ => Err(format!("unknown encoding '{}'", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Pairwise => "pairwise",
            Strategy::Sequential => "sequential",
            Strategy::Bitwise => "bitwise",
            Strategy::Commander => "commander",
        };
        f.write_str(name)
    }
}

/// The disjunction of `lits`. An empty request is ill-formed.
pub fn at_least_one(lits: &[Lit]) -> Result<Cnf> {
    if lits.is_empty() {
        return Err(ErrorKind::Configuration("at-least-one over no literals".to_owned()).into());
    }
    let mut cnf = Cnf::new();
    cnf.add_clause(lits.to_vec());
    Ok(cnf)
}

/// At most one of `lits` is true.
pub fn at_most_one(lits: &[Lit], strategy: Strategy, name: &str, pool: &mut LiteralPool) -> Cnf {
    let mut cnf = Cnf::new();
    strategy.encode_at_most_one(lits, name, pool, &mut cnf);
    cnf
}

/// Exactly one of `lits` is true.
pub fn exactly_one(lits: &[Lit], strategy: Strategy, name: &str, pool: &mut LiteralPool) -> Result<Cnf> {
    let mut cnf = at_least_one(lits)
        .chain_err(|| ErrorKind::Configuration(format!("exactly-one '{}'", name)))?;
    strategy.encode_at_most_one(lits, name, pool, &mut cnf);
    Ok(cnf)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cdcl;
    use crate::oracle::Oracle;
    use crate::Solution;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use std::time::Duration;

    /// Assignments with zero, one and all literals true, plus `extra` random ones.
    pub(crate) fn sampled_assignments(n: usize, extra: usize, seed: u64) -> Vec<Vec<bool>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = vec![vec![false; n], vec![true; n]];
        for i in 0..n {
            let mut a = vec![false; n];
            a[i] = true;
            out.push(a);
        }
        for _ in 0..extra {
            let density = rng.gen_range(0.0, 0.5);
            out.push((0..n).map(|_| rng.gen_bool(density)).collect());
        }
        out
    }

    fn all_assignments(n: usize) -> Vec<Vec<bool>> {
        (0..1u64 << n)
            .map(|bits| (0..n).map(|i| (bits >> i) & 1 == 1).collect())
            .collect()
    }

    /// Checks that the encoding extends exactly the assignments of the input
    /// literals whose number of true literals satisfies `holds`.
    pub(crate) fn agrees_with<E, P>(n: usize, samples: Option<&[Vec<bool>]>, encode: E, holds: P)
    where
        E: FnOnce(&mut LiteralPool, &[Lit]) -> Cnf,
        P: Fn(usize) -> bool,
    {
        let mut pool = LiteralPool::new();
        let lits = pool.new_literals("x", n);
        let cnf = encode(&mut pool, &lits);
        let assignments = match samples {
            Some(s) => s.to_vec(),
            None => all_assignments(n),
        };

        for assignment in assignments {
            let mut solver = cdcl::Solver::default();
            solver.ensure_vars(pool.n_vars());
            solver.add_cnf(&cnf);
            for (&l, &value) in lits.iter().zip(assignment.iter()) {
                solver.add_clause(vec![if value { l } else { !l }]);
            }
            let sat = match solver.solve(Duration::from_secs(30)) {
                Solution::Sat(model) => {
                    assert!(cnf.is_satisfied(&model));
                    true
                }
                Solution::Unsat => false,
                other => panic!("oracle gave no answer: {:?}", other),
            };
            let count = assignment.iter().filter(|&&v| v).count();
            assert_eq!(sat, holds(count), "n = {}, assignment {:?}", n, assignment);
        }
    }

    #[test]
    fn at_least_one_rejects_empty_request() {
        let err = at_least_one(&[]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
        let mut pool = LiteralPool::new();
        let err = exactly_one(&[], Strategy::Sequential, "empty", &mut pool).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Configuration(_)));
    }

    #[test]
    fn at_most_one_exhaustive_for_small_sets() {
        for &strategy in &Strategy::ALL {
            for n in 0..=9 {
                agrees_with(n, None, |pool, lits| at_most_one(lits, strategy, "amo", pool), |c| c <= 1);
            }
        }
    }

    #[test]
    fn exactly_one_exhaustive_for_small_sets() {
        for &strategy in &Strategy::ALL {
            for n in 1..=9 {
                agrees_with(
                    n,
                    None,
                    |pool, lits| exactly_one(lits, strategy, "eo", pool).unwrap(),
                    |c| c == 1,
                );
            }
        }
    }

    #[test]
    fn exactly_one_sampled_up_to_fifty() {
        for &strategy in &Strategy::ALL {
            for n in (10..=50).step_by(5) {
                let samples = sampled_assignments(n, 30, n as u64);
                agrees_with(
                    n,
                    Some(&samples),
                    |pool, lits| exactly_one(lits, strategy, "eo", pool).unwrap(),
                    |c| c == 1,
                );
                agrees_with(n, Some(&samples), |pool, lits| at_most_one(lits, strategy, "amo", pool), |c| c <= 1);
            }
        }
    }

    #[test]
    fn auxiliaries_of_different_requests_are_disjoint() {
        for &strategy in &Strategy::ALL {
            let mut pool = LiteralPool::new();
            let x = pool.new_literals("x", 12);
            let first = at_most_one(&x, strategy, "a", &mut pool);
            let boundary = pool.n_vars();
            let second = at_most_one(&x[4..], strategy, "b", &mut pool);

            let aux = |cnf: &Cnf| -> HashSet<usize> {
                cnf.iter()
                    .flat_map(|cl| cl.lits.iter())
                    .map(|l| l.var().index())
                    .filter(|&v| v >= 12)
                    .collect()
            };
            let (a, b) = (aux(&first), aux(&second));
            assert!(a.is_disjoint(&b), "{} shares auxiliaries", strategy);
            assert!(a.iter().all(|&v| v < boundary));
            assert!(b.iter().all(|&v| v >= boundary));
        }
    }

    #[test]
    fn re_encoding_is_deterministic() {
        for &strategy in &Strategy::ALL {
            let encode = || {
                let mut pool = LiteralPool::new();
                let x = pool.new_literals("x", 17);
                let cnf = exactly_one(&x, strategy, "eo", &mut pool).unwrap();
                (cnf, pool.n_vars())
            };
            assert_eq!(encode(), encode());
        }
        let encode_k = || {
            let mut pool = LiteralPool::new();
            let x = pool.new_literals("x", 9);
            exactly_k(&x, 4, "k", &mut pool)
        };
        assert_eq!(encode_k(), encode_k());
    }

    #[test]
    fn size_trade_offs() {
        let n = 32;
        let sizes: Vec<(Strategy, usize, usize)> = Strategy::ALL
            .iter()
            .map(|&strategy| {
                let mut pool = LiteralPool::new();
                let x = pool.new_literals("x", n);
                let cnf = at_most_one(&x, strategy, "amo", &mut pool);
                (strategy, cnf.len(), pool.n_vars() - n)
            })
            .collect();
        for (strategy, clauses, aux) in sizes {
            match strategy {
                Strategy::Pairwise => assert_eq!((clauses, aux), (n * (n - 1) / 2, 0)),
                Strategy::Sequential => assert_eq!((clauses, aux), (3 * n - 4, n - 1)),
                Strategy::Bitwise => assert_eq!((clauses, aux), (n * 5, 5)),
                Strategy::Commander => {
                    assert!(clauses < 3 * n, "commander used {} clauses", clauses);
                    assert!(aux < n);
                }
            }
        }
    }

    #[test]
    fn strategy_names_round_trip() {
        for &strategy in &Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>(), Ok(strategy));
            assert_eq!(strategy.tag().parse::<Strategy>(), Ok(strategy));
        }
        assert_eq!("heule".parse::<Strategy>(), Ok(Strategy::Commander));
        assert!("totalizer".parse::<Strategy>().is_err());
    }
}
