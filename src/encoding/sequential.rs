//! Sequential counter encodings (Sinz 2005).

use super::AtMostOne;
use crate::{Cnf, Lit, LiteralPool};

/// Sequential-counter at-most-one.
///
/// Prefix flag `s[i]` is forced true once one of `x[0..=i]` is true; a
/// literal may only be true while the flag of its prefix is still false.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential;

impl AtMostOne for Sequential {
    fn encode_at_most_one(&self, lits: &[Lit], name: &str, pool: &mut LiteralPool, cnf: &mut Cnf) {
        let n = lits.len();
        if n < 2 {
            return;
        }
        let s = pool.new_literals(&format!("{}/seq", name), n - 1);
        cnf.add_implication(lits[0], s[0]);
        for i in 1..n - 1 {
            cnf.add_implication(lits[i], s[i]);
            cnf.add_implication(s[i - 1], s[i]);
            cnf.add_clause(vec![!lits[i], !s[i - 1]]);
        }
        cnf.add_clause(vec![!lits[n - 1], !s[n - 2]]);
    }
}

/// At most `k` of `lits` are true.
///
/// Register `s[i][j]` holds "at least `j + 1` of `x[0..=i]` are true"; the
/// ladder has `n - 1` rows of `k` registers.
pub fn at_most_k(lits: &[Lit], k: usize, name: &str, pool: &mut LiteralPool) -> Cnf {
    let n = lits.len();
    let mut cnf = Cnf::new();
    if k >= n {
        return cnf;
    }
    if k == 0 {
        for &x in lits {
            cnf.add_unit(!x);
        }
        return cnf;
    }

    let s: Vec<Vec<Lit>> = (0..n - 1)
        .map(|i| pool.new_literals(&format!("{}/seq{}", name, i), k))
        .collect();

    cnf.add_implication(lits[0], s[0][0]);
    for &r in &s[0][1..] {
        cnf.add_unit(!r);
    }
    for i in 1..n - 1 {
        cnf.add_implication(lits[i], s[i][0]);
        cnf.add_implication(s[i - 1][0], s[i][0]);
        for j in 1..k {
            cnf.add_clause(vec![!lits[i], !s[i - 1][j - 1], s[i][j]]);
            cnf.add_implication(s[i - 1][j], s[i][j]);
        }
        cnf.add_clause(vec![!lits[i], !s[i - 1][k - 1]]);
    }
    cnf.add_clause(vec![!lits[n - 1], !s[n - 2][k - 1]]);
    cnf
}

/// At least `k` of `lits` are true, as at most `n - k` of the negations.
///
/// A bound above `n` cannot be met and yields the empty clause.
pub fn at_least_k(lits: &[Lit], k: usize, name: &str, pool: &mut LiteralPool) -> Cnf {
    let n = lits.len();
    if k > n {
        let mut cnf = Cnf::new();
        cnf.add_clause(vec![]);
        return cnf;
    }
    if k == 0 {
        return Cnf::new();
    }
    let negated: Vec<Lit> = lits.iter().map(|&x| !x).collect();
    at_most_k(&negated, n - k, name, pool)
}

/// Exactly `k` of `lits` are true.
pub fn exactly_k(lits: &[Lit], k: usize, name: &str, pool: &mut LiteralPool) -> Cnf {
    let mut cnf = at_most_k(lits, k, &format!("{}/le", name), pool);
    cnf.append(at_least_k(lits, k, &format!("{}/ge", name), pool));
    cnf
}

#[cfg(test)]
mod tests {
    use super::super::tests::{agrees_with, sampled_assignments};
    use super::*;

    #[test]
    fn k_variants_agree_with_counting_exhaustively() {
        for n in 0..=7 {
            for k in 0..=n + 1 {
                agrees_with(n, None, |pool, lits| at_most_k(lits, k, "le", pool), |c| c <= k);
                agrees_with(n, None, |pool, lits| at_least_k(lits, k, "ge", pool), |c| c >= k);
                agrees_with(n, None, |pool, lits| exactly_k(lits, k, "eq", pool), |c| c == k);
            }
        }
    }

    #[test]
    fn k_variants_agree_with_counting_up_to_twelve() {
        for n in 8..=12 {
            let samples = sampled_assignments(n, 40, n as u64);
            for k in 0..=n {
                agrees_with(n, Some(&samples), |pool, lits| at_most_k(lits, k, "le", pool), |c| c <= k);
                agrees_with(n, Some(&samples), |pool, lits| at_least_k(lits, k, "ge", pool), |c| c >= k);
                agrees_with(n, Some(&samples), |pool, lits| exactly_k(lits, k, "eq", pool), |c| c == k);
            }
        }
    }

    #[test]
    fn trivial_bounds() {
        let mut pool = LiteralPool::new();
        let x = pool.new_literals("x", 4);
        assert!(at_most_k(&x, 4, "le", &mut pool).is_empty());
        assert!(at_most_k(&x, 9, "le", &mut pool).is_empty());
        assert!(at_least_k(&x, 0, "ge", &mut pool).is_empty());
        assert_eq!(pool.n_vars(), 4);

        let impossible = at_least_k(&x, 5, "ge", &mut pool);
        assert_eq!(impossible.len(), 1);
        assert!(impossible.iter().all(|cl| cl.lits.is_empty()));
    }

    #[test]
    fn ladder_size() {
        let mut pool = LiteralPool::new();
        let x = pool.new_literals("x", 6);
        let _ = at_most_k(&x, 2, "le", &mut pool);
        assert_eq!(pool.n_vars(), 6 + 5 * 2);
    }
}
