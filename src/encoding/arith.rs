//! Tseitin-encoded arithmetic over little-endian bit-vectors of literals.
//!
//! Every gate is a full equivalence, so the value of each output bit is a
//! function of the input bits in any model of the formula. Constant inputs
//! are folded and never reach the clause set.

use crate::{Cnf, Lit, LiteralPool};
use std::collections::VecDeque;
use std::ops::Not;

/// A boolean signal: a literal or a known constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Known truth value.
    Const(bool),
    /// The value of a literal.
    Lit(Lit),
}

impl Signal {
    /// Truth value under a complete model.
    pub fn eval(self, model: &[bool]) -> bool {
        match self {
            Signal::Const(b) => b,
            Signal::Lit(l) => l.eval(model),
        }
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Signal::Const(b) => Signal::Const(!b),
            Signal::Lit(l) => Signal::Lit(!l),
        }
    }
}

impl From<Lit> for Signal {
    fn from(l: Lit) -> Self {
        Signal::Lit(l)
    }
}

impl From<bool> for Signal {
    fn from(b: bool) -> Self {
        Signal::Const(b)
    }
}

/// Bit-vector of a non-negative constant, without leading zeros.
pub fn constant(mut value: u64) -> Vec<Signal> {
    let mut bits = vec![];
    while value != 0 {
        bits.push(Signal::Const(value & 1 == 1));
        value >>= 1;
    }
    bits
}

/// Unsigned value of a bit-vector under a complete model.
pub fn value(bits: &[Signal], model: &[bool]) -> u64 {
    bits.iter()
        .enumerate()
        .filter(|(_, b)| b.eval(model))
        .map(|(i, _)| 1u64 << i)
        .sum()
}

fn trimmed(mut bits: Vec<Signal>) -> Vec<Signal> {
    while bits.last() == Some(&Signal::Const(false)) {
        bits.pop();
    }
    bits
}

fn bit(bits: &[Signal], i: usize) -> Signal {
    bits.get(i).copied().unwrap_or(Signal::Const(false))
}

/// Builds gates into a formula, drawing gate outputs from a pool.
pub struct Circuit<'a> {
    pool: &'a mut LiteralPool,
    cnf: &'a mut Cnf,
    scope: String,
    gates: usize,
}

impl<'a> Circuit<'a> {
    /// Gate outputs are tagged `scope/t0`, `scope/t1`, ...
    pub fn new(pool: &'a mut LiteralPool, cnf: &'a mut Cnf, scope: &str) -> Self {
        Circuit {
            pool,
            cnf,
            scope: scope.to_owned(),
            gates: 0,
        }
    }

    /// Number of gate outputs allocated so far.
    pub fn gates(&self) -> usize {
        self.gates
    }

    fn fresh(&mut self) -> Lit {
        let l = self.pool.new_literal(&format!("{}/t{}", self.scope, self.gates));
        self.gates += 1;
        l
    }

    /// `a ∧ b`
    pub fn and(&mut self, a: Signal, b: Signal) -> Signal {
        match (a, b) {
            (Signal::Const(false), _) | (_, Signal::Const(false)) => Signal::Const(false),
            (Signal::Const(true), x) | (x, Signal::Const(true)) => x,
            (Signal::Lit(x), Signal::Lit(y)) => {
                if x == y {
                    return a;
                }
                if x == !y {
                    return Signal::Const(false);
                }
                let z = self.fresh();
                self.cnf.add_implication(z, x);
                self.cnf.add_implication(z, y);
                self.cnf.add_clause(vec![!x, !y, z]);
                Signal::Lit(z)
            }
        }
    }

    /// `a ∨ b`
    pub fn or(&mut self, a: Signal, b: Signal) -> Signal {
        !self.and(!a, !b)
    }

    /// `a ⊕ b`
    pub fn xor(&mut self, a: Signal, b: Signal) -> Signal {
        match (a, b) {
            (Signal::Const(c), x) | (x, Signal::Const(c)) => {
                if c {
                    !x
                } else {
                    x
                }
            }
            (Signal::Lit(x), Signal::Lit(y)) => {
                if x == y {
                    return Signal::Const(false);
                }
                if x == !y {
                    return Signal::Const(true);
                }
                let z = self.fresh();
                self.cnf.add_clause(vec![!x, !y, !z]);
                self.cnf.add_clause(vec![x, y, !z]);
                self.cnf.add_clause(vec![x, !y, z]);
                self.cnf.add_clause(vec![!x, y, z]);
                Signal::Lit(z)
            }
        }
    }

    /// Returns `(sum, carry)` of three bits.
    pub fn full_adder(&mut self, a: Signal, b: Signal, c: Signal) -> (Signal, Signal) {
        let t = self.xor(a, b);
        let sum = self.xor(t, c);
        let ab = self.and(a, b);
        let tc = self.and(t, c);
        let carry = self.or(ab, tc);
        (sum, carry)
    }

    /// Ripple-carry sum of two bit-vectors.
    pub fn add(&mut self, a: &[Signal], b: &[Signal]) -> Vec<Signal> {
        let width = a.len().max(b.len());
        let mut out = Vec::with_capacity(width + 1);
        let mut carry = Signal::Const(false);
        for i in 0..width {
            let (s, c) = self.full_adder(bit(a, i), bit(b, i), carry);
            out.push(s);
            carry = c;
        }
        out.push(carry);
        trimmed(out)
    }

    /// `Σ w·x` over the terms, summed by a balanced tree of adders.
    pub fn weighted_sum(&mut self, terms: &[(u64, Lit)]) -> Vec<Signal> {
        let mut queue: VecDeque<Vec<Signal>> = terms
            .iter()
            .filter(|(w, _)| *w != 0)
            .map(|&(w, x)| {
                constant(w)
                    .into_iter()
                    .map(|b| if b == Signal::Const(true) { Signal::Lit(x) } else { b })
                    .collect()
            })
            .collect();
        while queue.len() > 1 {
            if let (Some(a), Some(b)) = (queue.pop_front(), queue.pop_front()) {
                let sum = self.add(&a, &b);
                queue.push_back(sum);
            }
        }
        queue.pop_front().unwrap_or_default()
    }

    /// Signal for `value(a) < value(b)`, compared from the low bit up.
    pub fn less_than(&mut self, a: &[Signal], b: &[Signal]) -> Signal {
        let mut lt = Signal::Const(false);
        for i in 0..a.len().max(b.len()) {
            let (x, y) = (bit(a, i), bit(b, i));
            let strictly = self.and(!x, y);
            let diff = self.xor(x, y);
            let carried = self.and(!diff, lt);
            lt = self.or(strictly, carried);
        }
        lt
    }

    /// Force `s` to hold. A constant false yields the empty clause.
    pub fn assert(&mut self, s: Signal) {
        match s {
            Signal::Const(true) => {}
            Signal::Const(false) => self.cnf.add_clause(vec![]),
            Signal::Lit(l) => self.cnf.add_unit(l),
        }
    }

    /// Force `value(a) ≥ 1`.
    pub fn assert_nonzero(&mut self, a: &[Signal]) {
        if a.contains(&Signal::Const(true)) {
            return;
        }
        let clause = a
            .iter()
            .filter_map(|&s| match s {
                Signal::Lit(l) => Some(l),
                Signal::Const(_) => None,
            })
            .collect();
        self.cnf.add_clause(clause);
    }

    /// Force `value(a) ≤ c`.
    ///
    /// For every bit `i` with `c_i = 0`: `¬a_i ∨ ⋁_{j>i, c_j=1} ¬a_j`. An
    /// unreachable bound yields the empty clause.
    pub fn assert_at_most(&mut self, a: &[Signal], c: u64) {
        if a.len() < 64 && c >> a.len() != 0 {
            return;
        }
        let c_bit = |j: usize| j < 64 && (c >> j) & 1 == 1;
        for i in (0..a.len()).filter(|&i| !c_bit(i)) {
            let mut clause = vec![];
            let mut satisfied = false;
            for j in std::iter::once(i).chain((i + 1..a.len()).filter(|&j| c_bit(j))) {
                match !a[j] {
                    Signal::Const(true) => satisfied = true,
                    Signal::Const(false) => {}
                    Signal::Lit(l) => clause.push(l),
                }
            }
            if !satisfied {
                self.cnf.add_clause(clause);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdcl;
    use crate::oracle::Oracle;
    use crate::Solution;
    use std::time::Duration;

    fn inputs(pool: &mut LiteralPool, name: &str, width: usize) -> Vec<Signal> {
        pool.new_literals(name, width).into_iter().map(Signal::Lit).collect()
    }

    /// Solve `cnf` with the input bits fixed to `values`.
    fn solve_fixed(pool: &LiteralPool, cnf: &Cnf, fixed: &[(&[Signal], u64)]) -> Option<Vec<bool>> {
        let mut solver = cdcl::Solver::default();
        solver.ensure_vars(pool.n_vars());
        solver.add_cnf(cnf);
        for &(bits, v) in fixed {
            for (i, &b) in bits.iter().enumerate() {
                if let Signal::Lit(l) = b {
                    solver.add_clause(vec![if (v >> i) & 1 == 1 { l } else { !l }]);
                }
            }
        }
        match solver.solve(Duration::from_secs(30)) {
            Solution::Sat(model) => {
                assert!(cnf.is_satisfied(&model));
                Some(model)
            }
            Solution::Unsat => None,
            other => panic!("oracle gave no answer: {:?}", other),
        }
    }

    #[test]
    fn constants_fold_without_clauses() {
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let x = Signal::Lit(pool.new_literal("x"));
        let mut c = Circuit::new(&mut pool, &mut cnf, "c");
        assert_eq!(c.and(x, Signal::Const(true)), x);
        assert_eq!(c.and(x, Signal::Const(false)), Signal::Const(false));
        assert_eq!(c.or(x, Signal::Const(true)), Signal::Const(true));
        assert_eq!(c.xor(x, Signal::Const(true)), !x);
        assert_eq!(c.xor(x, x), Signal::Const(false));
        assert_eq!(c.and(x, !x), Signal::Const(false));
        assert_eq!(c.add(&constant(5), &constant(6)), constant(11));
        assert_eq!(c.gates(), 0);
        assert!(cnf.is_empty());
    }

    #[test]
    fn adder_agrees_with_integer_addition() {
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let a = inputs(&mut pool, "a", 3);
        let b = inputs(&mut pool, "b", 2);
        let sum = Circuit::new(&mut pool, &mut cnf, "add").add(&a, &b);
        for x in 0..8 {
            for y in 0..4 {
                let model = solve_fixed(&pool, &cnf, &[(&a[..], x), (&b[..], y)]).unwrap();
                assert_eq!(value(&sum, &model), x + y);
            }
        }
    }

    #[test]
    fn weighted_sum_agrees_with_integer_arithmetic() {
        let weights = [3u64, 0, 5, 1, 7];
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let xs = pool.new_literals("x", weights.len());
        let terms: Vec<(u64, Lit)> = weights.iter().copied().zip(xs.iter().copied()).collect();
        let sum = Circuit::new(&mut pool, &mut cnf, "ws").weighted_sum(&terms);
        let bits: Vec<Signal> = xs.iter().map(|&l| Signal::Lit(l)).collect();
        for mask in 0..1u64 << weights.len() {
            let model = solve_fixed(&pool, &cnf, &[(&bits[..], mask)]).unwrap();
            let expected: u64 = (0..weights.len())
                .filter(|i| (mask >> i) & 1 == 1)
                .map(|i| weights[i])
                .sum();
            assert_eq!(value(&sum, &model), expected);
        }

        let mut c = Circuit::new(&mut pool, &mut cnf, "empty");
        assert!(c.weighted_sum(&[]).is_empty());
    }

    #[test]
    fn comparator_agrees_with_integer_order() {
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let a = inputs(&mut pool, "a", 3);
        let b = inputs(&mut pool, "b", 3);
        let lt = Circuit::new(&mut pool, &mut cnf, "lt").less_than(&a, &b);
        for x in 0..8 {
            for y in 0..8 {
                let model = solve_fixed(&pool, &cnf, &[(&a[..], x), (&b[..], y)]).unwrap();
                assert_eq!(lt.eval(&model), x < y, "{} < {}", x, y);
            }
        }
    }

    #[test]
    fn upper_bound_agrees_with_integer_order() {
        for c in 0..10u64 {
            let mut pool = LiteralPool::new();
            let mut cnf = Cnf::new();
            let a = inputs(&mut pool, "a", 3);
            Circuit::new(&mut pool, &mut cnf, "le").assert_at_most(&a[..], c);
            for x in 0..8 {
                let sat = solve_fixed(&pool, &cnf, &[(&a[..], x)]).is_some();
                assert_eq!(sat, x <= c, "{} <= {}", x, c);
            }
        }
    }

    #[test]
    fn upper_bound_on_constants() {
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let mut c = Circuit::new(&mut pool, &mut cnf, "le");
        c.assert_at_most(&constant(6), 6);
        c.assert_at_most(&constant(6), 9);
        assert!(cnf.is_empty());

        let mut c = Circuit::new(&mut pool, &mut cnf, "le");
        c.assert_at_most(&constant(6), 5);
        assert!(cnf.iter().any(|cl| cl.lits.is_empty()));
    }

    #[test]
    fn nonzero_and_assert() {
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();
        let a = inputs(&mut pool, "a", 2);
        let mut c = Circuit::new(&mut pool, &mut cnf, "nz");
        c.assert_nonzero(&a);
        c.assert(Signal::Const(true));
        assert_eq!(cnf.len(), 1);
        assert!(solve_fixed(&pool, &cnf, &[(&a[..], 0)]).is_none());
        assert!(solve_fixed(&pool, &cnf, &[(&a[..], 2)]).is_some());
    }
}
