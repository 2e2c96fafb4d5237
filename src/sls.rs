use crate::oracle::Oracle;
use crate::*;
use log::trace;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Magic numbers used by local search.
const C_MAKE: f32 = 0.5;
const C_BREAK: f32 = 3.7;

/// Scoring function type.
#[derive(Clone, Copy, Debug)]
pub enum ScoreFnType {
    /// Choose flip variable randomly.
    Rand,
    /// Use polynomial scoring function.
    Poly,
    /// Use exponential scoring function.
    Exp,
    /// Cutom scoring function of `(make_count, break_count)`.
    Custom(fn(i32, i32) -> f32),
}

/// Local search options.
#[derive(Clone, Copy, Debug)]
pub struct SolverOptions {
    /// Flips before the model is re-randomised.
    pub max_flips: u32,
    /// How flip candidates are scored.
    pub score_fn_type: ScoreFnType,
    /// Evaluate clauses on the rayon thread pool.
    pub parallel: bool,
    /// Seed of the random generator.
    pub seed: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_flips: 10_000,
            score_fn_type: ScoreFnType::Exp,
            parallel: false,
            seed: 0,
        }
    }
}

/// SLS Solver based on probSAT.
///
/// The search is incomplete: it can find models but never proves
/// unsatisfiability, except for the trivial case of an empty clause.
pub struct Solver {
    num_vars: usize,
    clauses: Vec<Clause>,
    options: SolverOptions,
    rng: StdRng,
}

impl Solver {
    /// Create an empty formula.
    pub fn new(options: SolverOptions) -> Self {
        Solver {
            num_vars: 0,
            clauses: vec![],
            options,
            rng: StdRng::seed_from_u64(options.seed),
        }
    }

    /// Returns the number of variables in the formula.
    pub fn n_vars(&self) -> usize {
        self.num_vars
    }

    /// Returns the number of clauses in the formula.
    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn count_unsat(&self, model: &[bool], clause_unsat: &mut [u32]) -> usize {
        let eval = |(cl, cl_us): (&Clause, &mut u32)| {
            let unsat = if cl.is_satisfied(model) { 0 } else { 1 };
            *cl_us = unsat;
            unsat as usize
        };
        if self.options.parallel {
            self.clauses.par_iter().zip(clause_unsat.par_iter_mut()).map(eval).sum()
        } else {
            self.clauses.iter().zip(clause_unsat.iter_mut()).map(eval).sum()
        }
    }

    /// Returns `(break_count, make_count)` of the current model against the
    /// clause states recorded in `clause_unsat`.
    fn break_make(&self, model: &[bool], clause_unsat: &[u32]) -> (i32, i32) {
        let diff = |(cl, cl_us): (&Clause, &u32)| {
            let cl_unsat = if cl.is_satisfied(model) { 0 } else { 1 };
            if cl_unsat != *cl_us {
                if cl_unsat == 1 {
                    (1, 0)
                } else {
                    (0, 1)
                }
            } else {
                (0, 0)
            }
        };
        if self.options.parallel {
            self.clauses
                .par_iter()
                .zip(clause_unsat.par_iter())
                .map(diff)
                .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        } else {
            self.clauses
                .iter()
                .zip(clause_unsat.iter())
                .map(diff)
                .fold((0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
        }
    }

    /// Local Search based on probSAT, restarting every `max_flips` flips
    /// until a model is found or `budget` runs out.
    pub fn local_search(&mut self, budget: Duration) -> Solution {
        if self.clauses.iter().any(|cl| cl.lits.is_empty()) {
            return Solution::Unsat;
        }

        let deadline = Instant::now() + budget;
        let mut curr_model = vec![false; self.num_vars];
        let mut best_model = vec![false; self.num_vars];
        let mut best_n_unsat_clauses = usize::MAX;
        let mut clause_unsat = vec![1u32; self.clauses.len()];
        let mut tries = 0u64;

        loop {
            tries += 1;
            for v in curr_model.iter_mut() {
                *v = self.rng.gen::<bool>();
            }

            for _ in 0..self.options.max_flips {
                let n_unsat_clauses = self.count_unsat(&curr_model, &mut clause_unsat);

                if n_unsat_clauses == 0 {
                    trace!("local search found a model in try {}", tries);
                    return Solution::Sat(curr_model);
                } else if n_unsat_clauses < best_n_unsat_clauses {
                    best_model.clone_from_slice(&curr_model);
                    best_n_unsat_clauses = n_unsat_clauses;
                }

                if Instant::now() >= deadline {
                    trace!(
                        "local search out of time after {} tries, best has {} unsatisfied clauses",
                        tries,
                        best_n_unsat_clauses
                    );
                    return Solution::Best(best_model);
                }

                let selected_clause = match WeightedIndex::new(&clause_unsat) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => self.rng.gen_range(0, self.clauses.len()),
                };

                let lits = self.clauses[selected_clause].lits.clone();
                let mut scores = vec![0.0f32; lits.len()];
                for (score, x) in scores.iter_mut().zip(lits.iter()) {
                    let var_i = x.var().index();

                    curr_model[var_i] = !curr_model[var_i];
                    let (break_count, make_count) = self.break_make(&curr_model, &clause_unsat);
                    curr_model[var_i] = !curr_model[var_i];

                    *score = match self.options.score_fn_type {
                        ScoreFnType::Rand => 1.0,
                        ScoreFnType::Poly => 1.0 / (1.0 + break_count as f32).powf(C_BREAK),
                        ScoreFnType::Exp => C_MAKE.powi(make_count) / C_BREAK.powi(break_count),
                        ScoreFnType::Custom(f) => f(make_count, break_count),
                    };
                }

                let selected = match WeightedIndex::new(&scores) {
                    Ok(dist) => dist.sample(&mut self.rng),
                    Err(_) => self.rng.gen_range(0, lits.len()),
                };
                let var = lits[selected].var().index();
                curr_model[var] = !curr_model[var];
            }
        }
    }
}

impl Oracle for Solver {
    fn ensure_vars(&mut self, n_vars: usize) {
        self.num_vars = self.num_vars.max(n_vars);
    }

    fn add_clause(&mut self, lits: Vec<Lit>) {
        if let Some(max) = lits.iter().map(|l| l.var().index() + 1).max() {
            self.ensure_vars(max);
        }
        self.clauses.push(Clause { lits });
    }

    fn solve(&mut self, budget: Duration) -> Solution {
        self.local_search(budget)
    }
}
