//! Branch-improvement search: an optimizer for the longest tour built from
//! repeated calls to a decision oracle.

use crate::encoding::Strategy;
use crate::errors::*;
use crate::model::{Instance, RoutePlan, RoutingModel};
use crate::oracle::Oracle;
use crate::result::SolveResult;
use crate::Solution;
use log::{debug, info, trace};
use std::time::{Duration, Instant};

/// Search options.
#[derive(Clone, Copy, Debug)]
pub struct DriverOptions {
    /// Wall-clock budget of the whole solve, model building excluded.
    pub time_budget: Duration,
    /// Consecutive non-improving answers after which the search gives up.
    pub max_stall: usize,
    /// After each improvement, require every tour to be strictly shorter
    /// than the incumbent objective.
    pub tighten_objective: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            time_budget: Duration::from_secs(300),
            max_stall: 250,
            tighten_objective: true,
        }
    }
}

/// A step of the search, recorded after each oracle answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The answer beat the incumbent.
    Improved,
    /// The answer did not beat the incumbent.
    Stalled,
    /// Finished, see [`Termination`].
    Done(Termination),
}

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The incumbent is optimal.
    Optimal,
    /// Out of time or patience; the incumbent is the best known plan.
    Timeout,
    /// No plan was found.
    Infeasible,
}

/// Keeps track of the time elapsed since creation.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Stopwatch {
    time_start: Instant,
}

impl Stopwatch {
    pub(crate) fn starting_now() -> Stopwatch {
        Stopwatch {
            time_start: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.time_start.elapsed()
    }
}

/// Mutable state of one search.
#[derive(Debug)]
struct SearchState {
    best: Option<RoutePlan>,
    stall: usize,
    tries: usize,
    incumbents: Vec<u64>,
    phases: Vec<Phase>,
    stopwatch: Stopwatch,
}

impl SearchState {
    fn new() -> Self {
        SearchState {
            best: None,
            stall: 0,
            tries: 0,
            incumbents: vec![],
            phases: vec![],
            stopwatch: Stopwatch::starting_now(),
        }
    }

    fn best_objective(&self) -> Option<u64> {
        self.best.as_ref().map(|p| p.objective)
    }

    /// Record a decoded answer. Returns true if it became the incumbent.
    fn offer(&mut self, plan: RoutePlan) -> bool {
        if self.best_objective().map_or(true, |best| plan.objective < best) {
            self.incumbents.push(plan.objective);
            self.best = Some(plan);
            self.stall = 0;
            self.phases.push(Phase::Improved);
            true
        } else {
            self.stall += 1;
            self.phases.push(Phase::Stalled);
            false
        }
    }

    fn without_answer(&self) -> Termination {
        if self.best.is_some() {
            Termination::Timeout
        } else {
            Termination::Infeasible
        }
    }
}

/// Outcome of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveReport {
    /// The result record.
    pub result: SolveResult,
    /// How the search ended.
    pub termination: Termination,
    /// Number of oracle calls.
    pub tries: usize,
    /// Objective of every accepted incumbent, in order. Strictly decreasing.
    pub incumbents: Vec<u64>,
    /// One entry per decoded answer, closed by `Done`.
    pub phases: Vec<Phase>,
}

/// The branch-improvement driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchImprovement {
    options: DriverOptions,
}

impl BranchImprovement {
    /// Create a driver.
    pub fn new(options: DriverOptions) -> Self {
        BranchImprovement { options }
    }

    /// Minimise the longest tour of `model` using `oracle`.
    ///
    /// The oracle is expected to be fresh; the formula is handed to it once.
    pub fn solve<O: Oracle + ?Sized>(&self, model: &mut RoutingModel, oracle: &mut O) -> Result<SolveReport> {
        let mut state = SearchState::new();
        let budget = self.options.time_budget;

        oracle.ensure_vars(model.n_vars());
        oracle.add_cnf(model.cnf());

        let termination = loop {
            let elapsed = state.stopwatch.elapsed();
            if elapsed >= budget {
                break state.without_answer();
            }
            state.tries += 1;
            let answer = oracle.solve(budget - elapsed);

            let sol = match answer {
                Solution::Sat(sol) => sol,
                Solution::Unsat => {
                    debug!("oracle proved unsatisfiability after {} tries", state.tries);
                    break if state.best.is_some() {
                        Termination::Optimal
                    } else {
                        Termination::Infeasible
                    };
                }
                Solution::Unknown | Solution::Best(_) => {
                    debug!("oracle gave up after {} tries", state.tries);
                    break state.without_answer();
                }
            };

            let plan = model.decode(&sol)?;
            trace!("try {}: objective {} routes {:?}", state.tries, plan.objective, plan.routes);
            oracle.add_clause(model.blocking_clause(&sol));

            let objective = plan.objective;
            if state.offer(plan) {
                info!(
                    "objective {} after {} tries ({} ms)",
                    objective,
                    state.tries,
                    state.stopwatch.elapsed().as_millis()
                );
                if objective == 0 {
                    break Termination::Optimal;
                }
                if self.options.tighten_objective {
                    let bound = model.tighten(objective - 1);
                    oracle.ensure_vars(model.n_vars());
                    oracle.add_cnf(&bound);
                }
            } else if state.stall >= self.options.max_stall {
                debug!("no improvement in {} tries", state.stall);
                break Termination::Timeout;
            }
        };
        state.phases.push(Phase::Done(termination));

        let elapsed = state.stopwatch.elapsed();
        info!(
            "{} search ended {:?} after {} tries, best {:?}",
            model.strategy(),
            termination,
            state.tries,
            state.best_objective()
        );
        Ok(SolveReport {
            result: SolveResult::new(elapsed, termination == Termination::Optimal, state.best.as_ref()),
            termination,
            tries: state.tries,
            incumbents: state.incumbents,
            phases: state.phases,
        })
    }
}

/// Build the model of `instance` and minimise it with `oracle`.
///
/// Invalid instances are rejected before the oracle is touched.
pub fn solve<O: Oracle + ?Sized>(
    instance: Instance,
    strategy: Strategy,
    oracle: &mut O,
    options: DriverOptions,
) -> Result<SolveReport> {
    let mut model = RoutingModel::build(instance, strategy)?;
    BranchImprovement::new(options).solve(&mut model, oracle)
}
