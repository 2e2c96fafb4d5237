use super::clause_db::{ClauseDb, ClauseIndex};
use super::solver_options::SolverOptions;
use super::trail::Trail;
use super::VarManager;
use crate::common::UNDEF_LIT;
use crate::oracle::Oracle;
use crate::*;
use log::trace;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of one restart interval.
enum SearchStatus {
    Sat(Vec<bool>),
    Unsat,
    Restart,
    OutOfTime,
}

/// Represents a CDCL solver.
///
/// Clauses may be added between calls to [`Solver::solve`]; learnt clauses
/// are kept across calls, which is what makes repeated queries with a
/// growing set of blocking clauses cheap.
pub struct Solver {
    undef_state: bool,
    options: SolverOptions,
    clause_db: ClauseDb,
    var_manager: VarManager,
    watches: Vec<Vec<ClauseIndex>>,
    prop_q: VecDeque<Lit>,
    trail: Trail,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SolverOptions::default())
    }
}

impl Solver {
    /// Create a new CDCL solver.
    pub fn new(options: SolverOptions) -> Self {
        let clause_db = ClauseDb::new(options.clause_db_options);
        let var_manager = VarManager::new(options.branching_heuristic);
        Self {
            undef_state: false,
            options,
            clause_db,
            var_manager,
            watches: vec![],
            prop_q: VecDeque::new(),
            trail: Trail::new(),
        }
    }

    /// Returns the number of variables in the formula.
    pub fn n_vars(&self) -> usize {
        self.var_manager.n_vars()
    }

    /// Returns the number of assigned variables in the formula.
    fn n_assigns(&self) -> usize {
        self.trail.n_assigns()
    }

    /// Returns the number of original clauses in the formula.
    pub fn n_clauses(&self) -> usize {
        self.clause_db.original_len()
    }

    /// Returns the number of learnt clauses in the formula.
    pub fn n_learnts(&self) -> usize {
        self.clause_db.learnts_len()
    }

    /// Returns the current decision level in the solver.
    fn decision_level(&self) -> i32 {
        self.trail.decision_level()
    }

    /// Add a new variable to the solver.
    pub fn new_var(&mut self) -> Var {
        self.watches.push(vec![]);
        self.watches.push(vec![]);
        self.var_manager.new_var()
    }

    /// Add a new clause to the solver. Variables it mentions are created on demand.
    pub fn add_clause(&mut self, lits: Vec<Lit>) {
        if let Some(max) = lits.iter().map(|l| l.var().index() + 1).max() {
            while self.n_vars() < max {
                let _ = self.new_var();
            }
        }
        let (r, _) = self.clause_new(lits, false);
        if !r {
            self.undef_state = true;
        }
    }

    /// Assume p is true and simplify the clause
    fn clause_propagate(&mut self, ci: ClauseIndex, p: Lit) -> bool {
        let clause = self.clause_db.get_clause_mut_ref(ci);

        // Make sure false lit at cl.lits[1]
        if clause.lits[0] == !p {
            clause.lits[0] = clause.lits[1];
            clause.lits[1] = !p;
        }

        // If 0th watch is true, clause is already satisfied
        if self.var_manager.value_lit(clause.lits[0]) == LBool::True {
            // Re insert clause into watcher list
            self.watches[p.index()].push(ci);
            return true;
        }

        // Look for a new literal to watch
        for i in 2..clause.lits.len() {
            if self.var_manager.value_lit(clause.lits[i]) != LBool::False {
                clause.lits[1] = clause.lits[i];
                clause.lits[i] = !p;
                self.watches[(!clause.lits[1]).index()].push(ci);
                return true;
            }
        }

        // Clause is unit under assignment
        self.watches[p.index()].push(ci);
        let enqueue_lit = clause.lits[0];
        self.enqueue(enqueue_lit, Some(ci))
    }

    fn clause_new(&mut self, mut ps: Vec<Lit>, learnt: bool) -> (bool, Option<ClauseIndex>) {
        if !learnt {
            // If any lit in ps is true, return true
            for &l in ps.iter() {
                if self.var_manager.value_lit(l) == LBool::True {
                    return (true, None);
                }
            }

            // Remove all dups from ps
            ps.sort();
            ps.dedup();

            // If both p and !p occurs in ps, return true
            for i in 1..ps.len() {
                if ps[i - 1] == !ps[i] {
                    return (true, None);
                }
            }

            // Remove all false lits from ps
            ps.retain(|&l| self.var_manager.value_lit(l) == LBool::Undef);
        }

        if ps.is_empty() {
            (false, None)
        } else if ps.len() == 1 {
            (self.enqueue(ps[0], None), None)
        } else {
            if learnt {
                // Index of the lit with highest decision level
                let mut max_i = 1;
                for i in 2..ps.len() {
                    if self.var_manager.level(ps[i].var())
                        > self.var_manager.level(ps[max_i].var())
                    {
                        max_i = i;
                    }
                }

                // Pick second variable to watch
                ps.swap(1, max_i);
                self.var_manager.bump(&ps);
            }

            let ps_0 = ps[0];
            let ps_1 = ps[1];
            let ci = if learnt {
                self.clause_db.add_learnt(Clause { lits: ps })
            } else {
                self.clause_db.add_original(Clause { lits: ps })
            };
            self.watches[(!ps_0).index()].push(ci);
            self.watches[(!ps_1).index()].push(ci);

            (true, Some(ci))
        }
    }

    /// Propagate unit clauses in prop_q and return when a confliting clause is found
    fn propagate(&mut self) -> Option<ClauseIndex> {
        while let Some(p) = self.prop_q.pop_front() {
            let tmp = std::mem::take(&mut self.watches[p.index()]);

            for i in 0..tmp.len() {
                if !self.clause_propagate(tmp[i], p) {
                    // Contraint is conflicting
                    self.watches[p.index()].extend_from_slice(&tmp[i + 1..]);
                    self.prop_q.clear();
                    return Some(tmp[i]);
                }
            }
        }
        None
    }

    fn enqueue(&mut self, p: Lit, from: Option<ClauseIndex>) -> bool {
        match self.var_manager.value_lit(p) {
            LBool::True => true,
            LBool::False => false,
            LBool::Undef => {
                self.var_manager.assign(p, self.decision_level(), from);
                self.trail.add_at_current_dl(p);
                self.prop_q.push_back(p);
                true
            }
        }
    }

    /// First-UIP conflict analysis. Returns the learnt clause, asserting
    /// literal first, and the level to backtrack to.
    fn analyze(&mut self, cf: ClauseIndex) -> (Vec<Lit>, i32) {
        let mut participating_variables: Vec<Var> = vec![];
        let mut seen = vec![false; self.n_vars()];
        let mut counter = 0;
        let mut confl = cf;
        let mut p: Option<Lit> = None;
        let mut trail_index = self.n_assigns();

        let mut out_learnt = vec![UNDEF_LIT];
        let mut out_btlevel = 0;
        loop {
            self.clause_db.found_clause_as_reason(confl);
            let clause = self.clause_db.get_clause_ref(confl);
            let start = if p.is_none() { 0 } else { 1 };

            // Trace reason for p
            for &q in &clause.lits[start..] {
                let v = q.var();
                if seen[v.index()] {
                    continue;
                }
                seen[v.index()] = true;
                participating_variables.push(v);
                let level = self.var_manager.level(v);
                if level == self.decision_level() {
                    counter += 1;
                } else if level > 0 {
                    out_learnt.push(q);
                    out_btlevel = out_btlevel.max(level);
                }
            }

            // Select next literal to look at
            let lit = loop {
                trail_index -= 1;
                let lit = self.trail.as_slice()[trail_index];
                if seen[lit.var().index()] {
                    break lit;
                }
            };
            p = Some(lit);
            counter -= 1;
            if counter == 0 {
                break;
            }
            confl = match self.var_manager.reason(lit.var()) {
                Some(ci) => ci,
                None => unreachable!("only the decision literal of a level has no reason"),
            };
        }
        if let Some(p) = p {
            out_learnt[0] = !p;
        }

        let mut reason_variables = vec![];
        for lit in out_learnt.iter() {
            if let Some(ci) = self.var_manager.reason(lit.var()) {
                for l in &self.clause_db.get_clause_ref(ci).lits {
                    if !seen[l.var().index()] {
                        reason_variables.push(l.var());
                    }
                }
            }
        }
        self.var_manager.on_conflict(&participating_variables, &reason_variables);
        (out_learnt, out_btlevel)
    }

    fn record(&mut self, clause: Vec<Lit>) {
        let asserting_lit = clause[0];
        let (_, c) = self.clause_new(clause, true);
        let _ = self.enqueue(asserting_lit, c);
    }

    fn assume(&mut self, p: Lit) -> bool {
        self.trail.new_dl();
        self.enqueue(p, None)
    }

    fn cancel(&mut self) {
        for p in self.trail.pop_level() {
            self.var_manager.unassign(p.var());
        }
    }

    fn cancel_until(&mut self, level: i32) {
        while self.trail.decision_level() > level {
            self.cancel();
        }
        self.prop_q.clear();
    }

    fn search(&mut self, nof_conflicts: u32, nof_learnts: usize, deadline: Instant) -> SearchStatus {
        let mut conflict_count = 0;

        loop {
            match self.propagate() {
                // Conflit
                Some(c) => {
                    conflict_count += 1;
                    if self.decision_level() == 0 {
                        return SearchStatus::Unsat;
                    }
                    let (learnt_clause, backtrack_level) = self.analyze(c);
                    self.cancel_until(backtrack_level);
                    self.record(learnt_clause);
                    self.var_manager.decay();
                    self.clause_db.after_record_learnt_clause();
                }
                // No Conflict
                None => {
                    if Instant::now() >= deadline {
                        self.cancel_until(0);
                        return SearchStatus::OutOfTime;
                    }

                    if self.decision_level() == 0 {
                        self.clause_db.simplify(&self.var_manager, &mut self.watches);
                    }

                    if self.clause_db.learnts_len().saturating_sub(self.n_assigns()) >= nof_learnts {
                        self.clause_db.reduce_db(&self.var_manager, &mut self.watches);
                    }

                    if conflict_count >= nof_conflicts {
                        // Force a restart
                        self.cancel_until(0);
                        return SearchStatus::Restart;
                    }

                    match self.var_manager.pick_branch() {
                        Some(p) => {
                            let _ = self.assume(p);
                        }
                        None => {
                            // Model found
                            let model = self.var_manager.model();
                            self.cancel_until(0);
                            return SearchStatus::Sat(model);
                        }
                    }
                }
            }
        }
    }

    /// Solve the formula within `budget`.
    pub fn solve(&mut self, budget: Duration) -> Solution {
        if self.undef_state {
            return Solution::Unsat;
        }
        let deadline = Instant::now() + budget;
        let mut nof_learnts = ((self.n_clauses() as f64) / 3.0).max(1000.0);
        let mut nof_conflicts = f64::from(self.options.restart_first);

        loop {
            let status = self.search(nof_conflicts as u32, nof_learnts as usize, deadline);
            match status {
                SearchStatus::Sat(model) => return Solution::Sat(model),
                SearchStatus::Unsat => {
                    self.undef_state = true;
                    return Solution::Unsat;
                }
                SearchStatus::OutOfTime => return Solution::Unknown,
                SearchStatus::Restart => {
                    trace!(
                        "restart: {} learnts, {} clauses",
                        self.n_learnts(),
                        self.n_clauses()
                    );
                    nof_conflicts *= self.options.restart_inc;
                    nof_learnts *= 1.1;
                }
            }
        }
    }
}

impl Oracle for Solver {
    fn ensure_vars(&mut self, n_vars: usize) {
        while self.n_vars() < n_vars {
            let _ = self.new_var();
        }
    }

    fn add_clause(&mut self, lits: Vec<Lit>) {
        Solver::add_clause(self, lits)
    }

    fn solve(&mut self, budget: Duration) -> Solution {
        Solver::solve(self, budget)
    }
}
