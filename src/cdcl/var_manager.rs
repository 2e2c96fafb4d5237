use super::clause_db::ClauseIndex;
use super::BranchingHeuristic;
use crate::*;

/// Assignment data of one variable.
#[derive(Clone, Copy)]
struct VarState {
    value: LBool,
    level: i32,
    reason: Option<ClauseIndex>,
    // Last value held; false until first assigned.
    phase: bool,
}

const UNASSIGNED: VarState = VarState {
    value: LBool::Undef,
    level: -1,
    reason: None,
    phase: false,
};

/// Learning-rate branching statistics (Liang et al. 2016).
struct Lrb {
    alpha: f64,
    conflicts: usize,
    ema: Vec<f64>,
    assigned_at: Vec<usize>,
    participated: Vec<usize>,
    reasoned: Vec<usize>,
}

impl Lrb {
    fn push(&mut self) {
        self.ema.push(0.0);
        self.assigned_at.push(0);
        self.participated.push(0);
        self.reasoned.push(0);
    }

    fn on_assign(&mut self, v: usize) {
        self.assigned_at[v] = self.conflicts;
        self.participated[v] = 0;
        self.reasoned[v] = 0;
    }

    fn on_unassign(&mut self, v: usize) {
        let interval = self.conflicts - self.assigned_at[v];
        if interval == 0 {
            return;
        }
        let interval = interval as f64;
        let reward = (self.participated[v] + self.reasoned[v]) as f64 / interval;
        self.ema[v] = (1.0 - self.alpha) * self.ema[v] + self.alpha * reward;
    }
}

enum Scores {
    Vsids { activity: Vec<f64>, inc: f64, decay: f64 },
    Lrb(Lrb),
}

impl Scores {
    fn of(&self) -> &[f64] {
        match self {
            Scores::Vsids { activity, .. } => &activity[..],
            Scores::Lrb(lrb) => &lrb.ema[..],
        }
    }
}

/// Per-variable assignment, level, reason and branching score.
pub struct VarManager {
    vars: Vec<VarState>,
    scores: Scores,
}

impl VarManager {
    pub fn new(bh: BranchingHeuristic) -> Self {
        let scores = match bh {
            BranchingHeuristic::Vsids { var_inc, var_decay } => Scores::Vsids {
                activity: vec![],
                inc: var_inc,
                decay: 1.0 / var_decay,
            },
            BranchingHeuristic::Lrb => Scores::Lrb(Lrb {
                alpha: 0.4,
                conflicts: 0,
                ema: vec![],
                assigned_at: vec![],
                participated: vec![],
                reasoned: vec![],
            }),
        };
        VarManager { vars: vec![], scores }
    }

    pub fn n_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn new_var(&mut self) -> Var {
        self.vars.push(UNASSIGNED);
        match &mut self.scores {
            Scores::Vsids { activity, .. } => activity.push(0.0),
            Scores::Lrb(lrb) => lrb.push(),
        }
        Var::new(self.vars.len() - 1)
    }

    pub fn value_lit(&self, p: Lit) -> LBool {
        let value = self.vars[p.var().index()].value;
        if p.sign() {
            !value
        } else {
            value
        }
    }

    pub fn level(&self, var: Var) -> i32 {
        self.vars[var.index()].level
    }

    pub fn reason(&self, var: Var) -> Option<ClauseIndex> {
        self.vars[var.index()].reason
    }

    /// Make `p` true at `level`.
    pub fn assign(&mut self, p: Lit, level: i32, reason: Option<ClauseIndex>) {
        let v = p.var().index();
        self.vars[v] = VarState {
            value: LBool::from(!p.sign()),
            level,
            reason,
            phase: !p.sign(),
        };
        if let Scores::Lrb(lrb) = &mut self.scores {
            lrb.on_assign(v);
        }
    }

    /// Undo the assignment of `var`, keeping its phase.
    pub fn unassign(&mut self, var: Var) {
        let v = var.index();
        self.vars[v] = VarState {
            phase: self.vars[v].phase,
            ..UNASSIGNED
        };
        if let Scores::Lrb(lrb) = &mut self.scores {
            lrb.on_unassign(v);
        }
    }

    /// Update scores after a conflict. `participating` were seen during
    /// analysis, `reasoned` appear in reasons of the learnt clause.
    pub fn on_conflict(&mut self, participating: &[Var], reasoned: &[Var]) {
        if let Scores::Lrb(lrb) = &mut self.scores {
            lrb.conflicts += 1;
            if lrb.alpha > 0.06 {
                lrb.alpha -= 1e-6;
            }
            for v in participating {
                lrb.participated[v.index()] += 1;
            }
            for v in reasoned {
                lrb.reasoned[v.index()] += 1;
            }
            for (v, state) in self.vars.iter().enumerate() {
                if state.value == LBool::Undef {
                    lrb.ema[v] *= 0.95;
                }
            }
        }
    }

    /// Bump the variables of a learnt clause.
    pub fn bump(&mut self, ps: &[Lit]) {
        if let Scores::Vsids { activity, inc, .. } = &mut self.scores {
            for p in ps {
                let a = &mut activity[p.var().index()];
                *a += *inc;
                if *a > 1e100 {
                    activity.iter_mut().for_each(|a| *a *= 1e-100);
                    *inc *= 1e-100;
                }
            }
        }
    }

    /// Age all activities by growing the increment.
    pub fn decay(&mut self) {
        if let Scores::Vsids { inc, decay, .. } = &mut self.scores {
            *inc *= *decay;
        }
    }

    /// Unassigned variable of highest score, in its saved phase.
    pub fn pick_branch(&self) -> Option<Lit> {
        let score = self.scores.of();
        let mut best: Option<usize> = None;
        for (v, state) in self.vars.iter().enumerate() {
            if state.value != LBool::Undef {
                continue;
            }
            match best {
                Some(b) if score[b] >= score[v] => {}
                _ => best = Some(v),
            }
        }
        best.map(|v| Lit::new(Var::new(v), !self.vars[v].phase))
    }

    pub fn model(&self) -> Vec<bool> {
        self.vars.iter().map(|s| s.value == LBool::True).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vsids() -> VarManager {
        VarManager::new(BranchingHeuristic::Vsids {
            var_inc: 1.0,
            var_decay: 0.95,
        })
    }

    #[test]
    fn unassigning_keeps_the_saved_phase() {
        let mut vm = vsids();
        let x = vm.new_var();
        vm.assign(x.pos(), 0, None);
        assert_eq!(vm.value_lit(x.pos()), LBool::True);
        assert_eq!(vm.level(x), 0);
        vm.unassign(x);
        assert_eq!(vm.value_lit(x.pos()), LBool::Undef);
        assert_eq!(vm.level(x), -1);
        assert_eq!(vm.pick_branch(), Some(x.pos()));
    }

    #[test]
    fn bumped_variables_are_branched_first() {
        let mut vm = vsids();
        let vars: Vec<Var> = (0..3).map(|_| vm.new_var()).collect();
        vm.bump(&[vars[2].neg()]);
        assert_eq!(vm.pick_branch(), Some(vars[2].neg()));
        vm.assign(vars[2].neg(), 1, None);
        assert_eq!(vm.pick_branch(), Some(vars[0].neg()));
        assert_eq!(vm.model(), vec![false, false, false]);
    }
}
