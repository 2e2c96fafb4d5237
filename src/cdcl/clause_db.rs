use super::solver_options::ClauseDbOptions;
use super::VarManager;
use crate::*;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClauseIndex {
    Orig(usize),
    Lrnt(usize),
}

pub struct ClauseDb {
    original: Vec<Clause>,
    learnts: BTreeMap<usize, (Clause, f64)>,
    curr_learnt_id: usize,
    cla_inc: f64,
    cla_decay: f64,
}

impl ClauseDb {
    pub fn new(options: ClauseDbOptions) -> Self {
        ClauseDb {
            original: vec![],
            learnts: BTreeMap::new(),
            curr_learnt_id: 0,
            cla_inc: options.cla_inc,
            cla_decay: 1.0 / options.cla_decay,
        }
    }

    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    pub fn learnts_len(&self) -> usize {
        self.learnts.len()
    }

    pub fn add_original(&mut self, cl: Clause) -> ClauseIndex {
        let ci = ClauseIndex::Orig(self.original.len());
        self.original.push(cl);
        ci
    }

    pub fn add_learnt(&mut self, cl: Clause) -> ClauseIndex {
        let _ = self.learnts.insert(self.curr_learnt_id, (cl, 0.0));
        let ci = ClauseIndex::Lrnt(self.curr_learnt_id);
        self.curr_learnt_id += 1;
        self.found_clause_as_reason(ci);
        ci
    }

    pub fn get_clause_ref(&self, ci: ClauseIndex) -> &Clause {
        match ci {
            ClauseIndex::Orig(i) => &self.original[i],
            ClauseIndex::Lrnt(i) => &self.learnts[&i].0,
        }
    }

    pub fn get_clause_mut_ref(&mut self, ci: ClauseIndex) -> &mut Clause {
        match ci {
            ClauseIndex::Orig(i) => &mut self.original[i],
            ClauseIndex::Lrnt(i) => match self.learnts.get_mut(&i) {
                Some((cl, _)) => cl,
                None => panic!("learnt clause {} was removed while still referenced", i),
            },
        }
    }

    pub fn found_clause_as_reason(&mut self, ci: ClauseIndex) {
        if let ClauseIndex::Lrnt(index) = ci {
            let cla_inc = self.cla_inc;
            let rescale = match self.learnts.get_mut(&index) {
                Some(cl) => {
                    cl.1 += cla_inc;
                    cl.1 > 1e100
                }
                None => false,
            };
            if rescale {
                for (_, cl) in self.learnts.iter_mut() {
                    cl.1 *= 1e-100;
                }
                self.cla_inc *= 1e-100;
            }
        }
    }

    pub fn after_record_learnt_clause(&mut self) {
        self.cla_inc *= self.cla_decay;
    }

    /// If the clause is reason for some variable
    /// (INVARIANT: if it is, then it should be var corresponding to first literal),
    /// then the clause is locked.
    fn is_clause_locked(&self, ci: ClauseIndex, var_manager: &VarManager) -> bool {
        let cl = self.get_clause_ref(ci);
        var_manager.reason(cl.lits[0].var()) == Some(ci)
    }

    pub(crate) fn reduce_db(&mut self, var_manager: &VarManager, watches: &mut [Vec<ClauseIndex>]) {
        let lim = self.cla_inc / self.learnts.len() as f64;

        let mut acts: Vec<(usize, f64, usize)> = self
            .learnts
            .iter()
            .map(|(&i, (cl, a))| (i, *a, cl.lits.len()))
            .collect();
        acts.sort_by(|(_, a1, _), (_, a2, _)| a1.partial_cmp(a2).unwrap_or(std::cmp::Ordering::Equal));

        let half = acts.len() / 2;
        for (i, &(index, activity, len)) in acts.iter().enumerate() {
            let ci = ClauseIndex::Lrnt(index);
            // Binary learnts are cheap and kept.
            if len <= 2 || self.is_clause_locked(ci, var_manager) {
                continue;
            }
            if i < half || activity < lim {
                self.remove_learnt(index, watches);
            }
        }
    }

    /// Removes learnt clauses already satisfied at the root level.
    pub(crate) fn simplify(&mut self, var_manager: &VarManager, watches: &mut [Vec<ClauseIndex>]) {
        let satisfied: Vec<usize> = self
            .learnts
            .iter()
            .filter(|(_, (cl, _))| {
                cl.lits
                    .iter()
                    .any(|&l| var_manager.value_lit(l) == LBool::True && var_manager.level(l.var()) == 0)
            })
            .map(|(&i, _)| i)
            .collect();
        for index in satisfied {
            if !self.is_clause_locked(ClauseIndex::Lrnt(index), var_manager) {
                self.remove_learnt(index, watches);
            }
        }
    }

    pub(crate) fn remove_learnt(&mut self, index: usize, watches: &mut [Vec<ClauseIndex>]) {
        let ci = ClauseIndex::Lrnt(index);
        if let Some((learnt, _)) = self.learnts.remove(&index) {
            for &w in learnt.lits.iter().take(2) {
                let list = &mut watches[(!w).index()];
                if let Some(i) = list.iter().position(|&s| s == ci) {
                    let _ = list.swap_remove(i);
                }
            }
        }
    }
}
