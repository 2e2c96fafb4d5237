use crate::common::Lit;

#[derive(Debug)]
pub struct Trail {
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
}

impl Trail {
    pub fn new() -> Self {
        Trail {
            trail: vec![],
            trail_lim: vec![],
        }
    }

    pub fn n_assigns(&self) -> usize {
        self.trail.len()
    }

    pub fn decision_level(&self) -> i32 {
        self.trail_lim.len() as i32
    }

    pub fn add_at_current_dl(&mut self, p: Lit) {
        self.trail.push(p);
    }

    pub fn new_dl(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    pub fn as_slice(&self) -> &[Lit] {
        &self.trail
    }

    /// Pops the literals of the current decision level, newest first.
    pub fn pop_level(&mut self) -> Vec<Lit> {
        match self.trail_lim.pop() {
            Some(lim) => {
                let mut popped = self.trail.split_off(lim);
                popped.reverse();
                popped
            }
            None => vec![],
        }
    }
}
