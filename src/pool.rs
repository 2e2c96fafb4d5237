use crate::{Lit, Var};

/// Source of fresh boolean variables.
///
/// Every variable of one solve, primary or auxiliary, is drawn from a single
/// pool. Identifiers are dense, start at zero and are never handed out twice,
/// so two encodings that draw from the same pool can never share an
/// auxiliary variable. The scope tag recorded with each variable is only
/// used for diagnostics.
#[derive(Clone, Debug, Default)]
pub struct LiteralPool {
    scopes: Vec<String>,
}

impl LiteralPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the positive literal of a fresh variable tagged with `scope`.
    pub fn new_literal(&mut self, scope: &str) -> Lit {
        let var = Var::new(self.scopes.len());
        self.scopes.push(scope.to_owned());
        var.pos()
    }

    /// Returns `n` fresh literals tagged `scope[0]`, `scope[1]`, ...
    pub fn new_literals(&mut self, scope: &str, n: usize) -> Vec<Lit> {
        (0..n)
            .map(|i| self.new_literal(&format!("{}[{}]", scope, i)))
            .collect()
    }

    /// Returns the number of variables handed out so far.
    pub fn n_vars(&self) -> usize {
        self.scopes.len()
    }

    /// Returns the scope tag of `var`, if it came from this pool.
    pub fn scope(&self, var: Var) -> Option<&str> {
        self.scopes.get(var.index()).map(String::as_str)
    }
}
