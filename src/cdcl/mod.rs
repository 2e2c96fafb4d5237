mod clause_db;
mod solver;
mod solver_options;
mod trail;
mod var_manager;

pub use solver::Solver;
pub use solver_options::{BranchingHeuristic, ClauseDbOptions, SolverOptions};
pub(crate) use var_manager::VarManager;
