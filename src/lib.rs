//! `mcpsat` solves the Multiple Couriers Problem with SAT.
//!
//! An instance is compiled into CNF by [`model::RoutingModel`], using the
//! cardinality encodings of [`encoding`] and the adder circuits of
//! [`encoding::arith`]. The [`driver`] then minimises the longest tour by
//! asking a satisfiability [`oracle::Oracle`] for ever better plans.
//!
//! ## An example
//!
//! ```rust
//! use mcpsat::driver::{self, DriverOptions, Termination};
//! use mcpsat::encoding::Strategy;
//! use mcpsat::parser::parse_dzn;
//!
//! let instance = parse_dzn("
//!     m = 1;
//!     n = 2;
//!     l = [10];
//!     s = [3, 4];
//!     D = [| 0, 5, 3 | 5, 0, 4 | 3, 4, 0 |];
//! ").unwrap();
//! let mut oracle = mcpsat::cdcl::Solver::default();
//! let report = driver::solve(instance, Strategy::Sequential, &mut oracle, DriverOptions::default()).unwrap();
//! assert_eq!(report.termination, Termination::Optimal);
//! assert_eq!(report.result.obj, Some(12));
//! ```

/// Common utils
pub mod common;
pub use common::*;

mod pool;
pub use pool::LiteralPool;

/// Cardinality constraints and arithmetic circuits
pub mod encoding;

/// cdcl, a complete solver module
pub mod cdcl;

/// sls, a local search solver module
pub mod sls;

pub mod oracle;

/// The routing model
pub mod model;

pub mod driver;

pub mod result;

/// Instance readers
pub mod parser;
