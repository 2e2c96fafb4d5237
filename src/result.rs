//! The result record shared by every solving approach.

use crate::errors::*;
use crate::model::RoutePlan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

/// Outcome of one solve, as written to the result files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    /// Wall-clock seconds, rounded up.
    pub time: u64,
    /// The objective was proven optimal.
    pub optimal: bool,
    /// Objective of the best plan, if any.
    pub obj: Option<u64>,
    /// Items of each courier in driving order, 1-based.
    pub sol: Option<Vec<Vec<usize>>>,
}

impl SolveResult {
    /// Record for `plan`, found after `elapsed`.
    pub fn new(elapsed: Duration, optimal: bool, plan: Option<&RoutePlan>) -> Self {
        SolveResult {
            time: ceil_secs(elapsed),
            optimal,
            obj: plan.map(|p| p.objective),
            sol: plan.map(|p| p.routes.clone()),
        }
    }

    /// Record of an instance that was rejected or never solved.
    pub fn unsolved(elapsed: Duration) -> Self {
        Self::new(elapsed, false, None)
    }
}

/// Whole seconds in `d`, rounded up.
pub fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + if d.subsec_nanos() > 0 { 1 } else { 0 }
}

/// Results of one instance keyed by approach name, e.g. `cdcl_seq`.
pub type ResultTable = BTreeMap<String, SolveResult>;

/// Write `table` as pretty-printed JSON.
pub fn write_results<W: Write>(table: &ResultTable, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, table)?;
    writeln!(writer)?;
    Ok(())
}

/// Read a table written by [`write_results`].
pub fn read_results(text: &str) -> Result<ResultTable> {
    Ok(serde_json::from_str(text)?)
}
