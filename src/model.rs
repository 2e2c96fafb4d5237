//! The Multiple Couriers Problem as CNF.
//!
//! Nodes `0..n` are the items and node `n` is the depot. Courier `k` drives
//! arc `(i, j)` iff `y[k][i][j]` is true. Every item is entered and left
//! exactly once over all couriers, every courier leaves and re-enters the
//! depot exactly once, and Miller-Tucker-Zemlin order labels rule out cycles
//! that miss the depot.

use crate::encoding::arith::{Circuit, Signal};
use crate::encoding::{exactly_one, Strategy};
use crate::errors::*;
use crate::{Cnf, Lit, LiteralPool};
use log::debug;

/// A problem instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    /// Number of couriers.
    pub m: usize,
    /// Number of items.
    pub n: usize,
    /// Load capacity of each courier.
    pub l: Vec<u64>,
    /// Size of each item.
    pub s: Vec<u64>,
    /// Distances between nodes, `(n + 1) × (n + 1)`, depot last.
    pub d: Vec<Vec<u64>>,
}

impl Instance {
    /// Index of the depot node.
    pub fn depot(&self) -> usize {
        self.n
    }

    /// Check dimensions, then the two load conditions no plan can get around.
    pub fn validate(&self) -> Result<()> {
        let malformed = |msg: String| -> Result<()> { Err(ErrorKind::MalformedInstance(msg).into()) };
        if self.m == 0 {
            return malformed("no couriers".to_owned());
        }
        if self.n == 0 {
            return malformed("no items".to_owned());
        }
        if self.l.len() != self.m {
            return malformed(format!("{} capacities for {} couriers", self.l.len(), self.m));
        }
        if self.s.len() != self.n {
            return malformed(format!("{} sizes for {} items", self.s.len(), self.n));
        }
        if self.d.len() != self.n + 1 {
            return malformed(format!("distance matrix has {} rows, expected {}", self.d.len(), self.n + 1));
        }
        if let Some(i) = self.d.iter().position(|row| row.len() != self.n + 1) {
            return malformed(format!(
                "distance row {} has {} entries, expected {}",
                i,
                self.d[i].len(),
                self.n + 1
            ));
        }

        let total_size: u64 = self.s.iter().sum();
        let total_load: u64 = self.l.iter().sum();
        if total_size > total_load {
            return Err(ErrorKind::InfeasibleInstance(format!(
                "items weigh {} in total but couriers carry at most {}",
                total_size, total_load
            ))
            .into());
        }
        let max_load = self.l.iter().copied().max().unwrap_or(0);
        if let Some(j) = self.s.iter().position(|&s| s > max_load) {
            return Err(ErrorKind::InfeasibleInstance(format!(
                "item {} has size {} but no courier carries more than {}",
                j + 1,
                self.s[j],
                max_load
            ))
            .into());
        }
        Ok(())
    }

    /// Length of the tour depot → `route` → depot, nodes 0-based.
    pub fn tour_length(&self, route: &[usize]) -> u64 {
        if route.is_empty() {
            return 0;
        }
        let depot = self.depot();
        let mut prev = depot;
        let mut total = 0;
        for &node in route.iter().chain(std::iter::once(&depot)) {
            total += self.d[prev][node];
            prev = node;
        }
        total
    }
}

/// Variables of the routing model.
#[derive(Clone, Debug)]
pub struct RouteVars {
    /// `y[k][i][j]`: courier `k` drives from node `i` to node `j`.
    pub y: Vec<Vec<Vec<Lit>>>,
    /// Order label of every node. The depot is the constant 0.
    pub u: Vec<Vec<Signal>>,
    /// `visit[k][j]`: courier `k` delivers item `j`.
    pub visit: Vec<Vec<Lit>>,
}

/// A decoded solution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePlan {
    /// Items delivered by each courier in driving order, 1-based.
    pub routes: Vec<Vec<usize>>,
    /// Tour length of each courier.
    pub distances: Vec<u64>,
    /// Longest tour.
    pub objective: u64,
}

/// CNF of one instance together with the variables needed to read it back.
pub struct RoutingModel {
    instance: Instance,
    strategy: Strategy,
    pool: LiteralPool,
    cnf: Cnf,
    vars: RouteVars,
    distance: Option<Vec<Vec<Signal>>>,
}

/// Number of bits of `x`.
fn bit_len(x: u64) -> usize {
    (64 - x.leading_zeros()) as usize
}

impl RoutingModel {
    /// Validate `instance` and encode it.
    ///
    /// Nothing is encoded when validation fails.
    pub fn build(instance: Instance, strategy: Strategy) -> Result<RoutingModel> {
        instance.validate()?;
        let (m, n) = (instance.m, instance.n);
        let depot = instance.depot();
        let mut pool = LiteralPool::new();
        let mut cnf = Cnf::new();

        let y: Vec<Vec<Vec<Lit>>> = (0..m)
            .map(|k| {
                (0..=n)
                    .map(|i| pool.new_literals(&format!("y{}.{}", k, i), n + 1))
                    .collect()
            })
            .collect();

        for yk in &y {
            for (i, row) in yk.iter().enumerate() {
                cnf.add_unit(!row[i]);
            }
        }

        for j in 0..n {
            let incoming: Vec<Lit> = (0..m)
                .flat_map(|k| (0..=n).filter(move |&i| i != j).map(move |i| (k, i)))
                .map(|(k, i)| y[k][i][j])
                .collect();
            cnf.append(exactly_one(&incoming, strategy, &format!("in{}", j), &mut pool)?);
            let outgoing: Vec<Lit> = (0..m)
                .flat_map(|k| (0..=n).filter(move |&i| i != j).map(move |i| (k, i)))
                .map(|(k, i)| y[k][j][i])
                .collect();
            cnf.append(exactly_one(&outgoing, strategy, &format!("out{}", j), &mut pool)?);
        }

        for (k, yk) in y.iter().enumerate() {
            let leave: Vec<Lit> = (0..n).map(|j| yk[depot][j]).collect();
            cnf.append(exactly_one(&leave, strategy, &format!("leave{}", k), &mut pool)?);
            let enter: Vec<Lit> = (0..n).map(|i| yk[i][depot]).collect();
            cnf.append(exactly_one(&enter, strategy, &format!("enter{}", k), &mut pool)?);
        }

        for yk in &y {
            for j in 0..n {
                let incoming: Vec<Lit> = (0..=n).filter(|&i| i != j).map(|i| yk[i][j]).collect();
                let outgoing: Vec<Lit> = (0..=n).filter(|&i| i != j).map(|i| yk[j][i]).collect();
                for &a in &incoming {
                    let mut clause = vec![!a];
                    clause.extend(&outgoing);
                    cnf.add_clause(clause);
                }
                for &b in &outgoing {
                    let mut clause = vec![!b];
                    clause.extend(&incoming);
                    cnf.add_clause(clause);
                }
            }
        }

        let mut visit = Vec::with_capacity(m);
        for (k, yk) in y.iter().enumerate() {
            let vk = pool.new_literals(&format!("v{}", k), n);
            for j in 0..n {
                let incoming: Vec<Lit> = (0..=n).filter(|&i| i != j).map(|i| yk[i][j]).collect();
                let mut clause = vec![!vk[j]];
                clause.extend(&incoming);
                cnf.add_clause(clause);
                for a in incoming {
                    cnf.add_implication(a, vk[j]);
                }
            }
            visit.push(vk);
        }

        for (k, vk) in visit.iter().enumerate() {
            let terms: Vec<(u64, Lit)> = instance.s.iter().copied().zip(vk.iter().copied()).collect();
            let mut circuit = Circuit::new(&mut pool, &mut cnf, &format!("load{}", k));
            let load = circuit.weighted_sum(&terms);
            circuit.assert_at_most(&load, instance.l[k]);
        }

        let width = bit_len(n as u64);
        let mut u: Vec<Vec<Signal>> = (0..n)
            .map(|i| {
                pool.new_literals(&format!("u{}", i), width)
                    .into_iter()
                    .map(Signal::Lit)
                    .collect()
            })
            .collect();
        u.push(vec![Signal::Const(false); width]);
        let mut circuit = Circuit::new(&mut pool, &mut cnf, "mtz");
        for label in &u[..n] {
            circuit.assert_nonzero(label);
            circuit.assert_at_most(label, n as u64);
        }
        let mut order = vec![];
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                let lt = circuit.less_than(&u[i], &u[j]);
                order.push((i, j, lt));
            }
        }
        for (i, j, lt) in order {
            for yk in &y {
                match lt {
                    Signal::Const(true) => {}
                    Signal::Const(false) => cnf.add_unit(!yk[i][j]),
                    Signal::Lit(l) => cnf.add_implication(yk[i][j], l),
                }
            }
        }

        debug!(
            "routing model ({}): {} couriers, {} items, {} vars, {} clauses",
            strategy,
            m,
            n,
            pool.n_vars(),
            cnf.len()
        );

        Ok(RoutingModel {
            instance,
            strategy,
            pool,
            cnf,
            vars: RouteVars { y, u, visit },
            distance: None,
        })
    }

    /// The instance this model encodes.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// The at-most-one strategy used by the exactly-one constraints.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The route variables.
    pub fn vars(&self) -> &RouteVars {
        &self.vars
    }

    /// The base formula. Clauses returned by [`tighten`](Self::tighten)
    /// are not part of it.
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Number of variables allocated so far, including distance circuits.
    pub fn n_vars(&self) -> usize {
        self.pool.n_vars()
    }

    /// Read the route plan off a model of the formula.
    pub fn decode(&self, model: &[bool]) -> Result<RoutePlan> {
        let inst = &self.instance;
        let (n, depot) = (inst.n, inst.depot());
        let mut visits = vec![0usize; n];
        let mut routes = Vec::with_capacity(inst.m);
        let mut distances = Vec::with_capacity(inst.m);

        for (k, yk) in self.vars.y.iter().enumerate() {
            let mut route = vec![];
            let mut node = depot;
            loop {
                let next: Vec<usize> = (0..=n).filter(|&j| yk[node][j].eval(model)).collect();
                let next = match next.as_slice() {
                    [j] => *j,
                    [] => return bail_decoding(format!("courier {} stops at node {}", k + 1, node + 1)),
                    _ => return bail_decoding(format!("courier {} branches at node {}", k + 1, node + 1)),
                };
                if next == depot {
                    break;
                }
                route.push(next);
                visits[next] += 1;
                if route.len() > n {
                    return bail_decoding(format!("courier {} never returns to the depot", k + 1));
                }
                node = next;
            }
            let load: u64 = route.iter().map(|&j| inst.s[j]).sum();
            if load > inst.l[k] {
                return bail_decoding(format!("courier {} carries {} over capacity {}", k + 1, load, inst.l[k]));
            }
            distances.push(inst.tour_length(&route));
            routes.push(route.into_iter().map(|j| j + 1).collect());
        }

        if let Some(j) = visits.iter().position(|&c| c != 1) {
            return bail_decoding(format!("item {} delivered {} times", j + 1, visits[j]));
        }
        let objective = distances.iter().copied().max().unwrap_or(0);
        Ok(RoutePlan {
            routes,
            distances,
            objective,
        })
    }

    /// The clause excluding the arc choice of `model`.
    pub fn blocking_clause(&self, model: &[bool]) -> Vec<Lit> {
        let mut clause = vec![];
        for yk in &self.vars.y {
            for (i, row) in yk.iter().enumerate() {
                for (j, &lit) in row.iter().enumerate() {
                    if i != j {
                        clause.push(if lit.eval(model) { !lit } else { lit });
                    }
                }
            }
        }
        clause
    }

    /// Clauses bounding every tour length by `bound`.
    ///
    /// The first call also returns the definitions of the per-courier
    /// distance sums; later calls reuse them and add bound clauses only.
    pub fn tighten(&mut self, bound: u64) -> Cnf {
        let mut cnf = Cnf::new();
        if self.distance.is_none() {
            let mut sums = Vec::with_capacity(self.instance.m);
            for (k, yk) in self.vars.y.iter().enumerate() {
                let mut terms = vec![];
                for (i, row) in yk.iter().enumerate() {
                    for (j, &lit) in row.iter().enumerate() {
                        if i != j {
                            terms.push((self.instance.d[i][j], lit));
                        }
                    }
                }
                let mut circuit = Circuit::new(&mut self.pool, &mut cnf, &format!("dist{}", k));
                sums.push(circuit.weighted_sum(&terms));
            }
            debug!(
                "distance circuits: {} vars, {} clauses",
                self.pool.n_vars(),
                cnf.len()
            );
            self.distance = Some(sums);
        }
        if let Some(sums) = &self.distance {
            for (k, sum) in sums.iter().enumerate() {
                let mut circuit = Circuit::new(&mut self.pool, &mut cnf, &format!("bound{}", k));
                circuit.assert_at_most(sum, bound);
            }
        }
        cnf
    }

    /// Tour lengths as read from the distance circuits, once built.
    #[cfg(test)]
    pub(crate) fn circuit_distances(&self, model: &[bool]) -> Option<Vec<u64>> {
        self.distance
            .as_ref()
            .map(|sums| sums.iter().map(|sum| crate::encoding::arith::value(sum, model)).collect())
    }
}

fn bail_decoding<T>(msg: String) -> Result<T> {
    Err(ErrorKind::DecodingInconsistency(msg).into())
}
