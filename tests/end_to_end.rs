use mcpsat::driver::{self, DriverOptions, Termination};
use mcpsat::encoding::Strategy;
use mcpsat::errors::ErrorKind;
use mcpsat::model::{Instance, RoutingModel};
use mcpsat::oracle::{new_oracle, Oracle, OracleKind};
use mcpsat::parser::parse_dzn;
use mcpsat::{cdcl, Lit, Solution};
use std::time::{Duration, Instant};

fn two_items() -> Instance {
    parse_dzn(
        "m = 1;
         n = 2;
         l = [10];
         s = [3, 4];
         D = [| 0, 5, 3 | 5, 0, 4 | 3, 4, 0 |];",
    )
    .unwrap()
}

fn four_items() -> Instance {
    Instance {
        m: 2,
        n: 4,
        l: vec![6, 8],
        s: vec![2, 3, 4, 3],
        d: vec![
            vec![0, 4, 9, 7, 3],
            vec![5, 0, 3, 8, 6],
            vec![8, 2, 0, 4, 5],
            vec![6, 9, 3, 0, 2],
            vec![4, 7, 6, 3, 0],
        ],
    }
}

fn shortest_tour(inst: &Instance, items: &mut Vec<usize>, fixed: usize) -> u64 {
    if fixed == items.len() {
        return inst.tour_length(items);
    }
    let mut best = u64::MAX;
    for i in fixed..items.len() {
        items.swap(fixed, i);
        best = best.min(shortest_tour(inst, items, fixed + 1));
        items.swap(fixed, i);
    }
    best
}

/// Optimum by enumeration, with every courier delivering something.
fn brute_force(inst: &Instance) -> Option<u64> {
    let mut best = None;
    for code in 0..inst.m.pow(inst.n as u32) {
        let mut routes = vec![vec![]; inst.m];
        let mut c = code;
        for j in 0..inst.n {
            routes[c % inst.m].push(j);
            c /= inst.m;
        }
        let fits = routes.iter().enumerate().all(|(k, r)| {
            !r.is_empty() && r.iter().map(|&j| inst.s[j]).sum::<u64>() <= inst.l[k]
        });
        if !fits {
            continue;
        }
        let objective = routes
            .iter_mut()
            .map(|r| shortest_tour(inst, r, 0))
            .max()
            .unwrap();
        best = Some(best.map_or(objective, |b: u64| b.min(objective)));
    }
    best
}

fn options(tighten_objective: bool) -> DriverOptions {
    DriverOptions {
        time_budget: Duration::from_secs(120),
        max_stall: 1000,
        tighten_objective,
    }
}

/// Counts the calls made on it and never answers.
#[derive(Default)]
struct Counting {
    clauses: usize,
    calls: usize,
}

impl Oracle for Counting {
    fn ensure_vars(&mut self, _n_vars: usize) {}

    fn add_clause(&mut self, _lits: Vec<Lit>) {
        self.clauses += 1;
    }

    fn solve(&mut self, _budget: Duration) -> Solution {
        self.calls += 1;
        Solution::Unknown
    }
}

#[test]
fn single_courier_two_items() {
    for &strategy in &Strategy::ALL {
        for &tighten in &[true, false] {
            let mut oracle = cdcl::Solver::default();
            let report = driver::solve(two_items(), strategy, &mut oracle, options(tighten)).unwrap();
            assert_eq!(report.termination, Termination::Optimal, "{} {}", strategy, tighten);
            assert!(report.result.optimal);
            assert_eq!(report.result.obj, Some(12));
            let sol = report.result.sol.unwrap();
            assert!(sol == vec![vec![1, 2]] || sol == vec![vec![2, 1]], "{:?}", sol);
        }
    }
}

#[test]
fn symmetric_tour_is_accepted_in_either_direction() {
    // depot-1 and 2-depot cost 5, 1-2 costs 2
    let inst = Instance {
        m: 1,
        n: 2,
        l: vec![10],
        s: vec![3, 4],
        d: vec![vec![0, 2, 5], vec![2, 0, 5], vec![5, 5, 0]],
    };
    for &strategy in &Strategy::ALL {
        for &tighten in &[true, false] {
            let mut oracle = cdcl::Solver::default();
            let report = driver::solve(inst.clone(), strategy, &mut oracle, options(tighten)).unwrap();
            assert_eq!(report.termination, Termination::Optimal, "{} {}", strategy, tighten);
            assert!(report.result.optimal);
            assert_eq!(report.result.obj, Some(12));
            let sol = report.result.sol.unwrap();
            assert!(sol == vec![vec![1, 2]] || sol == vec![vec![2, 1]], "{:?}", sol);
        }
    }
}

#[test]
fn overloaded_instance_never_reaches_the_oracle() {
    let mut inst = two_items();
    inst.l = vec![5];
    let mut oracle = Counting::default();
    let err = driver::solve(inst, Strategy::Commander, &mut oracle, DriverOptions::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InfeasibleInstance(_)));
    assert_eq!(oracle.calls, 0);
    assert_eq!(oracle.clauses, 0);
}

#[test]
fn two_couriers_reach_the_enumerated_optimum() {
    let inst = four_items();
    let expected = brute_force(&inst).unwrap();
    for &strategy in &Strategy::ALL {
        for &tighten in &[true, false] {
            let mut oracle = cdcl::Solver::default();
            let report = driver::solve(inst.clone(), strategy, &mut oracle, options(tighten)).unwrap();
            assert_eq!(report.termination, Termination::Optimal);
            assert_eq!(report.result.obj, Some(expected), "{} {}", strategy, tighten);
            assert!(report.incumbents.windows(2).all(|w| w[1] < w[0]));
            assert_eq!(report.incumbents.last(), Some(&expected));

            let sol = report.result.sol.unwrap();
            let mut items: Vec<usize> = sol.iter().flatten().copied().collect();
            items.sort();
            assert_eq!(items, vec![1, 2, 3, 4]);
            let longest = sol
                .iter()
                .map(|r| inst.tour_length(&r.iter().map(|j| j - 1).collect::<Vec<_>>()))
                .max();
            assert_eq!(longest, Some(expected));
        }
    }
}

#[test]
fn searches_end_inside_the_budget() {
    let budget = Duration::from_secs(2);
    for &kind in &OracleKind::ALL {
        let start = Instant::now();
        let mut oracle = new_oracle(kind, 11);
        let opts = DriverOptions {
            time_budget: budget,
            ..DriverOptions::default()
        };
        let report = driver::solve(four_items(), Strategy::Sequential, oracle.as_mut(), opts).unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed < budget + Duration::from_secs(5), "{:?} took {:?}", kind, elapsed);
        assert!(report.result.time <= 7);
        if report.termination != Termination::Infeasible {
            assert!(report.result.obj.is_some());
        }
        if kind == OracleKind::Sls {
            assert_ne!(report.termination, Termination::Optimal);
        }
    }
}

#[test]
fn dimacs_export_matches_the_model() {
    let model = RoutingModel::build(four_items(), Strategy::Bitwise).unwrap();
    let mut out = vec![];
    model.cnf().write_dimacs(model.n_vars(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, format!("p cnf {} {}", model.n_vars(), model.cnf().len()));
    assert_eq!(text.lines().count(), model.cnf().len() + 1);
}
