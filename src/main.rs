use log::{error, info, warn, LevelFilter};
use mcpsat::driver::{self, DriverOptions};
use mcpsat::encoding::Strategy;
use mcpsat::errors::*;
use mcpsat::model::RoutingModel;
use mcpsat::oracle::{new_oracle, OracleKind};
use mcpsat::parser::parse_instance;
use mcpsat::result::{write_results, ResultTable, SolveResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "mcpsat", about = "Solve Multiple Couriers instances with SAT")]
struct Opt {
    /// Instance file, `.dzn` or `.dat`.
    #[structopt(parse(from_os_str))]
    instance: PathBuf,

    /// At-most-one encoding: pairwise (np), sequential (seq), bitwise (bw)
    /// or commander (he).
    #[structopt(short = "e", long = "encoding", default_value = "sequential")]
    encoding: Strategy,

    /// Satisfiability oracle: cdcl or wsat.
    #[structopt(short = "o", long = "oracle", default_value = "cdcl")]
    oracle: OracleKind,

    /// Run every oracle with every encoding.
    #[structopt(long = "all")]
    all: bool,

    /// Time budget of each approach, in seconds.
    #[structopt(short = "t", long = "time-limit", default_value = "300")]
    time_limit: u64,

    /// Give up after this many consecutive non-improving answers.
    #[structopt(long = "max-stall", default_value = "250")]
    max_stall: usize,

    /// Only block seen solutions, never bound the objective.
    #[structopt(long = "no-tightening")]
    no_tightening: bool,

    /// Seed of the local search.
    #[structopt(long = "seed", default_value = "0")]
    seed: u64,

    /// Write the result JSON here instead of stdout.
    #[structopt(long = "output", parse(from_os_str))]
    output: Option<PathBuf>,

    /// Write the model of the selected encoding in DIMACS.
    #[structopt(long = "emit-cnf", parse(from_os_str))]
    emit_cnf: Option<PathBuf>,

    /// Enable debug logging.
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

fn configure_logging(verbose: bool) {
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "c {} {}", record.level(), record.args()))
        .filter_level(level_filter)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(opt: &Opt) -> Result<()> {
    let instance = parse_instance(&opt.instance)?;
    info!("instance: {} couriers, {} items", instance.m, instance.n);

    if let Some(path) = &opt.emit_cnf {
        let model = RoutingModel::build(instance.clone(), opt.encoding)?;
        let mut file = BufWriter::new(File::create(path)?);
        model.cnf().write_dimacs(model.n_vars(), &mut file)?;
        info!("wrote {} clauses to {}", model.cnf().len(), path.display());
    }

    let approaches: Vec<(OracleKind, Strategy)> = if opt.all {
        OracleKind::ALL
            .iter()
            .flat_map(|&kind| Strategy::ALL.iter().map(move |&strategy| (kind, strategy)))
            .collect()
    } else {
        vec![(opt.oracle, opt.encoding)]
    };
    let options = DriverOptions {
        time_budget: Duration::from_secs(opt.time_limit),
        max_stall: opt.max_stall,
        tighten_objective: !opt.no_tightening,
    };

    let mut table = ResultTable::new();
    for (kind, strategy) in approaches {
        let name = format!("{}_{}", kind.tag(), strategy.tag());
        info!("running {}", name);
        let start = Instant::now();
        let mut oracle = new_oracle(kind, opt.seed);
        let result = match driver::solve(instance.clone(), strategy, oracle.as_mut(), options) {
            Ok(report) => report.result,
            Err(e) => {
                if !matches!(e.kind(), ErrorKind::InfeasibleInstance(_)) {
                    return Err(e);
                }
                warn!("{}", e);
                SolveResult::unsolved(start.elapsed())
            }
        };
        table.insert(name, result);
    }

    match &opt.output {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write_results(&table, &mut file)?;
        }
        None => {
            let stdout = io::stdout();
            write_results(&table, &mut stdout.lock())?;
        }
    }
    Ok(())
}

fn main() {
    let opt = Opt::from_args();
    configure_logging(opt.verbose);
    if let Err(e) = run(&opt) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
