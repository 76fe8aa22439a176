//! Delivery Route Solver - Command Line Interface
//!
//! Reads orders, prints the chosen route as two lines on stdout. Diagnostics
//! go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use delivery_route_solver::benchmark::{Benchmark, BenchmarkConfig};
use delivery_route_solver::heuristics::construction::*;
use delivery_route_solver::heuristics::improvement::DEFAULT_SEED;
use delivery_route_solver::instance::{DeliveryInstance, NUM_ORDERS, SUBSET_SIZE};
use delivery_route_solver::scoring;
use delivery_route_solver::solution::Answer;
use delivery_route_solver::solver::{self, DeliverySolver, SolverConfig, TIME_LIMIT_MS};
use delivery_route_solver::SolverError;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "delivery-route-solver")]
#[command(version = "1.0")]
#[command(about = "Builds and scores pickup-and-delivery routes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance (the default, reading stdin)
    Solve(SolveArgs),

    /// Score an answer file against an order file
    Score {
        /// Order file
        #[arg(short, long)]
        input: PathBuf,

        /// Answer file in the two-line output format
        #[arg(short, long)]
        answer: PathBuf,

        #[arg(long, default_value_t = NUM_ORDERS)]
        num_orders: usize,

        #[arg(long, default_value_t = SUBSET_SIZE)]
        subset_size: usize,
    },

    /// Analyze an instance
    Analyze {
        /// Order file
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value_t = NUM_ORDERS)]
        num_orders: usize,
    },

    /// Compare algorithms on an instance
    Compare {
        /// Order file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Time limit per run in milliseconds
        #[arg(short, long, default_value_t = TIME_LIMIT_MS)]
        time_limit_ms: u64,

        /// Output CSV file, one row per run
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output CSV file, one row per algorithm
        #[arg(long)]
        stats_output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SolveArgs {
    /// Order file, stdin when absent
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(long, default_value_t = NUM_ORDERS)]
    num_orders: usize,

    /// Number of orders the route serves
    #[arg(long, default_value_t = SUBSET_SIZE)]
    subset_size: usize,

    /// Time limit in milliseconds, measured from program start
    #[arg(short, long, default_value_t = TIME_LIMIT_MS)]
    time_limit_ms: u64,

    /// Construction algorithm
    #[arg(short, long, value_enum, default_value = "nn")]
    algorithm: Algorithm,

    /// Improvement run inside the time limit
    #[arg(long, value_enum, default_value = "none")]
    improver: ImproverKind,

    /// Random seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Write the solution as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Default for SolveArgs {
    fn default() -> Self {
        SolveArgs {
            input: None,
            num_orders: NUM_ORDERS,
            subset_size: SUBSET_SIZE,
            time_limit_ms: TIME_LIMIT_MS,
            algorithm: Algorithm::Nn,
            improver: ImproverKind::None,
            seed: DEFAULT_SEED,
            output: None,
            verbose: false,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Two-phase nearest neighbour
    Nn,
    /// Pickups then dropoffs in input order
    Sequential,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ImproverKind {
    /// Keep the constructed route
    None,
    /// Random swap/relocate moves
    Swap,
}

fn main() {
    let started = Instant::now();
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Some(Commands::Solve(args)) if args.verbose);
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let result = match cli.command {
        None => solve_instance(SolveArgs::default(), started),
        Some(Commands::Solve(args)) => solve_instance(args, started),
        Some(Commands::Score { input, answer, num_orders, subset_size }) => {
            score_answer(&input, &answer, num_orders, subset_size)
        }
        Some(Commands::Analyze { input, num_orders }) => analyze_instance(&input, num_orders),
        Some(Commands::Compare { input, runs, time_limit_ms, output, stats_output }) => {
            compare_algorithms(&input, runs, time_limit_ms, output, stats_output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(args: SolveArgs, started: Instant) -> Result<(), SolverError> {
    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };

    let config = SolverConfig {
        construction: match args.algorithm {
            Algorithm::Nn => solver::Construction::NearestNeighbor,
            Algorithm::Sequential => solver::Construction::Sequential,
        },
        improver: match args.improver {
            ImproverKind::None => solver::Improver::None,
            ImproverKind::Swap => solver::Improver::RandomSwap,
        },
        time_limit: Duration::from_millis(args.time_limit_ms),
        seed: args.seed,
        ..Default::default()
    };

    let solution = DeliverySolver::new(config).run(
        input,
        args.num_orders,
        args.subset_size,
        started,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr(),
    )?;
    if args.verbose {
        eprint!("{}", solution);
    }

    if let Some(out_path) = args.output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        eprintln!("Solution saved to {:?}", out_path);
    }
    Ok(())
}

fn score_answer(input: &Path, answer: &Path, num_orders: usize, subset_size: usize) -> Result<(), SolverError> {
    let instance = DeliveryInstance::from_file(input, num_orders)?.with_subset_size(subset_size);
    let answer = Answer::parse(&std::fs::read_to_string(answer)?)?;

    match scoring::validate(&instance, &answer.order_ids, &answer.points) {
        Ok(report) => {
            println!("score: {}", report.score);
            println!("distance: {}", report.total_distance);
        }
        Err(failure) => {
            eprintln!("{}", failure);
            println!("score: 0");
        }
    }
    Ok(())
}

fn analyze_instance(input: &Path, num_orders: usize) -> Result<(), SolverError> {
    let instance = DeliveryInstance::from_file(input, num_orders)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let nn = NearestNeighborHeuristic::new().construct(&instance)?;
    let seq = SequentialHeuristic::new().construct(&instance)?;

    println!("Quick Solution Estimates:");
    println!("  Nearest Neighbor: distance {} (score {})", nn.distance, nn.score);
    println!("  Sequential: distance {} (score {})", seq.distance, seq.score);
    Ok(())
}

fn compare_algorithms(
    input: &Path,
    runs: usize,
    time_limit_ms: u64,
    output: Option<PathBuf>,
    stats_output: Option<PathBuf>,
) -> Result<(), SolverError> {
    let instance = DeliveryInstance::from_file(input, NUM_ORDERS)?;

    println!("Comparing algorithms ({} runs, {} ms each)...\n", runs, time_limit_ms);

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit: Duration::from_millis(time_limit_ms),
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.run_all(&instance)?;

    println!("{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Results exported to {:?}", out_path);
    }
    if let Some(out_path) = stats_output {
        benchmark.export_statistics_csv(&out_path)?;
        println!("Statistics exported to {:?}", out_path);
    }
    Ok(())
}
