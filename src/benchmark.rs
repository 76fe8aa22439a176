//! Benchmarking and experimentation module.
//!
//! Runs construction/improvement combinations repeatedly on one instance,
//! collects statistics, and exports them.

use crate::error::SolverError;
use crate::instance::DeliveryInstance;
use crate::heuristics::improvement::DEFAULT_SEED;
use crate::solver::{Construction, DeliverySolver, Improver, SolverConfig, TIME_LIMIT};

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Result of a single solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Construction + improvement label
    pub algorithm: String,
    pub run: usize,
    pub seed: u64,
    pub score: u32,
    pub distance: u64,
    /// Whether the route passed validation
    pub valid: bool,
    /// Computation time in seconds
    pub time: f64,
    pub iterations: Option<usize>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub num_runs: usize,
    pub num_valid: usize,
    pub avg_score: f64,
    pub best_score: u32,
    pub worst_score: u32,
    /// Standard deviation of score
    pub std_score: f64,
    pub avg_distance: f64,
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per combination
    pub num_runs: usize,
    /// Time budget per run
    pub time_limit: Duration,
    /// Run `r` uses seed `base_seed + r`
    pub base_seed: u64,
    /// Run the repetitions of a combination in parallel
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            time_limit: TIME_LIMIT,
            base_seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run one combination `num_runs` times
    pub fn run_strategy(
        &mut self,
        instance: &DeliveryInstance,
        construction: Construction,
        improver: Improver,
    ) -> Result<(), SolverError> {
        let config = &self.config;
        let run_once = |run: usize| -> Result<AlgorithmResult, SolverError> {
            let seed = config.base_seed + run as u64;
            let solver = DeliverySolver::new(SolverConfig {
                construction,
                improver,
                time_limit: config.time_limit,
                seed,
                ..Default::default()
            });
            let solution = solver.solve(instance)?;
            Ok(AlgorithmResult {
                algorithm: solution.algorithm,
                run,
                seed,
                score: solution.score,
                distance: solution.distance,
                valid: solution.valid,
                time: solution.computation_time,
                iterations: solution.iterations,
            })
        };

        let results = if config.parallel {
            (0..config.num_runs)
                .into_par_iter()
                .map(run_once)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (0..config.num_runs)
                .map(run_once)
                .collect::<Result<Vec<_>, _>>()?
        };

        log::info!(
            "{:?}+{:?}: {} runs, best score {}",
            construction,
            improver,
            results.len(),
            results.iter().map(|r| r.score).max().unwrap_or(0)
        );
        self.results.extend(results);
        Ok(())
    }

    /// Run every construction/improvement combination
    pub fn run_all(&mut self, instance: &DeliveryInstance) -> Result<(), SolverError> {
        for construction in Construction::ALL {
            for improver in Improver::ALL {
                self.run_strategy(instance, construction, improver)?;
            }
        }
        Ok(())
    }

    /// Compute statistics for each algorithm, best average score first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm.clone())
                .or_insert_with(Vec::new)
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let scores: Vec<f64> = results.iter().map(|r| r.score as f64).collect();
            let n = scores.len() as f64;

            let avg_score = scores.iter().sum::<f64>() / n;
            let variance = scores.iter()
                .map(|s| (s - avg_score).powi(2))
                .sum::<f64>() / n;

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_runs: results.len(),
                num_valid: results.iter().filter(|r| r.valid).count(),
                avg_score,
                best_score: results.iter().map(|r| r.score).max().unwrap_or(0),
                worst_score: results.iter().map(|r| r.score).min().unwrap_or(0),
                std_score: variance.sqrt(),
                avg_distance: results.iter().map(|r| r.distance as f64).sum::<f64>() / n,
                avg_time: results.iter().map(|r| r.time).sum::<f64>() / n,
            });
        }

        statistics.sort_by_key(|s| std::cmp::Reverse(OrderedFloat(s.avg_score)));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), SolverError> {
        self.write_results_csv(File::create(path)?)
    }

    /// Write one row per run
    pub fn write_results_csv<W: Write>(&self, out: W) -> Result<(), SolverError> {
        let mut writer = csv::Writer::from_writer(out);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), SolverError> {
        self.write_statistics_csv(File::create(path)?)
    }

    /// Write one row per algorithm, best average score first
    pub fn write_statistics_csv<W: Write>(&self, out: W) -> Result<(), SolverError> {
        let mut writer = csv::Writer::from_writer(out);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Delivery Route Benchmark\n");
        report.push_str("========================================\n\n");

        report.push_str(&format!("{:<28} {:>8} {:>12} {:>8} {:>8} {:>10} {:>10}\n",
            "Algorithm", "Valid", "Avg Score", "Best", "Worst", "Std", "Avg Time"));
        report.push_str(&"-".repeat(90));
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!("{:<28} {:>8} {:>12.1} {:>8} {:>8} {:>10.2} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_valid, stat.num_runs),
                stat.avg_score,
                stat.best_score,
                stat.worst_score,
                stat.std_score,
                stat.avg_time));
        }

        report.push_str(&"-".repeat(90));
        report.push('\n');
        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}
