//! Solver driver: build a route, improve it until the time budget runs out,
//! then score it.

use crate::error::SolverError;
use crate::heuristics::construction::{
    ConstructionHeuristic, NearestNeighborHeuristic, SequentialHeuristic,
};
use crate::heuristics::improvement::{Improvement, NoImprovement, RandomSwapSearch, DEFAULT_SEED};
use crate::instance::DeliveryInstance;
use crate::scoring;
use crate::solution::Solution;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

/// Default time budget in milliseconds
pub const TIME_LIMIT_MS: u64 = 1700;

/// Default time budget, measured from program start
pub const TIME_LIMIT: Duration = Duration::from_millis(TIME_LIMIT_MS);

/// Construction heuristic choices
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Construction {
    NearestNeighbor,
    Sequential,
}

impl Construction {
    pub const ALL: [Construction; 2] = [Construction::NearestNeighbor, Construction::Sequential];

    pub fn build(&self) -> Box<dyn ConstructionHeuristic + Send + Sync> {
        match self {
            Construction::NearestNeighbor => Box::new(NearestNeighborHeuristic::new()),
            Construction::Sequential => Box::new(SequentialHeuristic::new()),
        }
    }
}

/// Improvement choices for the time budget
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Improver {
    None,
    RandomSwap,
}

impl Improver {
    pub const ALL: [Improver; 2] = [Improver::None, Improver::RandomSwap];

    pub fn build(&self, seed: u64, moves_per_call: usize) -> Box<dyn Improvement + Send> {
        match self {
            Improver::None => Box::new(NoImprovement),
            Improver::RandomSwap => Box::new(RandomSwapSearch::with_params(seed, moves_per_call)),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub construction: Construction,
    pub improver: Improver,
    /// Budget for construction plus improvement
    pub time_limit: Duration,
    pub seed: u64,
    /// Moves tried per improvement call, between clock checks
    pub moves_per_call: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            construction: Construction::NearestNeighbor,
            improver: Improver::None,
            time_limit: TIME_LIMIT,
            seed: DEFAULT_SEED,
            moves_per_call: 64,
        }
    }
}

pub struct DeliverySolver {
    pub config: SolverConfig,
}

impl DeliverySolver {
    pub fn new(config: SolverConfig) -> Self {
        DeliverySolver { config }
    }

    /// Solve with the budget starting now
    pub fn solve(&self, instance: &DeliveryInstance) -> Result<Solution, SolverError> {
        self.solve_from(instance, Instant::now())
    }

    /// Solve with the budget measured from `started`.
    ///
    /// The improvement step runs until `started + time_limit`, even when it
    /// does nothing, and the final route is validated once more at the end.
    pub fn solve_from(&self, instance: &DeliveryInstance, started: Instant) -> Result<Solution, SolverError> {
        let heuristic = self.config.construction.build();
        let mut improver = self.config.improver.build(self.config.seed, self.config.moves_per_call);

        let mut solution = heuristic.construct(instance)?;
        log::info!(
            "{} built a route of {} stops, distance {}, score {}",
            heuristic.name(),
            solution.stops.len(),
            solution.distance,
            solution.score
        );

        let deadline = started + self.config.time_limit;
        let mut iterations = 0usize;
        let mut improvements = 0usize;
        while Instant::now() < deadline {
            if improver.improve(instance, &mut solution, deadline) {
                improvements += 1;
            }
            iterations += 1;
        }
        log::info!(
            "{} ran {} iterations, {} improvements",
            improver.name(),
            iterations,
            improvements
        );

        solution.validate(instance);
        solution.algorithm = format!("{}+{}", heuristic.name(), improver.name());
        solution.iterations = Some(iterations);
        solution.computation_time = started.elapsed().as_secs_f64();
        Ok(solution)
    }

    /// Read `num_orders` orders from `input`, solve for the first
    /// `subset_size`, write `score: N` to `diagnostics` and the two answer
    /// lines to `out`.
    ///
    /// Nothing is written to either sink when the input is malformed or a
    /// route cannot be built.
    pub fn run<R: BufRead, W: Write, E: Write>(
        &self,
        input: R,
        num_orders: usize,
        subset_size: usize,
        started: Instant,
        out: &mut W,
        diagnostics: &mut E,
    ) -> Result<Solution, SolverError> {
        let instance = DeliveryInstance::from_reader(input, num_orders)?.with_subset_size(subset_size);
        log::info!("{}", instance.statistics());

        let solution = self.solve_from(&instance, started)?;
        let answer = solution.answer();

        let score = scoring::calc_score(&instance, &answer.order_ids, &answer.points);
        writeln!(diagnostics, "score: {}", score)?;

        write!(out, "{}", answer)?;
        out.flush()?;
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Order, Point, DEPOT};
    use crate::solution::Answer;

    fn create_test_instance(n: usize) -> DeliveryInstance {
        let orders = (0..n)
            .map(|id| {
                let a = (id * 131 % 801) as i32;
                let b = (id * 347 % 801) as i32;
                let c = (id * 593 % 801) as i32;
                let d = (id * 761 % 801) as i32;
                Order::new(id, Point::new(a, b), Point::new(c, d))
            })
            .collect();
        DeliveryInstance::new(orders)
    }

    fn quick_config(improver: Improver) -> SolverConfig {
        SolverConfig {
            improver,
            time_limit: Duration::from_millis(50),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.construction, Construction::NearestNeighbor);
        assert_eq!(config.improver, Improver::None);
        assert_eq!(config.time_limit, Duration::from_millis(1700));
        assert_eq!(config.seed, 445);
        assert_eq!(TIME_LIMIT.as_millis() as u64, TIME_LIMIT_MS);
    }

    #[test]
    fn test_default_solve_matches_construction() {
        let instance = create_test_instance(1000);
        let solver = DeliverySolver::new(quick_config(Improver::None));
        let solution = solver.solve(&instance).unwrap();
        let built = NearestNeighborHeuristic::new().construct(&instance).unwrap();

        assert_eq!(solution.points(), built.points());
        assert_eq!(solution.score, built.score);
        assert!(solution.valid);
        assert_eq!(solution.algorithm, "NearestNeighbor+None");
    }

    #[test]
    fn test_solve_waits_for_budget() {
        let instance = create_test_instance(1000);
        let started = Instant::now();
        let solver = DeliverySolver::new(quick_config(Improver::None));
        let solution = solver.solve_from(&instance, started).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(solution.iterations.unwrap() > 0);
    }

    #[test]
    fn test_expired_budget_skips_improvement() {
        let instance = create_test_instance(1000);
        let config = SolverConfig {
            time_limit: Duration::ZERO,
            ..Default::default()
        };
        let solution = DeliverySolver::new(config).solve(&instance).unwrap();
        assert_eq!(solution.iterations, Some(0));
        assert!(solution.valid);
    }

    #[test]
    fn test_random_swap_does_not_worsen() {
        let instance = create_test_instance(1000);
        let baseline = DeliverySolver::new(quick_config(Improver::None)).solve(&instance).unwrap();
        let improved = DeliverySolver::new(quick_config(Improver::RandomSwap)).solve(&instance).unwrap();
        assert!(improved.valid);
        assert!(improved.distance <= baseline.distance);
        assert!(improved.score >= baseline.score);
        assert_eq!(improved.order_ids, baseline.order_ids);
    }

    #[test]
    fn test_insufficient_orders() {
        let instance = create_test_instance(10);
        let err = DeliverySolver::new(quick_config(Improver::None)).solve(&instance).unwrap_err();
        assert!(matches!(err, SolverError::InsufficientOrders { .. }));
    }

    #[test]
    fn test_sequential_construction() {
        let instance = create_test_instance(100);
        let config = SolverConfig {
            construction: Construction::Sequential,
            time_limit: Duration::ZERO,
            ..Default::default()
        };
        let solution = DeliverySolver::new(config).solve(&instance).unwrap();
        assert_eq!(solution.points()[1], instance.orders[0].pickup);
        assert_eq!(solution.points()[0], DEPOT);
    }

    #[test]
    fn test_run_writes_answer_and_score() {
        let instance = create_test_instance(1000);
        let text: String = instance.orders.iter()
            .map(|o| format!("{} {}\n", o.pickup, o.dropoff))
            .collect();

        let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
        let solver = DeliverySolver::new(quick_config(Improver::None));
        let solution = solver
            .run(text.as_bytes(), 1000, 50, Instant::now(), &mut out, &mut diagnostics)
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.lines().count(), 2);
        let answer = Answer::parse(&printed).unwrap();
        assert_eq!(answer.order_ids.len(), 50);
        assert_eq!(answer.points.len(), 102);
        assert_eq!(answer, solution.answer());

        let diagnostics = String::from_utf8(diagnostics).unwrap();
        assert_eq!(diagnostics, format!("score: {}\n", solution.score));
        assert!(solution.score > 0);
    }

    #[test]
    fn test_run_malformed_input_writes_nothing() {
        let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
        let solver = DeliverySolver::new(quick_config(Improver::None));

        let err = solver
            .run("1 2 3 4\n5 6 x 8\n".as_bytes(), 1000, 50, Instant::now(), &mut out, &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 2, .. }));
        assert!(out.is_empty());
        assert!(diagnostics.is_empty());

        let short: String = (0..10).map(|i| format!("{} {} {} {}\n", i, i, i, i)).collect();
        let err = solver
            .run(short.as_bytes(), 1000, 50, Instant::now(), &mut out, &mut diagnostics)
            .unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 11, .. }));
        assert!(out.is_empty());
    }
}
