//! Improvement heuristics run inside the time budget.
//!
//! The solver calls [`Improvement::improve`] repeatedly until the deadline
//! passes. Each call may change the route; it must never make it longer or
//! break pickup-before-dropoff.

use crate::instance::DeliveryInstance;
use crate::solution::{Move, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 445;

/// Trait for improvement methods
pub trait Improvement {
    /// Try to improve `solution` before `deadline`. Returns whether it changed.
    fn improve(&mut self, instance: &DeliveryInstance, solution: &mut Solution, deadline: Instant) -> bool;
    fn name(&self) -> &str;
}

/// Leaves the route untouched; the solver just waits out the budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImprovement;

impl Improvement for NoImprovement {
    fn improve(&mut self, _instance: &DeliveryInstance, _solution: &mut Solution, _deadline: Instant) -> bool {
        false
    }

    fn name(&self) -> &str {
        "None"
    }
}

/// Random Swap Search
///
/// Each call draws up to `moves_per_call` random swap or relocation moves
/// over the stops and applies the first feasible one that shortens the
/// route. The order selection is never changed.
pub struct RandomSwapSearch {
    pub seed: u64,
    pub moves_per_call: usize,
    rng: ChaCha8Rng,
}

impl RandomSwapSearch {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_SEED, 64)
    }

    pub fn with_params(seed: u64, moves_per_call: usize) -> Self {
        RandomSwapSearch {
            seed,
            moves_per_call: moves_per_call.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn random_move(&mut self, n: usize) -> Move {
        let i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        if self.rng.gen_bool(0.5) {
            Move::Swap(i.min(j), i.max(j))
        } else {
            Move::Relocate(i, j)
        }
    }
}

impl Default for RandomSwapSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Improvement for RandomSwapSearch {
    fn improve(&mut self, instance: &DeliveryInstance, solution: &mut Solution, deadline: Instant) -> bool {
        let n = solution.stops.len();
        if n < 2 {
            return false;
        }

        for _ in 0..self.moves_per_call {
            if Instant::now() >= deadline {
                break;
            }
            let mv = self.random_move(n);
            let delta = mv.delta(solution);
            if delta < 0 && mv.is_feasible(solution) {
                mv.apply(solution);
                solution.validate(instance);
                log::debug!("{:?} shortened the route by {} to {}", mv, -delta, solution.distance);
                return true;
            }
        }
        false
    }

    fn name(&self) -> &str {
        "RandomSwap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::{ConstructionHeuristic, SequentialHeuristic};
    use crate::instance::{Order, Point};
    use std::time::Duration;

    fn create_test_instance() -> DeliveryInstance {
        let orders = (0..60)
            .map(|id| {
                let a = (id * 37 % 801) as i32;
                let b = (id * 211 % 801) as i32;
                let c = (id * 503 % 801) as i32;
                let d = (id * 97 % 801) as i32;
                Order::new(id, Point::new(a, b), Point::new(c, d))
            })
            .collect();
        DeliveryInstance::new(orders)
    }

    #[test]
    fn test_no_improvement_is_identity() {
        let instance = create_test_instance();
        let mut solution = SequentialHeuristic::new().construct(&instance).unwrap();
        let before = solution.clone();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert!(!NoImprovement.improve(&instance, &mut solution, deadline));
        assert_eq!(solution.stops, before.stops);
        assert_eq!(solution.score, before.score);
    }

    #[test]
    fn test_random_swap_never_worsens() {
        let instance = create_test_instance();
        let mut solution = SequentialHeuristic::new().construct(&instance).unwrap();
        let initial = solution.distance;
        let mut search = RandomSwapSearch::with_params(7, 32);
        let deadline = Instant::now() + Duration::from_secs(60);

        let mut last = initial;
        for _ in 0..200 {
            search.improve(&instance, &mut solution, deadline);
            assert!(solution.distance <= last);
            assert!(solution.valid);
            assert!(solution.respects_precedence());
            last = solution.distance;
        }
        assert!(solution.distance < initial);
        assert_eq!(solution.order_ids, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_swap_is_reproducible() {
        let instance = create_test_instance();
        let base = SequentialHeuristic::new().construct(&instance).unwrap();
        let deadline = Instant::now() + Duration::from_secs(60);

        let run = |seed| {
            let mut solution = base.clone();
            let mut search = RandomSwapSearch::with_params(seed, 16);
            for _ in 0..50 {
                search.improve(&instance, &mut solution, deadline);
            }
            solution.stops
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_random_swap_respects_deadline() {
        let instance = create_test_instance();
        let mut solution = SequentialHeuristic::new().construct(&instance).unwrap();
        let before = solution.stops.clone();
        let mut search = RandomSwapSearch::new();
        let expired = Instant::now();
        assert!(!search.improve(&instance, &mut solution, expired));
        assert_eq!(solution.stops, before);
    }
}
