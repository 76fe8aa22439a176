use crate::error::SolverError;
use crate::instance::{DeliveryInstance, Order, Point};
use crate::solution::{Solution, Stop};
use std::collections::HashSet;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &DeliveryInstance) -> Result<Solution, SolverError>;
    fn name(&self) -> &str;
}

/// Two-phase Nearest Neighbor Heuristic
///
/// Serves the first `subset_size` orders of the instance. Starting from the
/// depot it repeatedly visits the nearest restaurant not yet visited, then,
/// from the last restaurant, the nearest house not yet visited. Every pickup
/// precedes every dropoff, so the route is always valid.
///
/// Ties go to the order that comes first in the input.
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }

    /// One greedy pass over `orders`, visiting `target(order)` for each.
    fn visit_nearest<F>(
        orders: &[Order],
        current: &mut Point,
        target: F,
        make_stop: fn(&Order) -> Stop,
        stops: &mut Vec<Stop>,
    ) where
        F: Fn(&Order) -> Point,
    {
        let mut visited = HashSet::with_capacity(orders.len());
        for _ in 0..orders.len() {
            let here = *current;
            // min_by_key keeps the first of several equal minima
            let next = orders
                .iter()
                .filter(|o| !visited.contains(&o.id))
                .min_by_key(|o| target(*o).distance(&here));
            let Some(next) = next else {
                break;
            };
            visited.insert(next.id);
            stops.push(make_stop(next));
            *current = target(next);
        }
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, instance: &DeliveryInstance) -> Result<Solution, SolverError> {
        let start = std::time::Instant::now();
        let selected = instance.selected_orders()?;

        let mut stops = Vec::with_capacity(2 * selected.len());
        let mut current = instance.depot;

        Self::visit_nearest(selected, &mut current, |o| o.pickup, Stop::pickup, &mut stops);
        log::debug!("pickup phase ends at ({}) after {} stops", current, stops.len());
        Self::visit_nearest(selected, &mut current, |o| o.dropoff, Stop::dropoff, &mut stops);

        let order_ids = selected.iter().map(|o| o.id).collect();
        let mut solution = Solution::from_stops(instance, order_ids, stops, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Sequential Heuristic
///
/// Visits the restaurants of the first `subset_size` orders in input order,
/// then their houses in input order. A baseline for the greedy builder.
pub struct SequentialHeuristic;

impl SequentialHeuristic {
    pub fn new() -> Self {
        SequentialHeuristic
    }
}

impl Default for SequentialHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for SequentialHeuristic {
    fn construct(&self, instance: &DeliveryInstance) -> Result<Solution, SolverError> {
        let start = std::time::Instant::now();
        let selected = instance.selected_orders()?;

        let stops = selected.iter().map(Stop::pickup)
            .chain(selected.iter().map(Stop::dropoff))
            .collect();
        let order_ids = selected.iter().map(|o| o.id).collect();

        let mut solution = Solution::from_stops(instance, order_ids, stops, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        "Sequential"
    }
}
