//! Solution representation and manipulation for the delivery problem.
//!
//! This module provides data structures and methods for representing,
//! manipulating, and evaluating routes, and the two-line answer format
//! routes are exchanged in.

use crate::error::SolverError;
use crate::instance::{DeliveryInstance, Order, Point};
use crate::scoring::{self, route_length};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What happens at a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopKind {
    Pickup,
    Dropoff,
}

/// A visit to a restaurant or a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub order_id: usize,
    pub kind: StopKind,
    pub point: Point,
}

impl Stop {
    pub fn pickup(order: &Order) -> Self {
        Stop { order_id: order.id, kind: StopKind::Pickup, point: order.pickup }
    }

    pub fn dropoff(order: &Order) -> Self {
        Stop { order_id: order.id, kind: StopKind::Dropoff, point: order.dropoff }
    }
}

/// Represents a route serving a selection of orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Selected orders (0-indexed), not necessarily in visiting order
    pub order_ids: Vec<usize>,
    /// Stops between leaving and returning to the depot
    pub stops: Vec<Stop>,
    /// Start and end of the route
    pub depot: Point,
    /// Total Manhattan length of the route
    pub distance: u64,
    /// Score of the route, 0 when invalid
    pub score: u32,
    /// Whether the route passed validation
    pub valid: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of improvement iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from stops and score it
    pub fn from_stops(
        instance: &DeliveryInstance,
        order_ids: Vec<usize>,
        stops: Vec<Stop>,
        algorithm: &str,
    ) -> Self {
        let mut solution = Solution {
            order_ids,
            stops,
            depot: instance.depot,
            distance: 0,
            score: 0,
            valid: false,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        };
        solution.validate(instance);
        solution
    }

    /// Validate and update solution properties
    pub fn validate(&mut self, instance: &DeliveryInstance) {
        let points = self.points();
        match scoring::validate(instance, &self.order_ids, &points) {
            Ok(report) => {
                self.distance = report.total_distance;
                self.score = report.score;
                self.valid = true;
            }
            Err(failure) => {
                log::warn!("{} produced an invalid route: {}", self.algorithm, failure);
                self.distance = route_length(&points);
                self.score = 0;
                self.valid = false;
            }
        }
    }

    /// Visited points, depot to depot
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.stops.len() + 2);
        points.push(self.depot);
        points.extend(self.stops.iter().map(|s| s.point));
        points.push(self.depot);
        points
    }

    /// Length of the route through the current stops
    pub fn route_length(&self) -> u64 {
        route_length(&self.points())
    }

    /// Get the position of a stop in `stops`
    pub fn position(&self, order_id: usize, kind: StopKind) -> Option<usize> {
        self.stops.iter().position(|s| s.order_id == order_id && s.kind == kind)
    }

    /// Every order is picked up strictly before it is dropped off, and each
    /// selected order has exactly one stop of each kind.
    pub fn respects_precedence(&self) -> bool {
        stops_respect_precedence(&self.order_ids, &self.stops)
    }

    /// Point at route position `r`, where 0 and `stops.len() + 1` are the depot
    fn route_point(&self, r: usize) -> Point {
        if r == 0 || r > self.stops.len() {
            self.depot
        } else {
            self.stops[r - 1].point
        }
    }

    /// Calculate the delta length of swapping two stops
    pub fn swap_delta(&self, i: usize, j: usize) -> i64 {
        if i == j {
            return 0;
        }
        let (lo, hi) = (i.min(j) + 1, i.max(j) + 1);
        let swapped = |r: usize| {
            if r == lo {
                self.route_point(hi)
            } else if r == hi {
                self.route_point(lo)
            } else {
                self.route_point(r)
            }
        };

        // edge `e` joins route positions `e` and `e + 1`
        let mut edges = vec![lo - 1, lo, hi - 1, hi];
        edges.dedup();
        edges
            .into_iter()
            .map(|e| {
                swapped(e).distance(&swapped(e + 1)) as i64
                    - self.route_point(e).distance(&self.route_point(e + 1)) as i64
            })
            .sum()
    }

    /// Calculate relocation delta (remove from `from`, insert at `to`)
    pub fn relocation_delta(&self, from: usize, to: usize) -> i64 {
        if from == to {
            return 0;
        }
        let d = |a: Point, b: Point| a.distance(&b) as i64;

        let prev = self.route_point(from);
        let moved = self.route_point(from + 1);
        let next = self.route_point(from + 2);
        let removal = d(prev, next) - d(prev, moved) - d(moved, next);

        // route positions once the stop is taken out
        let reduced = |r: usize| {
            if r <= from {
                self.route_point(r)
            } else {
                self.route_point(r + 1)
            }
        };
        let (before, after) = (reduced(to), reduced(to + 1));
        let insertion = d(before, moved) + d(moved, after) - d(before, after);

        removal + insertion
    }

    /// Apply a swap move
    pub fn apply_swap(&mut self, i: usize, j: usize) {
        self.stops.swap(i, j);
    }

    /// Apply a relocation move: the stop at `from` ends up at index `to`
    pub fn apply_relocation(&mut self, from: usize, to: usize) {
        let stop = self.stops.remove(from);
        self.stops.insert(to, stop);
    }

    /// The route in the two-line exchange format
    pub fn answer(&self) -> Answer {
        Answer {
            order_ids: self.order_ids.clone(),
            points: self.points(),
        }
    }
}

fn stops_respect_precedence(order_ids: &[usize], stops: &[Stop]) -> bool {
    let selected: HashSet<usize> = order_ids.iter().copied().collect();
    let mut picked = HashSet::new();
    let mut dropped = HashSet::new();

    for stop in stops {
        if !selected.contains(&stop.order_id) {
            return false;
        }
        match stop.kind {
            StopKind::Pickup => {
                if !picked.insert(stop.order_id) {
                    return false;
                }
            }
            StopKind::Dropoff => {
                if !picked.contains(&stop.order_id) || !dropped.insert(stop.order_id) {
                    return false;
                }
            }
        }
    }

    dropped.len() == selected.len()
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Score: {}", self.score)?;
        writeln!(f, "  Distance: {}", self.distance)?;
        writeln!(f, "  Valid: {}", self.valid)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Orders: {:?}", self.order_ids)
    }
}

/// Represents a move in local search, over positions in `stops`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Swap(usize, usize),
    Relocate(usize, usize),
}

impl Move {
    /// Whether the route still picks up every order before dropping it off
    pub fn is_feasible(&self, solution: &Solution) -> bool {
        let n = solution.stops.len();
        let (a, b) = match *self {
            Move::Swap(i, j) | Move::Relocate(i, j) => (i, j),
        };
        if a >= n || b >= n {
            return false;
        }
        let mut stops = solution.stops.clone();
        match *self {
            Move::Swap(i, j) => stops.swap(i, j),
            Move::Relocate(from, to) => {
                let stop = stops.remove(from);
                stops.insert(to, stop);
            }
        }
        stops_respect_precedence(&solution.order_ids, &stops)
    }

    pub fn delta(&self, solution: &Solution) -> i64 {
        match *self {
            Move::Swap(i, j) => solution.swap_delta(i, j),
            Move::Relocate(from, to) => solution.relocation_delta(from, to),
        }
    }

    pub fn apply(&self, solution: &mut Solution) {
        match *self {
            Move::Swap(i, j) => solution.apply_swap(i, j),
            Move::Relocate(from, to) => solution.apply_relocation(from, to),
        }
    }
}

/// A route as printed: selected orders and visited points.
///
/// Order ids are 0-indexed here and 1-indexed in the text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub order_ids: Vec<usize>,
    pub points: Vec<Point>,
}

impl Answer {
    /// Read the two-line format back:
    ///
    /// ```text
    /// <k> <id_1> ... <id_k>
    /// <m> <x_1> <y_1> ... <x_m> <y_m>
    /// ```
    pub fn parse(text: &str) -> Result<Self, SolverError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let ids_line = lines
            .next()
            .ok_or_else(|| SolverError::MalformedAnswer("missing order line".to_string()))?;
        let points_line = lines
            .next()
            .ok_or_else(|| SolverError::MalformedAnswer("missing point line".to_string()))?;

        let ids = parse_counted::<usize>(ids_line, 1, "order")?;
        let order_ids = ids
            .into_iter()
            .map(|id| {
                id.checked_sub(1).ok_or_else(|| {
                    SolverError::MalformedAnswer("order ids are 1-indexed, found 0".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let coords = parse_counted::<i32>(points_line, 2, "point")?;
        let points = coords.chunks(2).map(|c| Point::new(c[0], c[1])).collect();

        Ok(Answer { order_ids, points })
    }
}

/// Parse `<count> v_1 ... v_{count * width}`
fn parse_counted<T: std::str::FromStr>(
    line: &str,
    width: usize,
    what: &str,
) -> Result<Vec<T>, SolverError> {
    let mut tokens = line.split_whitespace();
    let count: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| SolverError::MalformedAnswer(format!("missing {} count", what)))?;

    let values = tokens
        .map(|t| {
            t.parse::<T>().map_err(|_| {
                SolverError::MalformedAnswer(format!("'{}' is not a valid {} value", t, what))
            })
        })
        .collect::<Result<Vec<T>, _>>()?;

    let expected = count.checked_mul(width).ok_or_else(|| {
        SolverError::MalformedAnswer(format!("{} count {} is too large", what, count))
    })?;
    if values.len() != expected {
        return Err(SolverError::MalformedAnswer(format!(
            "{} count is {} but {} values follow",
            what,
            count,
            values.len()
        )));
    }
    Ok(values)
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.order_ids.len())?;
        for id in &self.order_ids {
            write!(f, " {}", id + 1)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.points.len())?;
        for point in &self.points {
            write!(f, " {}", point)?;
        }
        writeln!(f)
    }
}
