//! Route validation and scoring.
//!
//! A route is scored as `round(10^8 / (1000 + total distance))` when it is
//! valid, 0 otherwise. Validation never raises: every problem it finds is
//! reported as a diagnostic and the route scores 0.
//!
//! The checks match points, not stops: at every visited point, each selected
//! order that is still pending and picks up at that point becomes picked, then
//! each picked order that drops off at that point is completed. Points of
//! orders outside the selection are never looked at.

use crate::instance::{manhattan_distance, DeliveryInstance, Point};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Numerator of the score formula
pub const SCORE_NUMERATOR: u64 = 100_000_000;

/// Added to the route length before dividing
pub const DISTANCE_OFFSET: u64 = 1000;

/// Reasons a route scores 0
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("route is empty")]
    EmptyRoute,
    #[error("route must start and end at the depot, got ({first}) ... ({last})")]
    NotClosed { first: Point, last: Point },
    #[error("some order ids are duplicated")]
    DuplicateOrderIds,
    #[error("some orders have not been done ({pending} never picked up, {picked} never dropped off)")]
    UnfinishedOrders { pending: usize, picked: usize },
}

/// Outcome of a successful validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total_distance: u64,
    pub score: u32,
}

/// Orders that pick up and drop off at one point
#[derive(Debug, Default)]
struct PointRoles {
    pickups: BTreeSet<usize>,
    dropoffs: BTreeSet<usize>,
}

fn point_roles(instance: &DeliveryInstance) -> HashMap<Point, PointRoles> {
    let mut roles: HashMap<Point, PointRoles> = HashMap::new();
    for order in &instance.orders {
        roles.entry(order.pickup).or_default().pickups.insert(order.id);
        roles.entry(order.dropoff).or_default().dropoffs.insert(order.id);
    }
    roles
}

/// Sum of the Manhattan distances between consecutive points
pub fn route_length(points: &[Point]) -> u64 {
    points
        .windows(2)
        .map(|w| manhattan_distance(w[0], w[1]))
        .sum()
}

/// `round(10^8 / (1000 + total_distance))` in exact integer arithmetic.
///
/// An exact half rounds to the even neighbour.
pub fn score_for_distance(total_distance: u64) -> u32 {
    let denominator = DISTANCE_OFFSET + total_distance;
    let quotient = SCORE_NUMERATOR / denominator;
    let twice_remainder = 2 * (SCORE_NUMERATOR % denominator);

    let rounded = if twice_remainder > denominator {
        quotient + 1
    } else if twice_remainder == denominator {
        quotient + (quotient & 1)
    } else {
        quotient
    };
    rounded as u32
}

/// Check a candidate route and compute its score.
///
/// `order_ids` are the selected orders (0-indexed) in any order, `points` the
/// visited points including both depot visits. A selection whose size differs
/// from the instance's subset size is only warned about.
pub fn validate(
    instance: &DeliveryInstance,
    order_ids: &[usize],
    points: &[Point],
) -> Result<ScoreReport, ValidationFailure> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(ValidationFailure::EmptyRoute),
    };

    if order_ids.len() != instance.subset_size {
        log::warn!(
            "order id count is {}, expected {}",
            order_ids.len(),
            instance.subset_size
        );
    }

    if first != instance.depot || last != instance.depot {
        return Err(ValidationFailure::NotClosed { first, last });
    }

    let roles = point_roles(instance);

    let mut pending: HashSet<usize> = order_ids.iter().copied().collect();
    if pending.len() != order_ids.len() {
        return Err(ValidationFailure::DuplicateOrderIds);
    }
    let mut picked: HashSet<usize> = HashSet::new();

    for point in points {
        let Some(at_point) = roles.get(point) else {
            continue;
        };
        for id in &at_point.pickups {
            if pending.remove(id) {
                picked.insert(*id);
            }
        }
        for id in &at_point.dropoffs {
            picked.remove(id);
        }
    }

    if !pending.is_empty() || !picked.is_empty() {
        return Err(ValidationFailure::UnfinishedOrders {
            pending: pending.len(),
            picked: picked.len(),
        });
    }

    let total_distance = route_length(points);
    Ok(ScoreReport {
        total_distance,
        score: score_for_distance(total_distance),
    })
}

/// Score a route, logging why it scores 0 when it is invalid.
pub fn calc_score(instance: &DeliveryInstance, order_ids: &[usize], points: &[Point]) -> u32 {
    match validate(instance, order_ids, points) {
        Ok(report) => report.score,
        Err(failure) => {
            log::warn!("{}", failure);
            0
        }
    }
}
