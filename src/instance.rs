//! Module for parsing and representing delivery instances.
//!
//! An instance is a list of orders, each a restaurant pickup point and a house
//! dropoff point on an integer grid, together with the depot every route starts
//! and ends at and the number of orders a route has to serve.

use crate::error::SolverError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Number of orders in a standard input
pub const NUM_ORDERS: usize = 1000;

/// Number of orders a route has to serve
pub const SUBSET_SIZE: usize = 50;

/// Start and end of every route
pub const DEPOT: Point = Point { x: 400, y: 400 };

/// A grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    /// Manhattan distance to another point
    #[inline]
    pub fn distance(&self, other: &Point) -> u64 {
        manhattan_distance(*self, *other)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// `|x0 - x1| + |y0 - y1|`, exact for the whole `i32` range
#[inline]
pub fn manhattan_distance(p0: Point, p1: Point) -> u64 {
    p0.x.abs_diff(p1.x) as u64 + p0.y.abs_diff(p1.y) as u64
}

/// A delivery order: pick up at a restaurant, drop off at a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier (0-indexed internally, 1-indexed in answers)
    pub id: usize,
    /// Restaurant
    pub pickup: Point,
    /// House
    pub dropoff: Point,
}

impl Order {
    pub fn new(id: usize, pickup: Point, dropoff: Point) -> Self {
        Order { id, pickup, dropoff }
    }

    /// Distance from the restaurant to the house
    pub fn length(&self) -> u64 {
        self.pickup.distance(&self.dropoff)
    }
}

/// Represents a complete delivery instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryInstance {
    /// All orders, in input order
    pub orders: Vec<Order>,
    /// Start and end of every route
    pub depot: Point,
    /// Number of orders a route has to serve
    pub subset_size: usize,
}

impl DeliveryInstance {
    pub fn new(orders: Vec<Order>) -> Self {
        DeliveryInstance {
            orders,
            depot: DEPOT,
            subset_size: SUBSET_SIZE,
        }
    }

    pub fn with_depot(mut self, depot: Point) -> Self {
        self.depot = depot;
        self
    }

    pub fn with_subset_size(mut self, subset_size: usize) -> Self {
        self.subset_size = subset_size;
        self
    }

    /// Number of orders in the instance
    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// The orders a route serves: the first `subset_size` in input order.
    pub fn selected_orders(&self) -> Result<&[Order], SolverError> {
        if self.orders.len() < self.subset_size {
            return Err(SolverError::InsufficientOrders {
                required: self.subset_size,
                available: self.orders.len(),
            });
        }
        Ok(&self.orders[..self.subset_size])
    }

    /// Parse an instance from a file of `a b c d` lines
    pub fn from_file<P: AsRef<Path>>(path: P, num_orders: usize) -> Result<Self, SolverError> {
        let file = File::open(&path)?;
        Self::from_reader(BufReader::new(file), num_orders)
    }

    /// Parse an instance from an in-memory string
    pub fn parse_str(text: &str, num_orders: usize) -> Result<Self, SolverError> {
        Self::from_reader(text.as_bytes(), num_orders)
    }

    /// Parse `num_orders` lines of four integers `a b c d`: pickup `(a, b)`,
    /// dropoff `(c, d)`. Blank lines are skipped, anything after the last
    /// order is ignored.
    pub fn from_reader<R: BufRead>(reader: R, num_orders: usize) -> Result<Self, SolverError> {
        let mut orders = Vec::with_capacity(num_orders);
        let mut last_line = 0;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            last_line = line_no;
            let line = line.map_err(|e| match e.kind() {
                ErrorKind::InvalidData => SolverError::MalformedInput {
                    line: line_no,
                    reason: "not valid UTF-8".to_string(),
                },
                _ => SolverError::Io(e),
            })?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if orders.len() == num_orders {
                log::debug!("ignoring input after line {}", line_no - 1);
                break;
            }

            let values = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<i32>().map_err(|_| SolverError::MalformedInput {
                        line: line_no,
                        reason: format!("'{}' is not an integer", token),
                    })
                })
                .collect::<Result<Vec<i32>, _>>()?;

            if values.len() != 4 {
                return Err(SolverError::MalformedInput {
                    line: line_no,
                    reason: format!("expected 4 integers, found {}", values.len()),
                });
            }

            let id = orders.len();
            orders.push(Order::new(
                id,
                Point::new(values[0], values[1]),
                Point::new(values[2], values[3]),
            ));
        }

        if orders.len() < num_orders {
            return Err(SolverError::MalformedInput {
                line: last_line + 1,
                reason: format!("expected {} orders, found {}", num_orders, orders.len()),
            });
        }

        log::debug!("loaded {} orders", orders.len());
        Ok(DeliveryInstance::new(orders))
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let points = self.orders.iter().flat_map(|o| [o.pickup, o.dropoff]);
        let (mut min, mut max) = (self.depot, self.depot);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }

        let n = self.orders.len().max(1) as f64;
        let avg_order_length = self.orders.iter().map(|o| o.length() as f64).sum::<f64>() / n;
        let max_order_length = self.orders.iter().map(|o| o.length()).max().unwrap_or(0);
        let avg_depot_distance = self.orders.iter()
            .map(|o| self.depot.distance(&o.pickup) as f64)
            .sum::<f64>() / n;

        InstanceStatistics {
            num_orders: self.orders.len(),
            subset_size: self.subset_size,
            depot: self.depot,
            min_corner: min,
            max_corner: max,
            avg_order_length,
            max_order_length,
            avg_depot_distance,
        }
    }
}

/// Statistics about a delivery instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub num_orders: usize,
    pub subset_size: usize,
    pub depot: Point,
    pub min_corner: Point,
    pub max_corner: Point,
    pub avg_order_length: f64,
    pub max_order_length: u64,
    /// Mean distance from the depot to a restaurant
    pub avg_depot_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Orders: {} ({} served per route)", self.num_orders, self.subset_size)?;
        writeln!(f, "  Depot: ({}, {})", self.depot.x, self.depot.y)?;
        writeln!(f, "  Bounding box: ({}, {}) - ({}, {})",
            self.min_corner.x, self.min_corner.y, self.max_corner.x, self.max_corner.y)?;
        writeln!(f, "  Avg order length: {:.2}", self.avg_order_length)?;
        writeln!(f, "  Max order length: {}", self.max_order_length)?;
        writeln!(f, "  Avg depot -> restaurant: {:.2}", self.avg_depot_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("{} {} {} {}\n", i, i + 1, i + 2, i + 3)).collect()
    }

    #[test]
    fn test_distance_calculation() {
        let a = Point::new(0, 0);
        let b = Point::new(3, -4);
        assert_eq!(manhattan_distance(a, b), 7);
        assert_eq!(b.distance(&a), 7);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_distance_extreme_coordinates() {
        let a = Point::new(i32::MIN, 7);
        let b = Point::new(i32::MAX, 7);
        assert_eq!(manhattan_distance(a, b), u32::MAX as u64);

        let a = Point::new(i32::MIN, i32::MIN);
        let b = Point::new(i32::MAX, i32::MAX);
        assert_eq!(manhattan_distance(a, b), 2 * u32::MAX as u64);
        assert_eq!(b.distance(&a), 2 * u32::MAX as u64);
    }

    #[test]
    fn test_parse_extreme_order_length() {
        let instance = DeliveryInstance::parse_str("-2147483648 -2147483648 2147483647 2147483647\n", 1).unwrap();
        assert_eq!(instance.orders[0].length(), 2 * u32::MAX as u64);
        assert_eq!(instance.statistics().max_order_length, 2 * u32::MAX as u64);
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(12, 345).to_string(), "12 345");
    }

    #[test]
    fn test_parse_orders() {
        let instance = DeliveryInstance::parse_str(&lines(3), 3).unwrap();
        assert_eq!(instance.num_orders(), 3);
        assert_eq!(instance.orders[2], Order::new(2, Point::new(2, 3), Point::new(4, 5)));
        assert_eq!(instance.depot, DEPOT);
        assert_eq!(instance.subset_size, SUBSET_SIZE);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_ignores_trailing() {
        let text = format!("\n{}\n   \n9 9 9 9\n", lines(2));
        let instance = DeliveryInstance::parse_str(&text, 2).unwrap();
        assert_eq!(instance.num_orders(), 2);
        assert_eq!(instance.orders[1].pickup, Point::new(1, 2));
    }

    #[test]
    fn test_parse_too_few_lines() {
        let err = DeliveryInstance::parse_str(&lines(2), 3).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 3, .. }));
    }

    #[test]
    fn test_parse_bad_token() {
        let err = DeliveryInstance::parse_str("1 2 3 4\n1 2 x 4\n", 2).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 2, .. }));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let bytes: &[u8] = b"1 2 3 4\n\xff\xfe 1 2 3\n";
        let err = DeliveryInstance::from_reader(bytes, 2).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 2, .. }));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let err = DeliveryInstance::parse_str("1 2 3\n", 1).unwrap_err();
        assert!(matches!(err, SolverError::MalformedInput { line: 1, .. }));
    }

    #[test]
    fn test_selected_orders() {
        let instance = DeliveryInstance::parse_str(&lines(5), 5).unwrap()
            .with_subset_size(3);
        let selected = instance.selected_orders().unwrap();
        assert_eq!(selected.iter().map(|o| o.id).collect::<Vec<_>>(), vec![0, 1, 2]);

        let err = instance.with_subset_size(6).selected_orders().unwrap_err();
        assert!(matches!(err, SolverError::InsufficientOrders { required: 6, available: 5 }));
    }

    #[test]
    fn test_statistics() {
        let orders = vec![
            Order::new(0, Point::new(0, 0), Point::new(10, 0)),
            Order::new(1, Point::new(800, 800), Point::new(800, 790)),
        ];
        let stats = DeliveryInstance::new(orders).statistics();
        assert_eq!(stats.num_orders, 2);
        assert_eq!(stats.min_corner, Point::new(0, 0));
        assert_eq!(stats.max_corner, Point::new(800, 800));
        assert_eq!(stats.max_order_length, 10);
        assert!((stats.avg_order_length - 10.0).abs() < 1e-10);
        assert!((stats.avg_depot_distance - 800.0).abs() < 1e-10);
    }
}
