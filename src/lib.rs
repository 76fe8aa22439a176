//! Delivery Route Solver Library
//!
//! Builds and scores pickup-and-delivery routes: from a list of orders
//! (restaurant pickup, house dropoff) a route serves a fixed number of them,
//! leaving from and returning to a depot, and is scored on its total
//! Manhattan length.
//!
//! # Features
//!
//! - Nearest neighbour and sequential route construction
//! - A time-budgeted improvement hook with a random swap/relocate search
//! - A route validator and score calculator
//! - Benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use delivery_route_solver::instance::{DeliveryInstance, NUM_ORDERS};
//! use delivery_route_solver::solver::{DeliverySolver, SolverConfig};
//!
//! let instance = DeliveryInstance::from_file("input.txt", NUM_ORDERS).unwrap();
//! let solver = DeliverySolver::new(SolverConfig::default());
//! let solution = solver.solve(&instance).unwrap();
//!
//! println!("Score: {}", solution.score);
//! print!("{}", solution.answer());
//! ```

pub mod error;
pub mod instance;
pub mod solution;
pub mod scoring;
pub mod heuristics;
pub mod solver;
pub mod benchmark;

pub use error::SolverError;
pub use instance::{DeliveryInstance, Order, Point};
pub use solution::{Answer, Solution};
pub use solver::{DeliverySolver, SolverConfig};
