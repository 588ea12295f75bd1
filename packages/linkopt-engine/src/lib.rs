//! Assignment optimization: qualification matrix in, ranked links out.
//!
//! [`build`] turns a [`QualificationMatrix`](linkopt_domain::QualificationMatrix) into a binary
//! program, [`solve`] runs branch and bound over it and [`extract`] maps the selected pairs
//! back to element identifiers.

pub mod extract;
pub mod model;
pub mod solver;

mod error;
mod heuristic;
mod simplex;

pub use error::{Error, Result};
pub use extract::extract;
pub use model::{Constraint, ConstraintKind, Model, Sense, build};
pub use solver::{CancelToken, Solution, SolveStats, SolveStatus, solve, solve_cancellable};
