use linkopt_domain::{MIN_SOURCES, MIN_TARGETS, QualificationMatrix};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
	AtMost,
	AtLeast,
	Exactly,
}
impl Sense {
	pub(crate) fn flipped(self) -> Self {
		match self {
			Self::AtMost => Self::AtLeast,
			Self::AtLeast => Self::AtMost,
			Self::Exactly => Self::Exactly,
		}
	}

	pub(crate) fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
		match self {
			Self::AtMost => lhs <= rhs + tolerance,
			Self::AtLeast => lhs >= rhs - tolerance,
			Self::Exactly => (lhs - rhs).abs() <= tolerance,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
	/// A source emits at most one link.
	Cardinality { source: usize },
	/// A target receives at least one link.
	Reachability { target: usize },
}

/// `sum(coefficient * var) <sense> rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
	pub kind: ConstraintKind,
	pub terms: Vec<(usize, f64)>,
	pub sense: Sense,
	pub rhs: f64,
}
impl Constraint {
	pub fn lhs(&self, assignment: &[bool]) -> f64 {
		self.terms
			.iter()
			.filter(|(var, _)| assignment.get(*var).copied().unwrap_or(false))
			.map(|(_, coefficient)| coefficient)
			.sum()
	}
}

/// Binary program over one decision variable per `(source, target)` pair, laid out row-major.
/// The objective is always maximized.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
	sources: usize,
	targets: usize,
	objective: Vec<f64>,
	constraints: Vec<Constraint>,
}
impl Model {
	pub fn sources(&self) -> usize {
		self.sources
	}

	pub fn targets(&self) -> usize {
		self.targets
	}

	pub fn variables(&self) -> usize {
		self.objective.len()
	}

	pub fn objective(&self) -> &[f64] {
		&self.objective
	}

	pub fn constraints(&self) -> &[Constraint] {
		&self.constraints
	}

	pub fn variable(&self, source: usize, target: usize) -> usize {
		source * self.targets + target
	}

	pub fn pair(&self, variable: usize) -> (usize, usize) {
		(variable / self.targets, variable % self.targets)
	}

	/// Every target needs its own source, so more targets than sources can never be covered.
	pub fn coverage_possible(&self) -> bool {
		self.targets <= self.sources
	}

	pub fn evaluate(&self, assignment: &[bool]) -> f64 {
		self.objective
			.iter()
			.zip(assignment)
			.filter(|(_, selected)| **selected)
			.map(|(coefficient, _)| coefficient)
			.sum()
	}

	/// Same program with the objective divided by its largest magnitude, so the solver's
	/// tolerances are relative to the scores rather than absolute.
	pub(crate) fn normalized(&self) -> Model {
		let scale = self.objective.iter().fold(0.0_f64, |max, coefficient| max.max(coefficient.abs()));

		if scale == 0.0 || !scale.is_finite() {
			return self.clone();
		}

		Model {
			sources: self.sources,
			targets: self.targets,
			objective: self.objective.iter().map(|coefficient| coefficient / scale).collect(),
			constraints: self.constraints.clone(),
		}
	}

	pub fn is_feasible(&self, assignment: &[bool]) -> bool {
		assignment.len() == self.variables()
			&& self.constraints.iter().all(|constraint| {
				constraint.sense.holds(constraint.lhs(assignment), constraint.rhs, 0.0)
			})
	}
}

/// Builds the assignment program for a qualification matrix.
pub fn build(matrix: &QualificationMatrix) -> Result<Model> {
	let sources = matrix.sources();
	let targets = matrix.targets();

	if sources < MIN_SOURCES {
		return Err(Error::ModelConstruction {
			message: format!("At least {MIN_SOURCES} source row is required, got {sources}."),
		});
	}
	if targets < MIN_TARGETS {
		return Err(Error::ModelConstruction {
			message: format!("At least {MIN_TARGETS} target columns are required, got {targets}."),
		});
	}

	let mut objective = Vec::with_capacity(sources * targets);

	for e in 0..sources {
		let row = matrix.row(e);

		if row.len() != targets {
			return Err(Error::ModelConstruction {
				message: format!(
					"Qualification row {e} has {} columns, expected {targets}.",
					row.len()
				),
			});
		}

		objective.extend(row.iter().map(|cell| cell.score));
	}

	let mut constraints = Vec::with_capacity(sources + targets);

	for e in 0..sources {
		constraints.push(Constraint {
			kind: ConstraintKind::Cardinality { source: e },
			terms: (0..targets).map(|p| (e * targets + p, 1.0)).collect(),
			sense: Sense::AtMost,
			rhs: 1.0,
		});
	}
	for p in 0..targets {
		constraints.push(Constraint {
			kind: ConstraintKind::Reachability { target: p },
			terms: (0..sources).map(|e| (e * targets + p, 1.0)).collect(),
			sense: Sense::AtLeast,
			rhs: 1.0,
		});
	}

	Ok(Model { sources, targets, objective, constraints })
}
