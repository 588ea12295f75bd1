//! Linear relaxation of a [`Model`] under partial variable fixings.
//!
//! Dense two-phase primal simplex. Every free variable lives in `[0, 1]`; an explicit
//! upper-bound row is only added when no `<=` row already implies it, which keeps the
//! assignment relaxation at `sources + targets` rows.

use crate::model::{Model, Sense};

const EPS: f64 = 1e-9;
const FEASIBILITY_TOLERANCE: f64 = 1e-7;
/// Consecutive degenerate pivots tolerated before switching to Bland's rule.
const STALL_LIMIT: usize = 50;
/// Pivots between two checks of the caller's stop condition.
const STOP_CHECK_INTERVAL: usize = 8;

#[derive(Debug, PartialEq)]
pub(crate) enum LpOutcome {
	Optimal { values: Vec<f64>, objective: f64, pivots: usize },
	Infeasible,
	Unbounded,
	Interrupted,
}

struct Row {
	coefficients: Vec<(usize, f64)>,
	sense: Sense,
	rhs: f64,
}

struct Tableau {
	rows: Vec<Vec<f64>>,
	basis: Vec<usize>,
	/// Reduced costs, `c_B * B^-1 * A_j - c_j`, with the objective value in the last slot.
	z: Vec<f64>,
	width: usize,
	pivots: usize,
}
impl Tableau {
	fn rhs(&self, row: usize) -> f64 {
		self.rows[row][self.width - 1]
	}

	fn price(&mut self, costs: &[f64]) {
		let width = self.width;

		self.z = vec![0.0; width];

		for (j, cost) in costs.iter().enumerate() {
			self.z[j] = -cost;
		}
		for (i, &basic) in self.basis.iter().enumerate() {
			let cost = costs[basic];

			if cost == 0.0 {
				continue;
			}

			for j in 0..width {
				self.z[j] += cost * self.rows[i][j];
			}
		}
	}

	fn pivot(&mut self, row: usize, col: usize) {
		let width = self.width;
		let pivot = self.rows[row][col];

		for value in self.rows[row].iter_mut() {
			*value /= pivot;
		}

		let pivot_row = self.rows[row].clone();

		for (i, other) in self.rows.iter_mut().enumerate() {
			if i == row {
				continue;
			}

			let factor = other[col];

			if factor.abs() <= EPS {
				other[col] = 0.0;

				continue;
			}

			for j in 0..width {
				other[j] -= factor * pivot_row[j];
			}
		}

		let factor = self.z[col];

		if factor.abs() > EPS {
			for j in 0..width {
				self.z[j] -= factor * pivot_row[j];
			}
		}

		self.basis[row] = col;
		self.pivots += 1;
	}

	fn entering(&self, allowed: usize, bland: bool) -> Option<usize> {
		if bland {
			return (0..allowed).find(|&j| self.z[j] < -EPS);
		}

		let mut best: Option<(usize, f64)> = None;

		for j in 0..allowed {
			let reduced = self.z[j];

			if reduced < -EPS && best.map(|(_, value)| reduced < value).unwrap_or(true) {
				best = Some((j, reduced));
			}
		}

		best.map(|(j, _)| j)
	}

	fn leaving(&self, col: usize) -> Option<usize> {
		let mut best: Option<(usize, f64)> = None;

		for i in 0..self.rows.len() {
			let coefficient = self.rows[i][col];

			if coefficient <= EPS {
				continue;
			}

			let ratio = self.rhs(i) / coefficient;
			let better = match best {
				None => true,
				Some((current, current_ratio)) =>
					ratio < current_ratio - EPS
						|| (ratio <= current_ratio + EPS && self.basis[i] < self.basis[current]),
			};

			if better {
				best = Some((i, ratio));
			}
		}

		best.map(|(i, _)| i)
	}

	/// Runs primal simplex until optimal. Columns at or beyond `allowed` never enter.
	fn optimize(&mut self, allowed: usize, should_stop: &dyn Fn() -> bool) -> Phase {
		let mut stalled = 0;
		// Check once before the first pivot.
		let mut since_check = STOP_CHECK_INTERVAL - 1;

		loop {
			since_check += 1;

			if since_check >= STOP_CHECK_INTERVAL {
				since_check = 0;

				if should_stop() {
					return Phase::Interrupted;
				}
			}

			let Some(col) = self.entering(allowed, stalled >= STALL_LIMIT) else {
				return Phase::Optimal;
			};
			let Some(row) = self.leaving(col) else {
				return Phase::Unbounded;
			};

			if self.rhs(row).abs() <= EPS {
				stalled += 1;
			} else {
				stalled = 0;
			}

			self.pivot(row, col);
		}
	}
}

enum Phase {
	Optimal,
	Unbounded,
	Interrupted,
}

/// Solves the relaxation of `model` with `fixed[j] = Some(v)` pinning variable `j` to `v`.
pub(crate) fn solve_relaxation(
	model: &Model,
	fixed: &[Option<bool>],
	should_stop: &dyn Fn() -> bool,
) -> LpOutcome {
	let free: Vec<usize> = (0..model.variables()).filter(|&j| fixed[j].is_none()).collect();
	let mut column_of = vec![usize::MAX; model.variables()];

	for (k, &j) in free.iter().enumerate() {
		column_of[j] = k;
	}

	let constant: f64 = model
		.objective()
		.iter()
		.zip(fixed)
		.filter(|(_, fix)| **fix == Some(true))
		.map(|(cost, _)| cost)
		.sum();
	let mut rows = Vec::with_capacity(model.constraints().len());

	for constraint in model.constraints() {
		let mut rhs = constraint.rhs;
		let mut coefficients = Vec::with_capacity(constraint.terms.len());

		for &(var, coefficient) in &constraint.terms {
			match fixed[var] {
				Some(true) => rhs -= coefficient,
				Some(false) => {},
				None if coefficient.abs() > EPS => coefficients.push((column_of[var], coefficient)),
				None => {},
			}
		}

		if coefficients.is_empty() {
			if !constraint.sense.holds(0.0, rhs, FEASIBILITY_TOLERANCE) {
				return LpOutcome::Infeasible;
			}

			continue;
		}

		rows.push(Row { coefficients, sense: constraint.sense, rhs });
	}

	let mut bounded = vec![false; free.len()];

	for row in &rows {
		if row.sense != Sense::AtMost
			|| row.rhs < 0.0
			|| row.coefficients.iter().any(|(_, coefficient)| *coefficient < 0.0)
		{
			continue;
		}

		for &(k, coefficient) in &row.coefficients {
			if row.rhs / coefficient <= 1.0 + EPS {
				bounded[k] = true;
			}
		}
	}
	for (k, implied) in bounded.iter().enumerate() {
		if !implied {
			rows.push(Row { coefficients: vec![(k, 1.0)], sense: Sense::AtMost, rhs: 1.0 });
		}
	}

	if free.is_empty() {
		return LpOutcome::Optimal {
			values: expand(fixed, &free, &[]),
			objective: constant,
			pivots: 0,
		};
	}

	for row in rows.iter_mut() {
		if row.rhs < 0.0 {
			row.rhs = -row.rhs;
			row.sense = row.sense.flipped();

			for (_, coefficient) in row.coefficients.iter_mut() {
				*coefficient = -*coefficient;
			}
		}
	}

	let structural = free.len();
	let slacks = rows.iter().filter(|row| row.sense != Sense::Exactly).count();
	let artificials = rows.iter().filter(|row| row.sense != Sense::AtMost).count();
	let first_artificial = structural + slacks;
	let width = first_artificial + artificials + 1;
	let mut tableau = Tableau {
		rows: Vec::with_capacity(rows.len()),
		basis: Vec::with_capacity(rows.len()),
		z: Vec::new(),
		width,
		pivots: 0,
	};
	let mut next_slack = structural;
	let mut next_artificial = first_artificial;

	for row in &rows {
		let mut dense = vec![0.0; width];

		for &(k, coefficient) in &row.coefficients {
			dense[k] += coefficient;
		}

		dense[width - 1] = row.rhs;

		match row.sense {
			Sense::AtMost => {
				dense[next_slack] = 1.0;
				tableau.basis.push(next_slack);
				next_slack += 1;
			},
			Sense::AtLeast => {
				dense[next_slack] = -1.0;
				next_slack += 1;
				dense[next_artificial] = 1.0;
				tableau.basis.push(next_artificial);
				next_artificial += 1;
			},
			Sense::Exactly => {
				dense[next_artificial] = 1.0;
				tableau.basis.push(next_artificial);
				next_artificial += 1;
			},
		}

		tableau.rows.push(dense);
	}

	if artificials > 0 {
		let mut phase_one = vec![0.0; width - 1];

		for cost in phase_one.iter_mut().skip(first_artificial) {
			*cost = -1.0;
		}

		tableau.price(&phase_one);

		match tableau.optimize(width - 1, should_stop) {
			Phase::Optimal => {},
			Phase::Interrupted => return LpOutcome::Interrupted,
			// Phase one is bounded by zero; only numerical trouble gets here.
			Phase::Unbounded => return LpOutcome::Infeasible,
		}

		if tableau.z[width - 1] < -FEASIBILITY_TOLERANCE {
			return LpOutcome::Infeasible;
		}

		drive_out_artificials(&mut tableau, first_artificial);
	}

	let mut phase_two = vec![0.0; width - 1];

	for (k, &j) in free.iter().enumerate() {
		phase_two[k] = model.objective()[j];
	}

	tableau.price(&phase_two);

	match tableau.optimize(first_artificial, should_stop) {
		Phase::Optimal => {},
		Phase::Interrupted => return LpOutcome::Interrupted,
		Phase::Unbounded => return LpOutcome::Unbounded,
	}

	let mut values = vec![0.0; structural];

	for (i, &basic) in tableau.basis.iter().enumerate() {
		if basic < structural {
			values[basic] = tableau.rhs(i).clamp(0.0, 1.0);
		}
	}

	let objective = constant + tableau.z[width - 1];

	LpOutcome::Optimal { values: expand(fixed, &free, &values), objective, pivots: tableau.pivots }
}

/// Pivots zero-valued artificials out of the basis; rows where that is impossible are
/// linearly dependent and get dropped.
fn drive_out_artificials(tableau: &mut Tableau, first_artificial: usize) {
	let mut i = 0;

	while i < tableau.rows.len() {
		if tableau.basis[i] < first_artificial {
			i += 1;

			continue;
		}

		match (0..first_artificial).find(|&j| tableau.rows[i][j].abs() > EPS) {
			Some(col) => {
				tableau.pivot(i, col);

				i += 1;
			},
			None => {
				tableau.rows.remove(i);
				tableau.basis.remove(i);
			},
		}
	}
}

fn expand(fixed: &[Option<bool>], free: &[usize], values: &[f64]) -> Vec<f64> {
	let mut full: Vec<f64> =
		fixed.iter().map(|fix| if *fix == Some(true) { 1.0 } else { 0.0 }).collect();

	for (k, &j) in free.iter().enumerate() {
		full[j] = values.get(k).copied().unwrap_or(0.0);
	}

	full
}

#[cfg(test)]
mod tests {
	use linkopt_domain::QualificationMatrix;

	use super::*;
	use crate::model::build;

	fn never() -> bool {
		false
	}

	fn relax(rows: &[Vec<f64>], fixed: Option<Vec<Option<bool>>>) -> LpOutcome {
		let model = build(&QualificationMatrix::from_scores(rows).expect("matrix")).expect("model");
		let fixed = fixed.unwrap_or_else(|| vec![None; model.variables()]);

		solve_relaxation(&model, &fixed, &never)
	}

	#[test]
	fn assignment_relaxation_is_integral() {
		let LpOutcome::Optimal { values, objective, .. } =
			relax(&[vec![-4.0, 0.7], vec![0.2, -4.0]], None)
		else {
			panic!("Expected an optimal relaxation.");
		};

		assert!((objective - 0.9).abs() < 1e-9, "objective = {objective}");
		assert_eq!(values.iter().map(|v| v.round()).collect::<Vec<_>>(), vec![0.0, 1.0, 1.0, 0.0]);
	}

	#[test]
	fn more_targets_than_sources_is_infeasible() {
		assert_eq!(relax(&[vec![1.0, 2.0, 3.0]], None), LpOutcome::Infeasible);
	}

	#[test]
	fn fixings_are_respected() {
		// Forcing source 0 to target 0 leaves target 1 to source 1.
		let fixed = vec![Some(true), None, None, None];
		let LpOutcome::Optimal { values, objective, .. } =
			relax(&[vec![-4.0, 0.7], vec![0.2, -4.0]], Some(fixed))
		else {
			panic!("Expected an optimal relaxation.");
		};

		assert!((objective + 8.0).abs() < 1e-9, "objective = {objective}");
		assert_eq!(values[0], 1.0);
		assert!((values[3] - 1.0).abs() < 1e-9);
	}

	#[test]
	fn contradictory_fixings_are_infeasible() {
		// Target 0 has no source left once both candidates are pinned to zero.
		let fixed = vec![Some(false), None, Some(false), None];

		assert_eq!(relax(&[vec![1.0, 1.0], vec![1.0, 1.0]], Some(fixed)), LpOutcome::Infeasible);
	}

	#[test]
	fn positive_extra_sources_are_linked() {
		let LpOutcome::Optimal { objective, .. } =
			relax(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.25]], None)
		else {
			panic!("Expected an optimal relaxation.");
		};

		assert!((objective - 2.5).abs() < 1e-9, "objective = {objective}");
	}

	#[test]
	fn stop_condition_interrupts() {
		let rows: Vec<Vec<f64>> =
			(0..40).map(|e| (0..20).map(|p| ((e * 7 + p * 3) % 11) as f64).collect()).collect();
		let model = build(&QualificationMatrix::from_scores(&rows).expect("matrix")).expect("model");
		let fixed = vec![None; model.variables()];

		assert_eq!(solve_relaxation(&model, &fixed, &|| true), LpOutcome::Interrupted);
	}
}
