use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
	Error, Result, heuristic,
	model::Model,
	simplex::{self, LpOutcome},
};

/// Relaxation bounds within this margin of the incumbent are pruned. Applied to the
/// normalized objective, so it is relative to the largest score.
const PRUNE_TOLERANCE: f64 = 1e-9;
/// LP values within this distance of 0 or 1 count as integral.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
	/// Search finished and the incumbent is proven optimal.
	Optimal,
	/// The time bound hit first; the incumbent is the best found, not proven optimal.
	FeasibleBounded,
	/// No assignment satisfies the constraints.
	Infeasible,
	/// The time bound hit before any feasible assignment was found.
	NoSolution,
}
impl SolveStatus {
	pub fn has_assignment(self) -> bool {
		matches!(self, Self::Optimal | Self::FeasibleBounded)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Optimal => "optimal",
			Self::FeasibleBounded => "feasible_bounded",
			Self::Infeasible => "infeasible",
			Self::NoSolution => "no_solution",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
	pub nodes: u64,
	pub pivots: u64,
	pub elapsed_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Solution {
	pub status: SolveStatus,
	/// Selected `(source, target)` pairs in row-major order. Empty unless the status has an
	/// assignment.
	pub selected: Vec<(usize, usize)>,
	pub objective: f64,
	pub stats: SolveStats,
}
impl Solution {
	fn without_assignment(status: SolveStatus, stats: SolveStats) -> Self {
		Self { status, selected: Vec::new(), objective: 0.0, stats }
	}
}

/// Shared flag that aborts a running solve at its next check.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// Maximizes the model objective within `time_limit`.
pub fn solve(model: &Model, time_limit: Duration) -> Solution {
	BranchAndBound::new(model, time_limit, None).run()
}

/// Like [`solve`], but returns [`Error::Cancelled`] and drops the partial result once `cancel`
/// is raised.
pub fn solve_cancellable(
	model: &Model,
	time_limit: Duration,
	cancel: &CancelToken,
) -> Result<Solution> {
	let solution = BranchAndBound::new(model, time_limit, Some(cancel)).run();

	if cancel.is_cancelled() {
		return Err(Error::Cancelled);
	}

	Ok(solution)
}

struct Incumbent {
	assignment: Vec<bool>,
	objective: f64,
}

struct BranchAndBound<'a> {
	/// Reports objectives in the caller's units.
	original: &'a Model,
	/// Normalized copy that every comparison and relaxation runs on.
	model: Model,
	started: Instant,
	deadline: Instant,
	cancel: Option<&'a CancelToken>,
	incumbent: Option<Incumbent>,
	stats: SolveStats,
}
impl<'a> BranchAndBound<'a> {
	fn new(model: &'a Model, time_limit: Duration, cancel: Option<&'a CancelToken>) -> Self {
		let started = Instant::now();
		let deadline =
			started.checked_add(time_limit).unwrap_or(started + Duration::from_secs(86_400));

		Self {
			original: model,
			model: model.normalized(),
			started,
			deadline,
			cancel,
			incumbent: None,
			stats: SolveStats::default(),
		}
	}

	fn should_stop(&self) -> bool {
		self.cancel.map(CancelToken::is_cancelled).unwrap_or(false)
			|| Instant::now() >= self.deadline
	}

	fn offer(&mut self, assignment: Vec<bool>) {
		if !self.model.is_feasible(&assignment) {
			return;
		}

		let objective = self.model.evaluate(&assignment);

		if self.incumbent.as_ref().map(|best| objective > best.objective).unwrap_or(true) {
			self.incumbent = Some(Incumbent { assignment, objective });
		}
	}

	fn run(mut self) -> Solution {
		if !self.model.coverage_possible() {
			return self.finish(true, false);
		}

		if let Some(assignment) = heuristic::greedy_assignment(&self.model) {
			self.offer(assignment);
		}

		let mut stack = vec![vec![None; self.model.variables()]];
		let mut exhausted = true;

		while let Some(fixed) = stack.pop() {
			if self.should_stop() {
				exhausted = false;

				break;
			}

			self.stats.nodes += 1;

			let outcome = simplex::solve_relaxation(&self.model, &fixed, &|| self.should_stop());
			let (values, bound) = match outcome {
				LpOutcome::Infeasible => continue,
				LpOutcome::Interrupted => {
					exhausted = false;

					break;
				},
				LpOutcome::Unbounded => (None, f64::INFINITY),
				LpOutcome::Optimal { values, objective, pivots } => {
					self.stats.pivots += pivots as u64;

					(Some(values), objective)
				},
			};

			if let Some(best) = self.incumbent.as_ref()
				&& bound <= best.objective + PRUNE_TOLERANCE
			{
				continue;
			}

			let branch_on = match values.as_deref() {
				Some(values) => most_fractional(values, &fixed),
				None => fixed.iter().position(Option::is_none),
			};
			let Some(var) = branch_on else {
				if let Some(values) = values {
					self.offer(values.iter().map(|value| *value > 0.5).collect());
				}

				continue;
			};
			let mut down = fixed.clone();
			let mut up = fixed;

			down[var] = Some(false);
			up[var] = Some(true);

			// The `true` branch is popped first.
			stack.push(down);
			stack.push(up);
		}

		let infeasible = exhausted && self.incumbent.is_none();

		self.finish(infeasible, exhausted)
	}

	fn finish(mut self, infeasible: bool, exhausted: bool) -> Solution {
		self.stats.elapsed_ms = self.started.elapsed().as_millis() as u64;

		let status = match (self.incumbent.is_some(), exhausted) {
			_ if infeasible => SolveStatus::Infeasible,
			(true, true) => SolveStatus::Optimal,
			(true, false) => SolveStatus::FeasibleBounded,
			(false, _) => SolveStatus::NoSolution,
		};

		tracing::debug!(
			status = status.as_str(),
			nodes = self.stats.nodes,
			pivots = self.stats.pivots,
			elapsed_ms = self.stats.elapsed_ms,
			"Branch and bound finished."
		);

		let Some(incumbent) = self.incumbent.filter(|_| status.has_assignment()) else {
			return Solution::without_assignment(status, self.stats);
		};
		let selected = incumbent
			.assignment
			.iter()
			.enumerate()
			.filter(|(_, chosen)| **chosen)
			.map(|(var, _)| self.model.pair(var))
			.collect();

		let objective = self.original.evaluate(&incumbent.assignment);

		Solution { status, selected, objective, stats: self.stats }
	}
}

/// Free variable whose LP value is closest to one half, lowest index on ties.
fn most_fractional(values: &[f64], fixed: &[Option<bool>]) -> Option<usize> {
	let mut best: Option<(usize, f64)> = None;

	for (var, value) in values.iter().enumerate() {
		if fixed[var].is_some() {
			continue;
		}

		let distance = value.min(1.0 - value);

		if distance <= INTEGRALITY_TOLERANCE {
			continue;
		}
		if best.map(|(_, current)| distance > current).unwrap_or(true) {
			best = Some((var, distance));
		}
	}

	best.map(|(var, _)| var)
}

#[cfg(test)]
mod tests {
	use linkopt_domain::QualificationMatrix;

	use super::*;
	use crate::model::build;

	fn model(rows: &[Vec<f64>]) -> Model {
		build(&QualificationMatrix::from_scores(rows).expect("matrix")).expect("model")
	}

	#[test]
	fn improves_on_the_greedy_start() {
		let solution = solve(
			&model(&[vec![0.9, 0.8], vec![0.85, 0.1], vec![-1.0, -2.0]]),
			Duration::from_secs(5),
		);

		assert_eq!(solution.status, SolveStatus::Optimal);
		assert_eq!(solution.selected, vec![(0, 1), (1, 0)]);
		assert!((solution.objective - 1.65).abs() < 1e-12);
	}

	#[test]
	fn tiny_scores_are_not_pruned_away() {
		let solution = solve(
			&model(&[vec![6.9e-11, 3.3e-11], vec![-6.2e-11, -1.96e-10]]),
			Duration::from_secs(5),
		);

		assert_eq!(solution.status, SolveStatus::Optimal);
		assert_eq!(solution.selected, vec![(0, 1), (1, 0)]);
		assert!((solution.objective + 2.9e-11).abs() < 1e-22, "objective = {}", solution.objective);
	}

	#[test]
	fn cancelling_from_another_thread_stops_a_running_solve() {
		let rows: Vec<Vec<f64>> = (0..200)
			.map(|e| (0..100).map(|p| ((e * 37 + p * 11) % 101) as f64 / 100.0).collect())
			.collect();
		let model = model(&rows);
		let cancel = CancelToken::new();
		let trigger = cancel.clone();
		let canceller = std::thread::spawn(move || {
			std::thread::sleep(Duration::from_millis(20));
			trigger.cancel();
		});
		let started = Instant::now();
		let result = solve_cancellable(&model, Duration::from_secs(600), &cancel);

		canceller.join().expect("join");

		// A fast machine may finish before the flag is raised; it must never run on.
		assert!(started.elapsed() < Duration::from_secs(30), "took {:?}", started.elapsed());

		match result {
			Err(Error::Cancelled) => {},
			Ok(solution) => assert_eq!(solution.status, SolveStatus::Optimal),
			Err(other) => panic!("Unexpected error: {other}"),
		}
	}

	#[test]
	fn uncoverable_targets_are_infeasible() {
		let solution =
			solve(&model(&[vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]), Duration::from_secs(5));

		assert_eq!(solution.status, SolveStatus::Infeasible);
		assert!(solution.selected.is_empty());
	}

	#[test]
	fn zero_time_bound_keeps_the_greedy_incumbent() {
		let solution = solve(&model(&[vec![0.9, 0.8], vec![0.85, 0.1]]), Duration::ZERO);

		assert_eq!(solution.status, SolveStatus::FeasibleBounded);
		assert_eq!(solution.selected, vec![(0, 0), (1, 1)]);
	}

	#[test]
	fn cancelled_solves_report_an_error() {
		let cancel = CancelToken::new();

		cancel.cancel();

		let result = solve_cancellable(
			&model(&[vec![1.0, 0.0], vec![0.0, 1.0]]),
			Duration::from_secs(5),
			&cancel,
		);

		assert!(matches!(result, Err(Error::Cancelled)));
	}

	#[test]
	fn most_fractional_prefers_half_and_skips_fixed() {
		let values = [0.5, 0.4, 1.0, 0.5];
		let fixed = [Some(true), None, None, None];

		assert_eq!(most_fractional(&values, &fixed), Some(3));
		assert_eq!(most_fractional(&[0.0, 1.0], &[None, None]), None);
	}
}
