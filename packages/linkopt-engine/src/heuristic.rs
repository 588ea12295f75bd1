use std::cmp::Ordering;

use crate::model::Model;

/// Greedy starting assignment used to seed branch and bound.
///
/// Pairs are taken in descending score order while both ends are unused, which covers
/// every target whenever `targets <= sources`. Sources left over afterwards join their best
/// target if that raises the objective.
pub(crate) fn greedy_assignment(model: &Model) -> Option<Vec<bool>> {
	if !model.coverage_possible() {
		return None;
	}

	let objective = model.objective();
	let mut order: Vec<usize> = (0..model.variables()).collect();

	order.sort_by(|lhs, rhs| {
		objective[*rhs].partial_cmp(&objective[*lhs]).unwrap_or(Ordering::Equal)
	});

	let mut assignment = vec![false; model.variables()];
	let mut source_used = vec![false; model.sources()];
	let mut target_covered = vec![false; model.targets()];

	for var in order {
		let (e, p) = model.pair(var);

		if source_used[e] || target_covered[p] {
			continue;
		}

		assignment[var] = true;
		source_used[e] = true;
		target_covered[p] = true;
	}

	for e in 0..model.sources() {
		if source_used[e] {
			continue;
		}

		let best = (0..model.targets())
			.map(|p| (p, objective[model.variable(e, p)]))
			.fold(None, |best: Option<(usize, f64)>, (p, score)| match best {
				Some((_, best_score)) if best_score >= score => best,
				_ => Some((p, score)),
			});

		if let Some((p, score)) = best
			&& score > 0.0
		{
			assignment[model.variable(e, p)] = true;
		}
	}

	model.is_feasible(&assignment).then_some(assignment)
}
