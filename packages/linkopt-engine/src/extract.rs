use linkopt_domain::{Link, QualificationMatrix, SourceElement, TargetElement};

use crate::solver::Solution;

/// Turns the selected pairs of `solution` into links ordered by descending qualification.
///
/// Equal scores keep row-major order, so the output is stable for identical input. Solutions
/// without an assignment yield no links.
pub fn extract(
	solution: &Solution,
	matrix: &QualificationMatrix,
	sources: &[SourceElement],
	targets: &[TargetElement],
) -> Vec<Link> {
	if !solution.status.has_assignment() {
		return Vec::new();
	}

	let mut links: Vec<Link> = solution
		.selected
		.iter()
		.filter_map(|&(e, p)| {
			let cell = matrix.get(e, p)?;

			Some(Link {
				source_id: sources.get(e)?.id.clone(),
				target_id: targets.get(p)?.id.clone(),
				qualification: cell.score,
				info: cell.info.clone(),
			})
		})
		.collect();

	links.sort_by(|lhs, rhs| rhs.qualification.total_cmp(&lhs.qualification));

	links
}
