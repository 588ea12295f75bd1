use std::time::Duration;

use serde_json::Value;

use linkopt_domain::{LinksResponse, QualificationMatrix, SuggestLinksRequest};
use linkopt_engine::{CancelToken, Solution};

use crate::{Error, LinkService, Result};

/// Raises the solver's cancellation flag when the request future goes away.
struct CancelOnDrop(CancelToken);
impl Drop for CancelOnDrop {
	fn drop(&mut self) {
		self.0.cancel();
	}
}

impl LinkService {
	/// Validates `payload`, fetches its qualification matrix and returns the optimal links.
	///
	/// Provider failures and matrices whose outer shape does not match the request yield an
	/// empty response. Ragged matrices are internal errors.
	pub async fn suggest_links(
		&self,
		payload: Value,
		user_id: Option<&str>,
	) -> Result<LinksResponse> {
		let request = SuggestLinksRequest::from_value(payload)?;
		let sources = request.sources.len();
		let targets = request.targets.len();
		let raw = match self.providers.qualification.qualifications(user_id, &request).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(
					error = %err,
					sources,
					targets,
					"Qualification fetch failed. Returning no links."
				);

				return Ok(LinksResponse::empty());
			},
		};

		if raw.len() != sources {
			tracing::warn!(
				rows = raw.len(),
				sources,
				"Qualification matrix row count does not match sources. Returning no links."
			);

			return Ok(LinksResponse::empty());
		}

		let matrix = QualificationMatrix::from_raw(raw)?;

		if !matrix.has_shape(sources, targets) {
			tracing::warn!(
				columns = matrix.targets(),
				targets,
				"Qualification matrix column count does not match targets. Returning no links."
			);

			return Ok(LinksResponse::empty());
		}

		let solution = self.solve(&matrix).await?;
		let links = linkopt_engine::extract(&solution, &matrix, &request.sources, &request.targets);

		tracing::info!(
			sources,
			targets,
			status = solution.status.as_str(),
			objective = solution.objective,
			nodes = solution.stats.nodes,
			elapsed_ms = solution.stats.elapsed_ms,
			links = links.len(),
			"Suggested links."
		);

		Ok(LinksResponse { links })
	}

	async fn solve(&self, matrix: &QualificationMatrix) -> Result<Solution> {
		let model = linkopt_engine::build(matrix)?;
		let permit = self.solve_slots.clone().acquire_owned().await.map_err(|_| Error::Internal {
			message: "Solver slots are closed.".to_string(),
		})?;
		let time_limit = Duration::from_millis(self.cfg.solver.time_limit_ms);
		let cancel = CancelToken::new();
		let _cancel_on_drop = CancelOnDrop(cancel.clone());
		let task = tokio::task::spawn_blocking(move || {
			let _permit = permit;
			let result = linkopt_engine::solve_cancellable(&model, time_limit, &cancel);

			if let Err(linkopt_engine::Error::Cancelled) = &result {
				tracing::debug!("Solve cancelled because the request went away.");
			}

			result
		});
		let solution = task.await.map_err(|err| Error::Internal {
			message: format!("Solver task failed: {err}."),
		})??;

		Ok(solution)
	}
}
