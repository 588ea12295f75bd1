use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Matrix rows exactly as the qualification provider sent them.
pub type RawQualifications = Vec<Vec<QualificationCell>>;

/// One cell of a provider response: either a bare score or a score with provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualificationCell {
	Score(f64),
	Detailed {
		qualification: f64,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		info: Option<Value>,
	},
}
impl From<QualificationCell> for Qualification {
	fn from(cell: QualificationCell) -> Self {
		match cell {
			QualificationCell::Score(score) => Self { score, info: None },
			QualificationCell::Detailed { qualification, info } =>
				Self { score: qualification, info },
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Qualification {
	pub score: f64,
	pub info: Option<Value>,
}
impl Qualification {
	pub fn new(score: f64) -> Self {
		Self { score, info: None }
	}
}

/// Dense row-major `sources x targets` table of qualifications.
///
/// The shape is fixed at construction. A matrix with zero rows stands for "no scores
/// available" and is never handed to the optimizer.
#[derive(Clone, Debug, PartialEq)]
pub struct QualificationMatrix {
	sources: usize,
	targets: usize,
	cells: Vec<Qualification>,
}
impl QualificationMatrix {
	pub fn empty() -> Self {
		Self { sources: 0, targets: 0, cells: Vec::new() }
	}

	/// Builds a matrix from rows, rejecting ragged rows and non-finite scores.
	pub fn from_rows(rows: Vec<Vec<Qualification>>) -> Result<Self> {
		let sources = rows.len();
		let targets = rows.first().map(Vec::len).unwrap_or(0);
		let mut cells = Vec::with_capacity(sources * targets);

		for (e, row) in rows.into_iter().enumerate() {
			if row.len() != targets {
				return Err(Error::ModelConstruction {
					message: format!(
						"Qualification row {e} has {} columns, expected {targets}.",
						row.len()
					),
				});
			}

			for (p, cell) in row.into_iter().enumerate() {
				if !cell.score.is_finite() {
					return Err(Error::ModelConstruction {
						message: format!("Qualification at ({e}, {p}) is not a finite number."),
					});
				}

				cells.push(cell);
			}
		}

		Ok(Self { sources, targets, cells })
	}

	pub fn from_raw(raw: RawQualifications) -> Result<Self> {
		Self::from_rows(
			raw.into_iter().map(|row| row.into_iter().map(Qualification::from).collect()).collect(),
		)
	}

	pub fn from_scores(rows: &[Vec<f64>]) -> Result<Self> {
		Self::from_rows(
			rows.iter().map(|row| row.iter().copied().map(Qualification::new).collect()).collect(),
		)
	}

	pub fn sources(&self) -> usize {
		self.sources
	}

	pub fn targets(&self) -> usize {
		self.targets
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}

	pub fn has_shape(&self, sources: usize, targets: usize) -> bool {
		self.sources == sources && self.targets == targets
	}

	pub fn get(&self, source: usize, target: usize) -> Option<&Qualification> {
		if source >= self.sources || target >= self.targets {
			return None;
		}

		self.cells.get(source * self.targets + target)
	}

	pub fn score(&self, source: usize, target: usize) -> Option<f64> {
		self.get(source, target).map(|cell| cell.score)
	}

	pub fn row(&self, source: usize) -> &[Qualification] {
		let start = source * self.targets;

		self.cells.get(start..start + self.targets).unwrap_or(&[])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_mixed_cells() {
		let raw: RawQualifications = serde_json::from_value(serde_json::json!([
			[-4, { "qualification": 0.7, "info": { "model": "v2" } }],
			[0.2, { "qualification": -4.0 }]
		]))
		.expect("parse failed");
		let matrix = QualificationMatrix::from_raw(raw).expect("build failed");

		assert_eq!(matrix.sources(), 2);
		assert_eq!(matrix.targets(), 2);
		assert_eq!(matrix.score(0, 0), Some(-4.0));
		assert_eq!(
			matrix.get(0, 1).and_then(|cell| cell.info.clone()),
			Some(serde_json::json!({ "model": "v2" }))
		);
		assert_eq!(matrix.score(1, 1), Some(-4.0));
	}

	#[test]
	fn rejects_ragged_rows() {
		let err = QualificationMatrix::from_scores(&[vec![1.0, 2.0], vec![3.0]])
			.expect_err("ragged matrix must be rejected");

		assert!(err.to_string().contains("row 1 has 1 columns, expected 2"), "{err}");
	}

	#[test]
	fn rejects_non_finite_scores() {
		let err = QualificationMatrix::from_scores(&[vec![1.0, f64::NAN]])
			.expect_err("NaN must be rejected");

		assert!(matches!(err, Error::ModelConstruction { .. }));
	}

	#[test]
	fn zero_width_rows_keep_their_row_count() {
		let matrix = QualificationMatrix::from_scores(&[vec![], vec![]]).expect("build failed");

		assert!(matrix.is_empty());
		assert!(matrix.has_shape(2, 0));
	}

	#[test]
	fn out_of_range_lookups_are_none() {
		let matrix = QualificationMatrix::from_scores(&[vec![1.0, 2.0]]).expect("build failed");

		assert_eq!(matrix.score(0, 2), None);
		assert_eq!(matrix.score(1, 0), None);
		assert_eq!(matrix.row(0).len(), 2);
	}
}
