pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Model construction failed: {message}")]
	ModelConstruction { message: String },
	#[error("Solve was cancelled.")]
	Cancelled,
}
