pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String, fields: Vec<String> },
	#[error("Model construction failed: {message}")]
	ModelConstruction { message: String },
}
